use std::time::{ Duration, Instant };
use aidoku_host::RateLimiter ;

#[test]
fn fixed_window_counts_from_the_first_send() {

	let start = Instant::now();
	let mut limiter = RateLimiter::new( 2, Duration::from_millis( 100 ));

	assert!( limiter.check_at( start ));
	limiter.record_at( start );
	assert!( limiter.check_at( start + Duration::from_millis( 10 )));
	limiter.record_at( start + Duration::from_millis( 10 ));
	assert!( !limiter.check_at( start + Duration::from_millis( 99 )));

	// The window opened at `start`, not at the last send.
	assert!( limiter.check_at( start + Duration::from_millis( 100 )));
	limiter.record_at( start + Duration::from_millis( 100 ));
	assert_eq!( limiter.passed(), 1 );

}

#[test]
fn negative_period_is_zero() {
	let mut limiter = RateLimiter::default();
	limiter.set_period_millis( -5 );
	assert_eq!( limiter.period(), Duration::ZERO );
	assert_eq!( limiter.limit(), -1 );
	assert_eq!( RateLimiter::default().period(), RateLimiter::DEFAULT_PERIOD );
}
