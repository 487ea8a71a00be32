use std::time::{ Duration, Instant };



/// Fixed-window request throttle owned by one source.
///
/// A window opens with the first permitted send and stays open for `period`.
/// While it is open at most `limit` sends are permitted; the next send after the
/// window has elapsed opens a new window counting from one. A `limit` of zero or
/// less disables throttling.
#[derive( Debug, Clone )]
pub struct RateLimiter {
	limit: i32,
	period: Duration,
	window_start: Option<Instant>,
	passed: i32,
}

impl Default for RateLimiter {
	fn default() -> Self {
		Self {
			limit: -1,
			period: Self::DEFAULT_PERIOD,
			window_start: None,
			passed: 0,
		}
	}
}

impl RateLimiter {

	pub const DEFAULT_PERIOD: Duration = Duration::from_secs( 60 );

	pub fn new( limit: i32, period: Duration ) -> Self {
		Self { limit, period, ..Self::default() }
	}

	pub fn limit( &self ) -> i32 { self.limit }

	pub fn period( &self ) -> Duration { self.period }

	pub fn set_limit( &mut self, limit: i32 ) { self.limit = limit }

	/// Negative periods are treated as zero.
	pub fn set_period_millis( &mut self, millis: i32 ) {
		self.period = Duration::from_millis( u64::try_from( millis ).unwrap_or( 0 ));
	}

	/// Whether a send at `now` is allowed. Does not count the send.
	pub fn check_at( &self, now: Instant ) -> bool {
		if self.limit <= 0 { return true }
		match self.window_start {
			Some( start ) if now.saturating_duration_since( start ) < self.period => self.passed < self.limit,
			_ => true,
		}
	}

	/// Counts a permitted send made at `now`.
	pub fn record_at( &mut self, now: Instant ) {
		match self.window_start {
			Some( start ) if now.saturating_duration_since( start ) < self.period => self.passed += 1,
			_ => {
				self.window_start = Some( now );
				self.passed = 1 ;
			},
		}
	}

	/// Sends counted in the current window.
	pub fn passed( &self ) -> i32 { self.passed }

}
