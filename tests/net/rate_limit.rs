use std::time::Duration ;
use aidoku_host::{ HttpResponse, SourceRegistry, Val, STATUS_TOO_MANY_REQUESTS };
use crate::mock_transport::{ MockTransport, config };

fixtures! {
	sources = [ "first", "second" ];
}

const GET: i32 = 0 ;

fn call( registry: &mut SourceRegistry, source: &str, export: &str, args: &[i32] ) -> i32 {
	let args = args.iter().copied().map( Val::I32 ).collect::<Vec<_>>();
	registry.source_mut( source ).expect( "source loaded" )
		.call( export, &args )
		.unwrap_or_else(| err | panic!( "Call to {} failed: {}", export, err ))
		.first().and_then( Val::i32 ).unwrap_or_default()
}

#[test]
fn second_send_inside_the_window_is_rejected_without_io() {

	let transport = MockTransport::responding( HttpResponse::new( 200, "ok" ));
	let mut registry = fixtures::registry( config( &transport ));
	call( &mut registry, "first", "set_rate_limit", &[ 1 ]);
	call( &mut registry, "first", "set_rate_limit_period", &[ 60_000 ]);

	let allowed = call( &mut registry, "first", "fetch", &[ GET ]);
	assert_eq!( call( &mut registry, "first", "status", &[ allowed ]), 200 );

	let rejected = call( &mut registry, "first", "fetch", &[ GET ]);
	assert_eq!( call( &mut registry, "first", "status", &[ rejected ]), i32::from( STATUS_TOO_MANY_REQUESTS ));
	assert_eq!( call( &mut registry, "first", "data_size", &[ rejected ]), -1 );
	assert_eq!( transport.calls(), 1 );

}

#[test]
fn limit_of_n_permits_exactly_n_sends() {

	let transport = MockTransport::responding( HttpResponse::new( 200, "ok" ));
	let mut registry = fixtures::registry( config( &transport ));
	call( &mut registry, "first", "set_rate_limit", &[ 3 ]);
	call( &mut registry, "first", "set_rate_limit_period", &[ 60_000 ]);

	let ids = ( 0..4 )
		.map(|_| call( &mut registry, "first", "fetch", &[ GET ]))
		.collect::<Vec<_>>();
	let statuses = ids.into_iter()
		.map(| id | call( &mut registry, "first", "status", &[ id ]))
		.collect::<Vec<_>>();

	assert_eq!( statuses, vec![ 200, 200, 200, 429 ]);
	assert_eq!( transport.calls(), 3 );

}

#[test]
fn window_resets_after_the_period() {

	let transport = MockTransport::responding( HttpResponse::new( 200, "ok" ));
	let mut registry = fixtures::registry( config( &transport ));
	call( &mut registry, "first", "set_rate_limit", &[ 1 ]);
	call( &mut registry, "first", "set_rate_limit_period", &[ 50 ]);

	let first = call( &mut registry, "first", "fetch", &[ GET ]);
	let second = call( &mut registry, "first", "fetch", &[ GET ]);
	std::thread::sleep( Duration::from_millis( 80 ));
	let third = call( &mut registry, "first", "fetch", &[ GET ]);

	assert_eq!( call( &mut registry, "first", "status", &[ first ]), 200 );
	assert_eq!( call( &mut registry, "first", "status", &[ second ]), 429 );
	assert_eq!( call( &mut registry, "first", "status", &[ third ]), 200 );
	assert_eq!( registry.source( "first" ).expect( "source loaded" ).context().rate_limiter().passed(), 1 );

}

#[test]
fn limiters_are_scoped_per_source() {

	let transport = MockTransport::responding( HttpResponse::new( 200, "ok" ));
	let mut registry = fixtures::registry( config( &transport ));
	call( &mut registry, "first", "set_rate_limit", &[ 1 ]);

	call( &mut registry, "first", "fetch", &[ GET ]);
	let limited = call( &mut registry, "first", "fetch", &[ GET ]);
	let other = call( &mut registry, "second", "fetch", &[ GET ]);

	assert_eq!( call( &mut registry, "first", "status", &[ limited ]), 429 );
	assert_eq!( call( &mut registry, "second", "status", &[ other ]), 200 );
	assert_eq!( registry.source( "second" ).expect( "source loaded" ).context().rate_limiter().limit(), -1 );

}

#[test]
fn non_positive_limit_disables_throttling() {

	let transport = MockTransport::responding( HttpResponse::new( 204, "" ));
	let mut registry = fixtures::registry( config( &transport ));
	call( &mut registry, "first", "set_rate_limit", &[ 0 ]);

	for _ in 0..5 {
		let id = call( &mut registry, "first", "fetch", &[ GET ]);
		assert_eq!( call( &mut registry, "first", "status", &[ id ]), 204 );
	}
	assert_eq!( transport.calls(), 5 );

}
