use aidoku_host::{ HostConfig, InvokeError, ObjectType, SourceRegistry, Val, Value, INVALID_DESCRIPTOR };

fixtures! {
	sources = [ "values" ];
}

fn call( registry: &mut SourceRegistry, export: &str, args: &[Val] ) -> i32 {
	let results = registry.source_mut( "values" ).expect( "source loaded" )
		.call( export, args )
		.unwrap_or_else(| err | panic!( "Call to {} failed: {}", export, err ));
	results.first().and_then( Val::i32 ).unwrap_or_default()
}

fn type_code( kind: ObjectType ) -> i32 { kind.into() }

#[test]
fn every_constructor_round_trips() {

	let mut registry = fixtures::registry( HostConfig::new() );

	let null = call( &mut registry, "null", &[] );
	let int = call( &mut registry, "int", &[ Val::I64( -42 )]);
	let float = call( &mut registry, "float", &[ Val::F64( 2.5_f64.to_bits() )]);
	let string = call( &mut registry, "string", &[ Val::I32( 16 ), Val::I32( 5 )]);
	let bool = call( &mut registry, "bool", &[ Val::I32( 1 )]);
	let array = call( &mut registry, "array", &[] );
	let object = call( &mut registry, "object", &[] );
	let date = call( &mut registry, "date", &[ Val::F64( 1_600_000_000_000_f64.to_bits() )]);

	let heap = registry.heap();
	assert_eq!( heap.get( null ), Some( &Value::Null ));
	assert_eq!( heap.get( int ), Some( &Value::Int( -42 )));
	assert_eq!( heap.get( float ), Some( &Value::Float( 2.5 )));
	assert_eq!( heap.get( string ), Some( &Value::String( "hello".into() )));
	assert_eq!( heap.get( bool ), Some( &Value::Bool( true )));
	assert_eq!( heap.get( array ), Some( &Value::Array( Vec::new() )));
	assert_eq!( heap.get( object ), Some( &Value::Object( Default::default() )));
	assert_eq!( heap.get( date ), Some( &Value::Date( 1_600_000_000_000 )));

}

#[test]
fn typeof_matches_constructor() {

	let mut registry = fixtures::registry( HostConfig::new() );

	let cases = [
		( "int", vec![ Val::I64( 7 )], ObjectType::Int ),
		( "float", vec![ Val::F64( 0.25_f64.to_bits() )], ObjectType::Float ),
		( "float", vec![ Val::F64( 3.0_f64.to_bits() )], ObjectType::Int ),
		( "string", vec![ Val::I32( 16 ), Val::I32( 12 )], ObjectType::String ),
		( "bool", vec![ Val::I32( 0 )], ObjectType::Bool ),
		( "array", vec![], ObjectType::Array ),
		( "object", vec![], ObjectType::Object ),
		( "date", vec![ Val::F64( 0.0_f64.to_bits() )], ObjectType::Date ),
		( "null", vec![], ObjectType::Null ),
	];

	for ( export, args, expected ) in cases {
		let descriptor = call( &mut registry, export, &args );
		assert_eq!( call( &mut registry, "typeof", &[ Val::I32( descriptor )]), type_code( expected ), "for {}", export );
	}

	assert_eq!( call( &mut registry, "typeof", &[ Val::I32( INVALID_DESCRIPTOR )]), type_code( ObjectType::Null ));

}

#[test]
fn empty_string_is_absent() {
	let mut registry = fixtures::registry( HostConfig::new() );
	assert_eq!( call( &mut registry, "string", &[ Val::I32( 16 ), Val::I32( 0 )]), INVALID_DESCRIPTOR );
	assert_eq!( registry.live_descriptors(), 0 );
}

#[test]
fn negative_date_means_now() {

	let mut registry = fixtures::registry( HostConfig::new() );
	let before = chrono::Utc::now().timestamp_millis();
	let date = call( &mut registry, "date", &[ Val::F64(( -1.0_f64 ).to_bits() )]);
	let after = chrono::Utc::now().timestamp_millis();

	match registry.heap().get( date ) {
		Some( Value::Date( millis )) => assert!(( before..=after ).contains( millis )),
		other => panic!( "Expected date, found: {:#?}", other ),
	};

}

#[test]
fn strings_are_read_back_into_guest_memory() {

	let mut registry = fixtures::registry( HostConfig::new() );
	let string = call( &mut registry, "string", &[ Val::I32( 16 ), Val::I32( 12 )]);

	assert_eq!( call( &mut registry, "string_len", &[ Val::I32( string )]), 12 );
	let echoed = call( &mut registry, "echo", &[ Val::I32( string ), Val::I32( 5 )]);
	assert_eq!( registry.heap().get( echoed ), Some( &Value::String( "hello".into() )));

	let int = call( &mut registry, "int", &[ Val::I64( 1 )]);
	assert_eq!( call( &mut registry, "string_len", &[ Val::I32( int )]), -1 );

}

#[test]
fn out_of_bounds_write_traps_only_the_call() {

	let mut registry = fixtures::registry( HostConfig::new() );
	let string = call( &mut registry, "string", &[ Val::I32( 16 ), Val::I32( 12 )]);

	match registry.source_mut( "values" ).expect( "source loaded" ).call( "read_out_of_bounds", &[ Val::I32( string )]) {
		Err( InvokeError::RuntimeException( _ )) => {}
		other => panic!( "Expected RuntimeException, found: {:#?}", other ),
	}

	// The source keeps working after the trap.
	let int = call( &mut registry, "int", &[ Val::I64( 9 )]);
	assert_eq!( registry.heap().get( int ), Some( &Value::Int( 9 )));

}

#[test]
fn oversized_string_length_traps_only_the_call() {

	let mut registry = fixtures::registry( HostConfig::new() );
	let before = registry.live_descriptors();

	for ( ptr, len ) in [( 0, i32::MAX ), ( i32::MAX, 16 ), ( -1, 2 )] {
		match registry.source_mut( "values" ).expect( "source loaded" ).call( "string", &[ Val::I32( ptr ), Val::I32( len )]) {
			Err( InvokeError::RuntimeException( _ )) => {}
			other => panic!( "Expected RuntimeException for {} bytes at {:#x}, found: {:#?}", len, ptr, other ),
		}
	}
	assert_eq!( registry.live_descriptors(), before );

	let string = call( &mut registry, "string", &[ Val::I32( 16 ), Val::I32( 5 )]);
	assert_eq!( registry.heap().get( string ), Some( &Value::String( "hello".into() )));

}

#[test]
fn copy_is_shallow_and_destroy_cascades() {

	let mut registry = fixtures::registry( HostConfig::new() );
	let original = call( &mut registry, "string", &[ Val::I32( 16 ), Val::I32( 5 )]);
	let copied = call( &mut registry, "copy", &[ Val::I32( original )]);

	assert_ne!( original, copied );
	assert_eq!( registry.heap().get( copied ), Some( &Value::String( "hello".into() )));

	call( &mut registry, "destroy", &[ Val::I32( original )]);
	call( &mut registry, "destroy", &[ Val::I32( original )]);
	call( &mut registry, "destroy", &[ Val::I32( INVALID_DESCRIPTOR )]);

	assert!( registry.heap().get( original ).is_none() );
	assert!( registry.heap().get( copied ).is_some() );
	assert_eq!( call( &mut registry, "copy", &[ Val::I32( original )]), INVALID_DESCRIPTOR );

}
