use aidoku_host::{ HostConfig, SourceRegistry, Val, INVALID_DESCRIPTOR };

fixtures! {
	sources = [ "readers" ];
}

fn call( registry: &mut SourceRegistry, export: &str, args: &[Val] ) -> Val {
	registry.source_mut( "readers" ).expect( "source loaded" )
		.call( export, args )
		.unwrap_or_else(| err | panic!( "Call to {} failed: {}", export, err ))
		.into_iter().next()
		.unwrap_or( Val::I32( 0 ))
}

fn descriptor( registry: &mut SourceRegistry, export: &str, args: &[Val] ) -> i32 {
	call( registry, export, args ).i32().unwrap_or_default()
}

fn string( registry: &mut SourceRegistry, ptr: i32, len: i32 ) -> i32 {
	descriptor( registry, "string", &[ Val::I32( ptr ), Val::I32( len )])
}

fn read_int( registry: &mut SourceRegistry, value: i32 ) -> i64 {
	call( registry, "read_int", &[ Val::I32( value )]).i64().unwrap_or_default()
}

fn read_float( registry: &mut SourceRegistry, export: &str, value: i32 ) -> f64 {
	call( registry, export, &[ Val::I32( value )]).f64().unwrap_or_default()
}

#[test]
fn read_int_converts_numbers_bools_and_string_prefixes() {

	let mut registry = fixtures::registry( HostConfig::new() );
	let int = descriptor( &mut registry, "int", &[ Val::I64( 12 )]);
	let float = descriptor( &mut registry, "float", &[ Val::F64(( -2.5_f64 ).to_bits() )]);
	let bool = descriptor( &mut registry, "bool", &[ Val::I32( 1 )]);
	let prefixed = string( &mut registry, 16, 5 );
	let letters = string( &mut registry, 48, 3 );

	assert_eq!( read_int( &mut registry, int ), 12 );
	assert_eq!( read_int( &mut registry, float ), -3 );
	assert_eq!( read_int( &mut registry, bool ), 1 );
	assert_eq!( read_int( &mut registry, prefixed ), 42 );
	assert_eq!( read_int( &mut registry, letters ), -1 );
	assert_eq!( read_int( &mut registry, INVALID_DESCRIPTOR ), -1 );

}

#[test]
fn read_float_parses_strings() {

	let mut registry = fixtures::registry( HostConfig::new() );
	let int = descriptor( &mut registry, "int", &[ Val::I64( 4 )]);
	let decimal = string( &mut registry, 32, 4 );
	let letters = string( &mut registry, 48, 3 );

	assert_eq!( read_float( &mut registry, "read_float", int ), 4.0 );
	assert_eq!( read_float( &mut registry, "read_float", decimal ), 3.75 );
	assert_eq!( read_float( &mut registry, "read_float", letters ), -1.0 );
	assert_eq!( read_float( &mut registry, "read_float", 1_000 ), -1.0 );

}

#[test]
fn read_bool_is_false_for_unknown_kinds() {

	let mut registry = fixtures::registry( HostConfig::new() );
	let yes = descriptor( &mut registry, "bool", &[ Val::I32( 1 )]);
	let zero = descriptor( &mut registry, "int", &[ Val::I64( 0 )]);
	let text = string( &mut registry, 48, 3 );

	let read = | registry: &mut SourceRegistry, value | call( registry, "read_bool", &[ Val::I32( value )]).i32();
	assert_eq!( read( &mut registry, yes ), Some( 1 ));
	assert_eq!( read( &mut registry, zero ), Some( 0 ));
	assert_eq!( read( &mut registry, text ), Some( 0 ));
	assert_eq!( read( &mut registry, INVALID_DESCRIPTOR ), Some( 0 ));

}

#[test]
fn read_date_accepts_dates_and_numbers() {

	let mut registry = fixtures::registry( HostConfig::new() );
	let date = descriptor( &mut registry, "date", &[ Val::F64( 86_400_000_f64.to_bits() )]);
	let int = descriptor( &mut registry, "int", &[ Val::I64( 1_000 )]);
	let text = string( &mut registry, 48, 3 );

	assert_eq!( read_float( &mut registry, "read_date", date ), 86_400_000.0 );
	assert_eq!( read_float( &mut registry, "read_date", int ), 1_000.0 );
	assert_eq!( read_float( &mut registry, "read_date", text ), -1.0 );

}

#[test]
fn read_date_string_applies_pattern_and_zone() {

	let mut registry = fixtures::registry( HostConfig::new() );
	let stamp = string( &mut registry, 64, 19 );
	let garbage = string( &mut registry, 48, 3 );

	// 2023-04-05T06:07:08Z
	let utc = 1_680_674_828_000.0 ;
	assert_eq!( read_float( &mut registry, "read_date_utc", stamp ), utc );
	assert_eq!( read_float( &mut registry, "read_date_tokyo", stamp ), utc - 9.0 * 3_600_000.0 );
	assert_eq!( read_float( &mut registry, "read_date_utc", garbage ), -1.0 );

}
