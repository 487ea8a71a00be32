use aidoku_host::{ HostConfig, SettingValue, SourceRegistry, Val, Value };

fixtures! {
	sources = [ "settings", "other" ];
}

fn call( registry: &mut SourceRegistry, source: &str, export: &str, args: &[Val] ) -> i32 {
	registry.source_mut( source ).expect( "source loaded" )
		.call( export, args )
		.unwrap_or_else(| err | panic!( "Call to {} failed: {}", export, err ))
		.first().and_then( Val::i32 ).unwrap_or_default()
}

/// Builds a value with `constructor`, stores it under `quality` and returns what is stored.
fn store( registry: &mut SourceRegistry, constructor: &str, args: &[Val] ) -> Option<SettingValue> {
	let value = call( registry, "settings", constructor, args );
	call( registry, "settings", "set", &[ Val::I32( value )]);
	registry.setting( "settings", "quality" )
}

#[test]
fn scalars_are_stored_by_kind() {
	let mut registry = fixtures::registry( HostConfig::new() );
	assert_eq!( store( &mut registry, "int", &[ Val::I64( 7 )]), Some( SettingValue::Int( 7 )));
	assert_eq!( store( &mut registry, "bool", &[ Val::I32( 1 )]), Some( SettingValue::Bool( true )));
	assert_eq!( store( &mut registry, "float", &[ Val::F64( 2.5f64.to_bits() )]), Some( SettingValue::Float( 2.5 )));
	assert_eq!( store( &mut registry, "string", &[]), Some( SettingValue::String( "a".to_string() )));
}

#[test]
fn integral_floats_are_stored_as_ints() {
	let mut registry = fixtures::registry( HostConfig::new() );
	assert_eq!( store( &mut registry, "float", &[ Val::F64( 3.0f64.to_bits() )]), Some( SettingValue::Int( 3 )));
}

#[test]
fn arrays_are_stored_as_string_arrays() {
	let mut registry = fixtures::registry( HostConfig::new() );
	assert_eq!(
		store( &mut registry, "strings", &[]),
		Some( SettingValue::StringArray( vec![ "a".to_string(), "b".to_string() ])),
	);

	let stored = call( &mut registry, "settings", "get", &[]);
	assert_eq!( registry.heap().to_json( stored ), serde_json::json!([ "a", "b" ]));
	assert_eq!( registry.heap().references( stored ).len(), 2 );
}

#[test]
fn unstorable_kinds_leave_the_setting_untouched() {
	let mut registry = fixtures::registry( HostConfig::new() );
	store( &mut registry, "int", &[ Val::I64( 1 )]);
	assert_eq!( store( &mut registry, "null", &[]), Some( SettingValue::Int( 1 )));
	assert_eq!( store( &mut registry, "object", &[]), Some( SettingValue::Int( 1 )));

	// Unknown descriptors are ignored as well.
	call( &mut registry, "settings", "set", &[ Val::I32( 999 )]);
	assert_eq!( registry.setting( "settings", "quality" ), Some( SettingValue::Int( 1 )));
}

#[test]
fn reads_are_scoped_to_the_calling_source() {

	let mut registry = fixtures::registry( HostConfig::new() );
	store( &mut registry, "int", &[ Val::I64( 5 )]);

	assert_eq!( call( &mut registry, "other", "get", &[]), -1 );
	let own = call( &mut registry, "settings", "get", &[]);
	assert_eq!( registry.heap().get( own ), Some( &Value::Int( 5 )));

}

#[test]
fn host_written_settings_are_visible_to_the_source() {

	let mut registry = fixtures::registry( HostConfig::new() );
	registry.set_setting( "other", "quality", SettingValue::String( "high".to_string() ))
		.expect( "Failed to write setting" );

	let read = call( &mut registry, "other", "get", &[]);
	assert_eq!( registry.heap().get( read ), Some( &Value::String( "high".to_string() )));
	assert_eq!( call( &mut registry, "other", "get_unnamed", &[]), -1 );

}
