use aidoku_host::{ HostConfig, SettingValue, SourceRegistry };

fn registry() -> SourceRegistry {
	SourceRegistry::new( HostConfig::new() ).expect( "Failed to create registry" )
}

#[test]
fn defaults_are_seeded_by_item_type() {

	let mut registry = registry();
	registry.seed_settings( "en.example", &serde_json::json!([
		{ "type": "switch", "key": "nsfw", "default": true },
		{ "type": "stepper", "key": "columns", "default": 3 },
		{ "type": "select", "key": "quality", "default": "high" },
		{ "type": "multi-select", "key": "languages", "default": [ "en", "fr" ]},
		{ "type": "text", "key": "domain" },
	])).expect( "Failed to seed settings" );

	assert_eq!( registry.setting( "en.example", "nsfw" ), Some( SettingValue::Bool( true )));
	assert_eq!( registry.setting( "en.example", "columns" ), Some( SettingValue::Float( 3.0 )));
	assert_eq!( registry.setting( "en.example", "quality" ), Some( SettingValue::String( "high".to_string() )));
	assert_eq!(
		registry.setting( "en.example", "languages" ),
		Some( SettingValue::StringArray( vec![ "en".to_string(), "fr".to_string() ])),
	);
	assert_eq!( registry.setting( "en.example", "domain" ), Some( SettingValue::String( String::new() )));

}

#[test]
fn groups_are_flattened() {

	let mut registry = registry();
	registry.seed_settings( "en.example", &serde_json::json!([
		{ "type": "group", "title": "Reading", "items": [
			{ "type": "switch", "key": "webtoon" },
			{ "type": "group", "items": [{ "type": "segment", "key": "direction", "default": "rtl" }]},
		]},
	])).expect( "Failed to seed settings" );

	assert_eq!( registry.setting( "en.example", "webtoon" ), Some( SettingValue::Bool( false )));
	assert_eq!( registry.setting( "en.example", "direction" ), Some( SettingValue::String( "rtl".to_string() )));

}

#[test]
fn items_without_a_key_or_known_type_are_skipped() {

	let mut registry = registry();
	registry.seed_settings( "en.example", &serde_json::json!([
		{ "type": "button", "key": "login" },
		{ "type": "switch" },
		{ "key": "orphan", "default": 1 },
	])).expect( "Failed to seed settings" );

	assert_eq!( registry.setting( "en.example", "login" ), None );
	assert_eq!( registry.setting( "en.example", "orphan" ), None );

}
