use aidoku_host::{ FileSettings, MemorySettings, SettingValue, SettingsStore };

#[test]
fn memory_settings_are_scoped_by_source() {
	let mut store = MemorySettings::new();
	store.set( "en.one", "quality", SettingValue::Int( 1 )).expect( "memory writes cannot fail" );
	store.set( "en.two", "quality", SettingValue::Int( 2 )).expect( "memory writes cannot fail" );

	assert_eq!( store.get( "en.one", "quality" ), Some( SettingValue::Int( 1 )));
	assert_eq!( store.get( "en.two", "quality" ), Some( SettingValue::Int( 2 )));
	assert_eq!( store.get( "en.three", "quality" ), None );
}

#[test]
fn later_writes_replace_earlier_ones() {
	let mut store = MemorySettings::new();
	store.set( "en.one", "mode", SettingValue::Int( 1 )).expect( "memory writes cannot fail" );
	store.set( "en.one", "mode", SettingValue::String( "fast".to_string() )).expect( "memory writes cannot fail" );
	assert_eq!( store.get( "en.one", "mode" ), Some( SettingValue::String( "fast".to_string() )));
}

#[test]
fn file_settings_survive_reopening() {

	let directory = tempfile::tempdir().expect( "Failed to create temp dir" );
	let path = directory.path().join( "settings.json" );

	{
		let mut store = FileSettings::open( &path ).expect( "missing file opens empty" );
		assert_eq!( store.get( "en.one", "tags" ), None );
		store.set( "en.one", "tags", SettingValue::StringArray( vec![ "a".to_string(), "b".to_string() ]))
			.expect( "Failed to write settings" );
	}

	let store = FileSettings::open( &path ).expect( "Failed to reopen settings" );
	assert_eq!( store.path(), path.as_path() );
	assert_eq!( store.get( "en.one", "tags" ), Some( SettingValue::StringArray( vec![ "a".to_string(), "b".to_string() ])));

}

#[test]
fn corrupt_settings_file_fails_to_open() {
	let directory = tempfile::tempdir().expect( "Failed to create temp dir" );
	let path = directory.path().join( "settings.json" );
	std::fs::write( &path, "not json" ).expect( "Failed to write file" );
	match FileSettings::open( &path ) {
		Err( _ ) => {}
		other => panic!( "Expected a parse failure, found: {:#?}", other ),
	}
}
