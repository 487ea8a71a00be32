use aidoku_host::{ HostConfig, HostError, InvokeError, LoadError, SettingsBackend, SourceHost };

fixtures! {
	sources = [ "catalog" ];
}

async fn host() -> SourceHost {
	let host = SourceHost::new( HostConfig::new() ).expect( "Failed to start host" );
	host.load_file( "catalog", fixtures::path( "catalog" )).await
		.unwrap_or_else(| err | panic!( "Source catalog failed to load: {}", err ));
	host
}

#[tokio::test]
async fn entry_points_run_on_the_worker() {

	let host = host().await;

	match host.get_manga_list( "catalog", Vec::new(), 1 ).await {
		Ok( page ) => assert_eq!( page.manga.len(), 2 ),
		other => panic!( "Expected Ok( page ), found: {:#?}", other ),
	}
	match host.get_manga_details( "catalog", "solo" ).await {
		Ok( manga ) => assert_eq!( manga.id, "solo" ),
		other => panic!( "Expected Ok( manga ), found: {:#?}", other ),
	}
	match host.get_page_list( "catalog", "solo", "c9" ).await {
		Ok( pages ) => assert_eq!( pages.len(), 2 ),
		other => panic!( "Expected Ok( pages ), found: {:#?}", other ),
	}
	match host.live_descriptors().await {
		Ok( 0 ) => {}
		other => panic!( "Expected Ok( 0 ), found: {:#?}", other ),
	}

}

#[tokio::test]
async fn concurrent_calls_do_not_interleave() {

	let host = host().await;
	let ( first, second, third ) = tokio::join!(
		host.get_chapter_list( "catalog", "a" ),
		host.get_chapter_list( "catalog", "b" ),
		host.get_chapter_list( "catalog", "c" ),
	);

	for ( manga_id, chapters ) in [( "a", first ), ( "b", second ), ( "c", third )] {
		let chapters = chapters.unwrap_or_else(| err | panic!( "Chapter list for {} failed: {}", manga_id, err ));
		assert_eq!( chapters.iter().map(| chapter | chapter.source_order ).collect::<Vec<_>>(), vec![ 0, 1, 2 ]);
		assert!( chapters.iter().all(| chapter | chapter.manga_id == manga_id ));
	}

}

#[tokio::test]
async fn errors_cross_the_worker_boundary() {

	let host = host().await;

	match host.get_manga_details( "nowhere", "solo" ).await {
		Err( HostError::Invoke( InvokeError::UnknownSource( _ ))) => {}
		other => panic!( "Expected Err( UnknownSource ), found: {:#?}", other ),
	}
	match host.load( "garbage", b"not a module".to_vec() ).await {
		Err( HostError::Load( LoadError::Compilation( _ ))) => {}
		other => panic!( "Expected Err( Compilation ), found: {:#?}", other ),
	}
	match host.load_file( "catalog", fixtures::path( "catalog" )).await {
		Err( HostError::Load( LoadError::DuplicateSource( _ ))) => {}
		other => panic!( "Expected Err( DuplicateSource ), found: {:#?}", other ),
	}

}

#[tokio::test]
async fn custom_jobs_see_the_registry() {
	let host = host().await;
	match host.run(| registry | registry.source_ids().map( str::to_string ).collect::<Vec<_>>() ).await {
		Ok( ids ) => assert_eq!( ids, vec![ "catalog" ]),
		other => panic!( "Expected Ok( ids ), found: {:#?}", other ),
	}
}

#[test]
fn registry_failures_surface_from_new() {

	let directory = tempfile::tempdir().expect( "Failed to create temp dir" );
	let path = directory.path().join( "settings.json" );
	std::fs::write( &path, "{" ).expect( "Failed to write file" );

	match SourceHost::new( HostConfig::new().with_settings( SettingsBackend::File( path ))) {
		Err( HostError::Load( LoadError::Settings( _ ))) => {}
		other => panic!( "Expected Err( Settings ), found: {:#?}", other ),
	}

}
