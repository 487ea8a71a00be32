use std::path::PathBuf ;
use std::thread::JoinHandle ;

use tokio::sync::{ mpsc, oneshot };

use crate::config::HostConfig ;
use crate::error::HostError ;
use crate::models::{ Chapter, Filter, Listing, Manga, MangaPageResult, Page };
use crate::registry::SourceRegistry ;



const WORKER_NAME: &str = "aidoku-host" ;

type Job = Box<dyn FnOnce( &mut SourceRegistry ) + Send>;

/// Async handle to a [`SourceRegistry`] living on its own worker thread.
///
/// Parsed documents are not `Send`, so the registry never leaves the thread it
/// was built on. Every method queues one job; jobs run one at a time in the
/// order they were sent, so calls into sources never interleave.
///
/// ```no_run
/// # async fn run() -> Result<(), aidoku_host::HostError> {
/// use aidoku_host::{ HostConfig, SourceHost };
///
/// let host = SourceHost::new( HostConfig::new() )?;
/// host.load_file( "en.example", "example.wasm" ).await?;
/// let page = host.get_manga_list( "en.example", Vec::new(), 1 ).await?;
/// println!( "{} manga", page.manga.len() );
/// # Ok(()) }
/// ```
pub struct SourceHost {
	jobs: Option<mpsc::UnboundedSender<Job>>,
	worker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for SourceHost {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::result::Result<(), std::fmt::Error> {
		f.debug_struct( "SourceHost" )
			.field( "running", &self.jobs.as_ref().is_some_and(| jobs | !jobs.is_closed() ))
			.finish_non_exhaustive()
	}
}

impl SourceHost {

	/// Spawns the worker and builds the registry on it. Fails if the registry
	/// cannot be built.
	pub fn new( config: HostConfig ) -> Result<Self, HostError> {

		let ( jobs, mut queue ) = mpsc::unbounded_channel::<Job>();
		let ( ready, handshake ) = std::sync::mpsc::sync_channel( 1 );

		let worker = std::thread::Builder::new()
			.name( WORKER_NAME.to_string() )
			.spawn( move || {
				let mut registry = match SourceRegistry::new( config ) {
					Ok( registry ) => { let _ = ready.send( Ok(())); registry },
					Err( err ) => { let _ = ready.send( Err( err )); return },
				};
				while let Some( job ) = queue.blocking_recv() { job( &mut registry ) }
				tracing::debug!( "worker stopped" );
			})
			.map_err(| _ | HostError::WorkerUnavailable )?;

		match handshake.recv() {
			Ok( Ok(())) => Ok( Self { jobs: Some( jobs ), worker: Some( worker )}),
			Ok( Err( err )) => { let _ = worker.join(); Err( err.into() )},
			Err( _ ) => { let _ = worker.join(); Err( HostError::WorkerUnavailable )},
		}

	}

	/// Runs `job` on the worker and waits for its result.
	pub async fn run<T, F>( &self, job: F ) -> Result<T, HostError>
	where
		T: Send + 'static,
		F: FnOnce( &mut SourceRegistry ) -> T + Send + 'static,
	{
		let ( reply, result ) = oneshot::channel();
		self.jobs.as_ref()
			.ok_or( HostError::WorkerUnavailable )?
			.send( Box::new( move | registry | { let _ = reply.send( job( registry )); }))
			.map_err(| _ | HostError::WorkerUnavailable )?;
		result.await.map_err(| _ | HostError::WorkerUnavailable )
	}

	pub async fn load( &self, id: impl Into<String>, module: Vec<u8> ) -> Result<(), HostError> {
		let id = id.into();
		Ok( self.run( move | registry | registry.load( id, module )).await?? )
	}

	pub async fn load_file( &self, id: impl Into<String>, path: impl Into<PathBuf> ) -> Result<(), HostError> {
		let ( id, path ) = ( id.into(), path.into() );
		Ok( self.run( move | registry | registry.load_file( id, path )).await?? )
	}

	pub async fn get_manga_list( &self, source: impl Into<String>, filters: Vec<Filter>, page: i32 ) -> Result<MangaPageResult, HostError> {
		let source = source.into();
		Ok( self.run( move | registry | registry.get_manga_list( &source, &filters, page )).await?? )
	}

	pub async fn get_manga_listing( &self, source: impl Into<String>, listing: Listing, page: i32 ) -> Result<MangaPageResult, HostError> {
		let source = source.into();
		Ok( self.run( move | registry | registry.get_manga_listing( &source, &listing, page )).await?? )
	}

	pub async fn get_manga_details( &self, source: impl Into<String>, manga_id: impl Into<String> ) -> Result<Manga, HostError> {
		let ( source, manga_id ) = ( source.into(), manga_id.into() );
		Ok( self.run( move | registry | registry.get_manga_details( &source, &manga_id )).await?? )
	}

	pub async fn get_chapter_list( &self, source: impl Into<String>, manga_id: impl Into<String> ) -> Result<Vec<Chapter>, HostError> {
		let ( source, manga_id ) = ( source.into(), manga_id.into() );
		Ok( self.run( move | registry | registry.get_chapter_list( &source, &manga_id )).await?? )
	}

	pub async fn get_page_list(
		&self,
		source: impl Into<String>,
		manga_id: impl Into<String>,
		chapter_id: impl Into<String>,
	) -> Result<Vec<Page>, HostError> {
		let ( source, manga_id, chapter_id ) = ( source.into(), manga_id.into(), chapter_id.into() );
		Ok( self.run( move | registry | registry.get_page_list( &source, &manga_id, &chapter_id )).await?? )
	}

	pub async fn live_descriptors( &self ) -> Result<usize, HostError> {
		self.run(| registry | registry.live_descriptors() ).await
	}

}

impl Drop for SourceHost {
	fn drop( &mut self ) {
		// Closing the queue ends the worker loop once queued jobs are done.
		drop( self.jobs.take() );
		if let Some( worker ) = self.worker.take() { let _ = worker.join(); }
	}
}
