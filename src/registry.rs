//! Loaded sources and the host-facing entry points.
//!
//! Every entry point is one atomic sequence: store the inputs, call the export
//! on the named source, convert the result descriptor into models, and release
//! the input and result descriptors whether or not the call succeeded.

use std::cell::{ Ref, RefCell, RefMut };
use std::collections::HashMap ;
use std::path::Path ;
use std::rc::Rc ;

use pipe_trait::Pipe ;
use wasmtime::{ Engine, Linker, Module, Val };

use crate::config::HostConfig ;
use crate::context::{ HostState, SharedState, SourceContext };
use crate::descriptor::{ Descriptor, DescriptorHeap };
use crate::error::{ InvokeError, LoadError };
use crate::imports ;
use crate::models::{ Chapter, Filter, Listing, Manga, MangaPageResult, Page };
use crate::settings::SettingValue ;
use crate::source::Source ;
use crate::value::{ Record, Value };



/// What an entry point hands to the source.
enum Input {
	Json( serde_json::Value ),
	Record( Record ),
}

impl Input {
	fn store( self, heap: &mut DescriptorHeap ) -> Descriptor {
		match self {
			Self::Json( json ) => heap.store_json( &json, None ),
			Self::Record( record ) => heap.store( record.into() ),
		}
	}
}

/// Owns the engine, the linker with every host namespace, the shared host state
/// and one [`Source`] per id. Not thread-safe; see
/// [`SourceHost`]( crate::SourceHost ) for an async handle.
pub struct SourceRegistry {
	engine: Engine,
	linker: Linker<SourceContext>,
	config: HostConfig,
	host: SharedState,
	sources: HashMap<String, Source>,
}

impl std::fmt::Debug for SourceRegistry {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::result::Result<(), std::fmt::Error> {
		f.debug_struct( "SourceRegistry" )
			.field( "config", &self.config )
			.field( "host", &self.host )
			.field( "sources", &self.sources.keys().collect::<Vec<_>>() )
			.finish_non_exhaustive()
	}
}

impl SourceRegistry {

	pub fn new( config: HostConfig ) -> Result<Self, LoadError> {

		let mut engine_config = wasmtime::Config::new();
		engine_config.consume_fuel( config.fuel_per_call().is_some() );
		let engine = Engine::new( &engine_config ).map_err( LoadError::Engine )?;

		let mut linker = Linker::new( &engine );
		imports::add_to_linker( &mut linker ).map_err( LoadError::Linker )?;

		let host = HostState::new(
			config.settings().open()?,
			config.build_transport()?,
			config.user_agent().to_string(),
		).pipe( RefCell::new ).pipe( Rc::new );

		Ok( Self {
			engine,
			linker,
			config,
			host,
			sources: HashMap::new(),
		})

	}

	pub fn engine( &self ) -> &Engine { &self.engine }

	pub fn config( &self ) -> &HostConfig { &self.config }

	/// Compiles and instantiates a module (binary or text format) under `id`,
	/// then runs its `initialize` export if it has one.
	pub fn load( &mut self, id: impl Into<String>, module: impl AsRef<[u8]> ) -> Result<(), LoadError> {

		let id = id.into();
		if self.sources.contains_key( &id ) { return Err( LoadError::DuplicateSource( id )) }

		let module = Module::new( &self.engine, module ).map_err( LoadError::Compilation )?;
		let source = Source::instantiate(
			&self.engine,
			&self.linker,
			&module,
			id.clone(),
			Rc::clone( &self.host ),
			self.config.fuel_per_call(),
			self.config.max_memory(),
		)?;

		tracing::info!( source = %id, "loaded" );
		self.sources.insert( id, source );
		Ok(())

	}

	pub fn load_file( &mut self, id: impl Into<String>, path: impl AsRef<Path> ) -> Result<(), LoadError> {
		let bytes = std::fs::read( path )?;
		self.load( id, bytes )
	}

	pub fn contains( &self, id: &str ) -> bool { self.sources.contains_key( id ) }

	pub fn source_ids( &self ) -> impl Iterator<Item = &str> { self.sources.keys().map( String::as_str ) }

	pub fn source( &self, id: &str ) -> Option<&Source> { self.sources.get( id ) }

	pub fn source_mut( &mut self, id: &str ) -> Option<&mut Source> { self.sources.get_mut( id ) }

	pub fn heap( &self ) -> Ref<'_, DescriptorHeap> {
		Ref::map( self.host.borrow(), | host | &host.heap )
	}

	pub fn heap_mut( &self ) -> RefMut<'_, DescriptorHeap> {
		RefMut::map( self.host.borrow_mut(), | host | &mut host.heap )
	}

	/// Descriptors currently bound. A count that keeps growing across calls
	/// points at a source that does not release what it creates.
	pub fn live_descriptors( &self ) -> usize { self.host.borrow().heap.len() }

	/// Requests opened and not yet closed.
	pub fn open_requests( &self ) -> usize { self.host.borrow().requests.len() }

	pub fn setting( &self, source: &str, key: &str ) -> Option<SettingValue> {
		self.host.borrow().settings.get( source, key )
	}

	pub fn set_setting( &mut self, source: &str, key: &str, value: SettingValue ) -> Result<(), LoadError> {
		self.host.borrow_mut().settings.set( source, key, value )?;
		Ok(())
	}

	/// Seeds settings from a source's settings manifest: a list of items with a
	/// `type`, a `key` and an optional `default`, where `group` items nest more
	/// items under `items`. Keys without a usable type are skipped.
	pub fn seed_settings( &mut self, source: &str, manifest: &serde_json::Value ) -> Result<(), LoadError> {
		let mut pending = match manifest {
			serde_json::Value::Array( items ) => items.iter().rev().collect::<Vec<_>>(),
			item => vec![ item ],
		};
		while let Some( item ) = pending.pop() {
			if item.get( "type" ).and_then( serde_json::Value::as_str ) == Some( "group" ) {
				if let Some( items ) = item.get( "items" ).and_then( serde_json::Value::as_array ) {
					pending.extend( items.iter().rev() );
				}
				continue ;
			}
			let Some( key ) = item.get( "key" ).and_then( serde_json::Value::as_str ) else { continue };
			let Some( value ) = default_setting( item ) else { continue };
			self.set_setting( source, key, value )?;
		}
		Ok(())
	}

	/// `get_manga_list( filters, page )`.
	pub fn get_manga_list( &mut self, source: &str, filters: &[Filter], page: i32 ) -> Result<MangaPageResult, InvokeError> {
		let filters = filters.iter().map( Filter::to_json ).collect();
		self.invoke( source, "get_manga_list", None, Input::Json( filters ), Some( page ), harvest_page_result )
	}

	/// `get_manga_listing( listing, page )`.
	pub fn get_manga_listing( &mut self, source: &str, listing: &Listing, page: i32 ) -> Result<MangaPageResult, InvokeError> {
		self.invoke( source, "get_manga_listing", None, Input::Json( listing.to_json() ), Some( page ), harvest_page_result )
	}

	/// `get_manga_details( manga )`, given only the manga id.
	pub fn get_manga_details( &mut self, source: &str, manga_id: &str ) -> Result<Manga, InvokeError> {
		let input = Input::Record( Record::Manga( Manga::new( source, manga_id )));
		self.invoke( source, "get_manga_details", None, input, None, | heap, result | match record( heap, result ) {
			Some( Record::Manga( manga )) => Ok( manga.clone() ),
			_ => Err( InvokeError::InvalidResult( "manga" )),
		})
	}

	/// `get_chapter_list( manga )`. Chapters built during the call belong to `manga_id`.
	pub fn get_chapter_list( &mut self, source: &str, manga_id: &str ) -> Result<Vec<Chapter>, InvokeError> {
		let input = Input::Record( Record::Manga( Manga::new( source, manga_id )));
		self.invoke( source, "get_chapter_list", Some( manga_id.to_string() ), input, None, | heap, result | {
			harvest_array( heap, result, "chapter array", | record | match record {
				Record::Chapter( chapter ) => Some( chapter.clone() ),
				_ => None,
			})
		})
	}

	/// `get_page_list( chapter )`.
	pub fn get_page_list( &mut self, source: &str, manga_id: &str, chapter_id: &str ) -> Result<Vec<Page>, InvokeError> {
		let input = Input::Record( Record::Chapter( Chapter::new( source, manga_id, chapter_id )));
		self.invoke( source, "get_page_list", Some( manga_id.to_string() ), input, None, | heap, result | {
			harvest_array( heap, result, "page array", | record | match record {
				Record::Page( page ) => Some( page.clone() ),
				_ => None,
			})
		})
	}

	fn invoke<T>(
		&mut self,
		source_id: &str,
		export: &str,
		current_manga: Option<String>,
		input: Input,
		page: Option<i32>,
		harvest: impl FnOnce( &DescriptorHeap, Descriptor ) -> Result<T, InvokeError>,
	) -> Result<T, InvokeError> {

		let source = self.sources.get_mut( source_id )
			.ok_or_else(|| InvokeError::UnknownSource( source_id.to_string() ))?;

		let input = {
			let mut host = self.host.borrow_mut();
			host.begin_call( current_manga );
			input.store( &mut host.heap )
		};
		let args = std::iter::once( Val::I32( input ))
			.chain( page.map( Val::I32 ))
			.collect::<Vec<_>>();

		let outcome = source.call_descriptor( export, &args );

		let mut host = self.host.borrow_mut();
		let harvested = outcome.and_then(| result | {
			let harvested = harvest( &host.heap, result );
			host.heap.release( result );
			harvested
		});
		host.heap.release( input );
		host.end_call();

		if let Err( err ) = &harvested {
			tracing::warn!( source = %source_id, export, error = %err, "call failed" );
		}
		harvested

	}

}

fn record( heap: &DescriptorHeap, descriptor: Descriptor ) -> Option<&Record> {
	match heap.get( descriptor ) {
		Some( Value::Record( record )) => Some( record.as_ref() ),
		_ => None,
	}
}

fn harvest_page_result( heap: &DescriptorHeap, result: Descriptor ) -> Result<MangaPageResult, InvokeError> {
	let Some( Record::MangaPageResult { entries, has_next_page }) = record( heap, result ) else {
		return Err( InvokeError::InvalidResult( "manga page result" ))
	};
	let manga = harvest_array( heap, *entries, "manga array", | record | match record {
		Record::Manga( manga ) => Some( manga.clone() ),
		_ => None,
	})?;
	Ok( MangaPageResult { manga, has_next_page: *has_next_page })
}

/// Collects the records of an array that `pick` accepts, skipping the rest.
fn harvest_array<T>(
	heap: &DescriptorHeap,
	array: Descriptor,
	expected: &'static str,
	pick: impl Fn( &Record ) -> Option<T>,
) -> Result<Vec<T>, InvokeError> {
	let Some( Value::Array( elements )) = heap.get( array ) else {
		return Err( InvokeError::InvalidResult( expected ))
	};
	Ok( elements.iter()
		.filter_map(| element | record( heap, *element ))
		.filter_map( pick )
		.collect()
	)
}

/// Default value of one settings manifest item.
fn default_setting( item: &serde_json::Value ) -> Option<SettingValue> {
	let default = item.get( "default" );
	let string = || default.and_then( serde_json::Value::as_str ).unwrap_or_default().to_string();
	Some( match item.get( "type" )?.as_str()? {
		"switch" => SettingValue::Bool( default.and_then( serde_json::Value::as_bool ).unwrap_or( false )),
		"stepper" => SettingValue::Float( default.and_then( serde_json::Value::as_f64 ).unwrap_or( 0.0 )),
		"text" | "segment" | "select" => SettingValue::String( string() ),
		"multi-select" | "multi-single-select" => SettingValue::StringArray( default
			.and_then( serde_json::Value::as_array )
			.map(| values | values.iter().filter_map( serde_json::Value::as_str ).map( str::to_string ).collect() )
			.unwrap_or_default()
		),
		_ => return None,
	})
}
