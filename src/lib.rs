//! A WebAssembly host for Aidoku manga sources.
//!
//! A source is a core WASM module compiled against the Aidoku source ABI. It
//! exports up to five entry points and imports host functions from seven
//! namespaces. Guests never hold host objects directly: every value they build
//! or receive lives in a shared [`DescriptorHeap`] and is referred to by an
//! integer [`Descriptor`].
//!
//! # Core Concepts
//!
//! - [`SourceRegistry`]: Owns the engine, the linker and every loaded [`Source`].
//! 	Exposes the entry points as typed methods that marshal inputs into the heap
//! 	and convert the returned descriptor back into models.
//!
//! - [`SourceHost`]: An async handle running a registry on its own thread.
//!
//! - [`DescriptorHeap`]: Integer handles to [`Value`]s. Containers own the
//! 	descriptors placed in them, so releasing a container releases everything
//! 	reachable only through it.
//!
//! - [`HostConfig`]: User agent, request timeout, settings backend and resource
//! 	limits shared by every source of one registry.
//!
//! # Imports
//!
//! | Namespace  | Purpose |
//! |------------|---------|
//! | `std`      | Build, read and walk Value-ABI values |
//! | `net`      | HTTP requests with per-source rate limiting |
//! | `html`     | HTML parsing and CSS selection |
//! | `json`     | JSON parsing into values |
//! | `defaults` | Per-source settings |
//! | `aidoku`   | Manga, chapter, page and deep link records |
//! | `env`      | Printing and aborting |
//!
//! # Example
//!
//! ```
//! use aidoku_host::{ HostConfig, SourceRegistry };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = SourceRegistry::new( HostConfig::new() )?;
//!
//! // Sources may be given as binary modules or in the text format.
//! registry.load( "en.example", r#"(module
//! 	(import "aidoku" "create_manga_result" (func $result (param i32 i32) (result i32)))
//! 	(import "std" "create_array" (func $array (result i32)))
//! 	(memory (export "memory") 1)
//! 	(func (export "get_manga_list") (param i32 i32) (result i32)
//! 		(call $result (call $array) (i32.const 0)))
//! )"# )?;
//!
//! let page = registry.get_manga_list( "en.example", &[], 1 )?;
//! assert!( page.manga.is_empty() );
//! assert!( !page.has_next_page );
//! // Inputs and results are released once converted.
//! assert_eq!( registry.live_descriptors(), 0 );
//! # Ok(())
//! # }
//! ```
//!
//! # Resource Limits
//!
//! Sources run untrusted code. [`HostConfig::with_fuel_per_call`] gives every
//! export call a fresh fuel budget; [`HostConfig::with_max_memory`] caps the
//! linear memory of each source. A source that runs out of either traps and the
//! call fails with an [`InvokeError`]; the source stays loaded.

mod value ;
mod descriptor ;
mod html ;
mod models ;
mod memory ;
mod error ;
mod rate_limit ;
mod transport ;
mod request ;
mod settings ;
mod config ;
mod context ;
mod date ;
pub mod imports ;
mod source ;
mod registry ;
mod host ;

#[doc( no_inline )]
pub use wasmtime::{ Engine, Val };

pub use value::{ Value, Record, ObjectType };
pub use descriptor::{ Descriptor, DescriptorHeap, INVALID_DESCRIPTOR };
pub use html::NodeSet ;
pub use models::{
	Manga, Chapter, Page, DeepLink, MangaPageResult, Listing, Filter, SortSelection,
	MangaStatus, ContentRating, MangaViewer,
};
pub use error::{ LoadError, InvokeError, HostError, TransportError, SettingsError, MemoryError };
pub use rate_limit::RateLimiter ;
pub use transport::{ Transport, HttpRequest, HttpResponse, ReqwestTransport };
pub use request::{ HttpMethod, Request, RequestTable, Response, STATUS_TOO_MANY_REQUESTS, STATUS_TRANSPORT_FAILURE };
pub use settings::{ SettingValue, SettingsStore, MemorySettings, FileSettings };
pub use config::{ HostConfig, SettingsBackend, DEFAULT_USER_AGENT, DEFAULT_REQUEST_TIMEOUT };
pub use context::{ HostState, SharedState, SourceContext };
pub use date::{ parse_date, translate_pattern };
pub use source::Source ;
pub use registry::SourceRegistry ;
pub use host::SourceHost ;
