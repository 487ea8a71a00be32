//! Per-call execution context threaded through every import.
//!
//! Each source owns a wasmtime [`Store`]( wasmtime::Store ) whose data is a
//! [`SourceContext`]. An import therefore always knows which source is calling,
//! whose rate limiter applies and (through its `Caller`) whose memory to touch.
//! State shared by every source, the descriptor heap and request table, sits
//! behind one [`SharedState`] handle held by all contexts.

use std::cell::{ RefCell, RefMut };
use std::rc::Rc ;
use std::sync::Arc ;

use wasmtime::StoreLimits ;

use crate::descriptor::DescriptorHeap ;
use crate::rate_limit::RateLimiter ;
use crate::request::RequestTable ;
use crate::settings::SettingsStore ;
use crate::transport::Transport ;



/// Handle to the state shared by every source of one registry.
pub type SharedState = Rc<RefCell<HostState>>;

/// State shared by every source of one registry.
pub struct HostState {
	pub heap: DescriptorHeap,
	pub requests: RequestTable,
	pub settings: Box<dyn SettingsStore>,
	pub transport: Arc<dyn Transport>,
	pub user_agent: String,
	/// Chapters built so far in the current top-level call.
	pub chapter_counter: i32,
	/// Manga the current `get_chapter_list` call is listing.
	pub current_manga: Option<String>,
}

impl std::fmt::Debug for HostState {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::result::Result<(), std::fmt::Error> {
		f.debug_struct( "HostState" )
			.field( "heap", &self.heap.len() )
			.field( "requests", &self.requests.len() )
			.field( "user_agent", &self.user_agent )
			.field( "chapter_counter", &self.chapter_counter )
			.field( "current_manga", &self.current_manga )
			.finish_non_exhaustive()
	}
}

impl HostState {

	pub fn new( settings: Box<dyn SettingsStore>, transport: Arc<dyn Transport>, user_agent: String ) -> Self {
		Self {
			heap: DescriptorHeap::new(),
			requests: RequestTable::new(),
			settings,
			transport,
			user_agent,
			chapter_counter: 0,
			current_manga: None,
		}
	}

	/// Starts the per-call chapter numbering.
	pub(crate) fn begin_call( &mut self, current_manga: Option<String> ) {
		self.chapter_counter = 0 ;
		self.current_manga = current_manga ;
	}

	pub(crate) fn end_call( &mut self ) {
		self.chapter_counter = 0 ;
		self.current_manga = None ;
	}

}

/// Data of one source's store.
#[derive( Debug )]
pub struct SourceContext {
	source_id: String,
	host: SharedState,
	pub(crate) rate_limiter: RateLimiter,
	pub(crate) limits: StoreLimits,
	/// Message recorded by `env.abort` during the current call.
	pub(crate) abort: Option<String>,
}

impl SourceContext {

	pub(crate) fn new( source_id: String, host: SharedState, limits: StoreLimits ) -> Self {
		Self {
			source_id,
			host,
			rate_limiter: RateLimiter::default(),
			limits,
			abort: None,
		}
	}

	pub fn source_id( &self ) -> &str { &self.source_id }

	pub fn rate_limiter( &self ) -> &RateLimiter { &self.rate_limiter }

	/// Borrows the shared state. Imports take this borrow only after they are done
	/// reading guest memory through the caller.
	pub fn host( &self ) -> RefMut<'_, HostState> { self.host.borrow_mut() }

	pub(crate) fn shared( &self ) -> SharedState { Rc::clone( &self.host ) }

}
