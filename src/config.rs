use std::path::PathBuf ;
use std::sync::Arc ;
use std::time::Duration ;

use crate::error::LoadError ;
use crate::settings::{ FileSettings, MemorySettings, SettingsStore };
use crate::transport::{ ReqwestTransport, Transport };



/// User-Agent sent when a source does not set one.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15" ;

/// Default bound on a single network send.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs( 30 );

/// Where `defaults` values are kept.
#[derive( Debug, Clone, PartialEq, Eq, Default )]
pub enum SettingsBackend {
	#[default] Memory,
	/// A JSON file rewritten on every `defaults.set`.
	File( PathBuf ),
}

impl SettingsBackend {
	pub(crate) fn open( &self ) -> Result<Box<dyn SettingsStore>, LoadError> {
		Ok( match self {
			Self::Memory => Box::new( MemorySettings::new() ),
			Self::File( path ) => Box::new( FileSettings::open( path )?),
		})
	}
}

/// Host-wide options for a [`SourceRegistry`]( crate::SourceRegistry ).
///
/// ```
/// use std::time::Duration ;
/// use aidoku_host::{ HostConfig, SettingsBackend };
///
/// let config = HostConfig::new()
/// 	.with_user_agent( "my-reader/1.0" )
/// 	.with_request_timeout( Some( Duration::from_secs( 10 )))
/// 	.with_fuel_per_call( 10_000_000 )
/// 	.with_settings( SettingsBackend::Memory );
/// assert_eq!( config.user_agent(), "my-reader/1.0" );
/// ```
#[derive( Clone )]
pub struct HostConfig {
	user_agent: String,
	request_timeout: Option<Duration>,
	fuel_per_call: Option<u64>,
	max_memory: Option<usize>,
	settings: SettingsBackend,
	transport: Option<Arc<dyn Transport>>,
}

impl Default for HostConfig {
	fn default() -> Self {
		Self {
			user_agent: DEFAULT_USER_AGENT.to_string(),
			request_timeout: Some( DEFAULT_REQUEST_TIMEOUT ),
			fuel_per_call: None,
			max_memory: None,
			settings: SettingsBackend::default(),
			transport: None,
		}
	}
}

impl std::fmt::Debug for HostConfig {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::result::Result<(), std::fmt::Error> {
		f.debug_struct( "HostConfig" )
			.field( "user_agent", &self.user_agent )
			.field( "request_timeout", &self.request_timeout )
			.field( "fuel_per_call", &self.fuel_per_call )
			.field( "max_memory", &self.max_memory )
			.field( "settings", &self.settings )
			.field( "transport", &self.transport.as_ref().map(| _ | "<custom>" ))
			.finish_non_exhaustive()
	}
}

impl HostConfig {

	pub fn new() -> Self { Self::default() }

	pub fn with_user_agent( mut self, user_agent: impl Into<String> ) -> Self {
		self.user_agent = user_agent.into();
		self
	}

	/// Bounds every send. `None` lets a send block for as long as the network does.
	/// Ignored when a custom transport is supplied.
	pub fn with_request_timeout( mut self, timeout: Option<Duration> ) -> Self {
		self.request_timeout = timeout ;
		self
	}

	/// Enables fuel metering. Each top-level call starts with `fuel` units and the
	/// store is drained back to zero when the call returns.
	pub fn with_fuel_per_call( mut self, fuel: u64 ) -> Self {
		self.fuel_per_call = Some( fuel );
		self
	}

	/// Caps the linear memory of each source, in bytes.
	pub fn with_max_memory( mut self, bytes: usize ) -> Self {
		self.max_memory = Some( bytes );
		self
	}

	pub fn with_settings( mut self, settings: SettingsBackend ) -> Self {
		self.settings = settings ;
		self
	}

	pub fn with_transport( mut self, transport: Arc<dyn Transport> ) -> Self {
		self.transport = Some( transport );
		self
	}

	pub fn user_agent( &self ) -> &str { &self.user_agent }
	pub fn request_timeout( &self ) -> Option<Duration> { self.request_timeout }
	pub fn fuel_per_call( &self ) -> Option<u64> { self.fuel_per_call }
	pub fn max_memory( &self ) -> Option<usize> { self.max_memory }
	pub fn settings( &self ) -> &SettingsBackend { &self.settings }

	pub(crate) fn build_transport( &self ) -> Result<Arc<dyn Transport>, LoadError> {
		match &self.transport {
			Some( transport ) => Ok( Arc::clone( transport )),
			None => Ok( Arc::new( ReqwestTransport::new( self.request_timeout )?)),
		}
	}

}
