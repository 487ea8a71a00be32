use thiserror::Error ;

pub use crate::memory::MemoryError ;



/// Errors that can occur while compiling, linking or initialising a source.
#[derive( Error, Debug )]
pub enum LoadError {
	/// The engine could not be configured.
	#[error( "Engine Error: {0}" )] Engine( wasmtime::Error ),
	/// A host namespace could not be registered on the linker.
	#[error( "Linker Error: {0}" )] Linker( wasmtime::Error ),
	/// The module bytes could not be compiled.
	#[error( "Compilation Failed: {0}" )] Compilation( wasmtime::Error ),
	/// The module could not be instantiated against the host imports.
	#[error( "Instantiation Failed: {0}" )] Instantiation( wasmtime::Error ),
	/// The module's `initialize` export failed.
	#[error( "Initialisation Failed: {0}" )] Initialisation( InvokeError ),
	/// A source with this id is already loaded.
	#[error( "Duplicate Source: {0}" )] DuplicateSource( String ),
	/// The module file could not be read.
	#[error( "Io Error: {0}" )] Io( #[from] std::io::Error ),
	#[error( "Settings Error: {0}" )] Settings( #[from] SettingsError ),
	#[error( "Transport Error: {0}" )] Transport( #[from] TransportError ),
}

/// Errors that can occur when invoking an export of a loaded source.
#[derive( Error, Debug )]
pub enum InvokeError {
	/// No source is loaded under this id.
	#[error( "Unknown Source: {0}" )] UnknownSource( String ),
	/// The export is missing or its signature does not match the call.
	#[error( "Missing Export: {0}" )] MissingExport( String ),
	/// The module trapped during execution.
	#[error( "Runtime Exception" )] RuntimeException( wasmtime::Error ),
	/// The module reported a failure through `env.abort`.
	#[error( "Aborted: {message}" )] Aborted { message: String },
	/// Fuel could not be configured for the call.
	#[error( "Fuel Error: {0}" )] Fuel( wasmtime::Error ),
	/// The returned descriptor is absent or not of the expected kind.
	#[error( "Invalid Result: expected {0}" )] InvalidResult( &'static str ),
}

/// Errors surfaced by [`SourceHost`]( crate::SourceHost ).
#[derive( Error, Debug )]
pub enum HostError {
	#[error( "Load Error: {0}" )] Load( #[from] LoadError ),
	#[error( "Invoke Error: {0}" )] Invoke( #[from] InvokeError ),
	/// The worker thread owning the registry has stopped.
	#[error( "Worker Unavailable" )] WorkerUnavailable,
}

/// Failure of the network layer. Never crosses the ABI; a failed send is
/// reported to the guest as a response with status `0`.
#[derive( Error, Debug )]
pub enum TransportError {
	#[error( "Client Error: {0}" )] Client( String ),
	#[error( "Request Failed: {0}" )] Request( String ),
	#[error( "Invalid Url: {0}" )] InvalidUrl( String ),
}

/// Failure of a settings backend. Logged and otherwise ignored at the ABI.
#[derive( Error, Debug )]
pub enum SettingsError {
	#[error( "Io Error: {0}" )] Io( #[from] std::io::Error ),
	#[error( "Malformed Settings File: {0}" )] Malformed( #[from] serde_json::Error ),
}
