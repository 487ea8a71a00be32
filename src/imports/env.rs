//! The `env` namespace: diagnostics.

use wasmtime::Linker ;

use crate::context::SourceContext ;
use crate::memory::{ GuestMemory, MemoryError };
use super::{ Ctx, read_string };



pub const NAMESPACE: &str = "env" ;

pub fn add_to_linker( linker: &mut Linker<SourceContext> ) -> wasmtime::Result<()> {
	declare_imports!( linker, NAMESPACE, [
		( "print", print ),
		( "abort", abort ),
	])
}

fn print( mut caller: Ctx<'_>, ptr: i32, len: i32 ) -> wasmtime::Result<()> {
	if len <= 0 { return Ok(()) }
	let message = read_string( &mut caller, ptr, len )?;
	tracing::info!( source = %caller.data().source_id(), "{message}" );
	Ok(())
}

/// Records the failure and traps. Both strings are guest string objects whose
/// byte length precedes the pointer; a null pointer reads as empty.
fn abort( mut caller: Ctx<'_>, message: i32, file: i32, line: i32, column: i32 ) -> wasmtime::Result<()> {
	let message = read_prefixed( &mut caller, message )?;
	let file = read_prefixed( &mut caller, file )?;
	let report = format!( "{message} {file}:{line}:{column}" );
	tracing::error!( source = %caller.data().source_id(), reason = %message, file = %file, line, column, "abort" );
	caller.data_mut().abort = Some( report.clone() );
	Err( wasmtime::Error::msg( report ))
}

fn read_prefixed( caller: &mut Ctx<'_>, ptr: i32 ) -> Result<String, MemoryError> {
	if ptr == 0 { return Ok( String::new() ) }
	GuestMemory::of( caller )?.read_prefixed_string( &mut *caller, ptr )
}
