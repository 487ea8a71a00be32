//! Host functions imported by sources, one module per import namespace.
//!
//! Every function degrades a bad descriptor, request id or length to its
//! sentinel. The only error an import returns is a failed guest memory access,
//! which traps the current call.

use wasmtime::{ Caller, Linker };

use crate::context::SourceContext ;
use crate::memory::{ GuestMemory, MemoryError };



macro_rules! declare_imports {
	(
		$linker:expr,
		$namespace:expr,
		[
			$(( $name:literal, $function:expr )),*
			$(,)?
		]
	) => {{
		$( $linker.func_wrap( $namespace, $name, $function )?; )*
		Ok(())
	}};
}

mod values ;
mod net ;
mod html ;
mod json ;
mod defaults ;
mod aidoku ;
mod env ;

/// Namespaces registered by [`add_to_linker`].
pub const NAMESPACES: [&str; 7] = [
	values::NAMESPACE,
	net::NAMESPACE,
	html::NAMESPACE,
	json::NAMESPACE,
	defaults::NAMESPACE,
	aidoku::NAMESPACE,
	env::NAMESPACE,
];

/// Registers every host namespace on `linker`.
pub fn add_to_linker( linker: &mut Linker<SourceContext> ) -> wasmtime::Result<()> {
	values::add_to_linker( linker )?;
	net::add_to_linker( linker )?;
	html::add_to_linker( linker )?;
	json::add_to_linker( linker )?;
	defaults::add_to_linker( linker )?;
	aidoku::add_to_linker( linker )?;
	env::add_to_linker( linker )?;
	Ok(())
}

type Ctx<'a> = Caller<'a, SourceContext>;

/// Reads a guest string. Non-positive lengths read as empty without touching memory.
fn read_string( caller: &mut Ctx<'_>, ptr: i32, len: i32 ) -> Result<String, MemoryError> {
	if len <= 0 { return Ok( String::new() ) }
	GuestMemory::of( caller )?.read_string( &*caller, ptr, len )
}

/// Reads raw guest bytes. Non-positive lengths read as empty without touching memory.
fn read_bytes( caller: &mut Ctx<'_>, ptr: i32, len: i32 ) -> Result<Vec<u8>, MemoryError> {
	if len <= 0 { return Ok( Vec::new() ) }
	GuestMemory::of( caller )?.read_bytes( &*caller, ptr, len )
}

fn write_bytes( caller: &mut Ctx<'_>, ptr: i32, bytes: &[u8] ) -> Result<(), MemoryError> {
	if bytes.is_empty() { return Ok(()) }
	GuestMemory::of( caller )?.write_bytes( &mut *caller, ptr, bytes )
}
