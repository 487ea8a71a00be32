use wasmtime::Linker ;

use crate::context::SourceContext ;
use crate::descriptor::{ Descriptor, INVALID_DESCRIPTOR };
use super::{ Ctx, read_bytes };



pub const NAMESPACE: &str = "json" ;

pub fn add_to_linker( linker: &mut Linker<SourceContext> ) -> wasmtime::Result<()> {
	declare_imports!( linker, NAMESPACE, [
		( "parse", parse ),
	])
}

/// Decodes a JSON document into a graph of descriptors rooted at the result.
fn parse( mut caller: Ctx<'_>, ptr: i32, len: i32 ) -> wasmtime::Result<Descriptor> {
	if len <= 0 { return Ok( INVALID_DESCRIPTOR ) }
	let bytes = read_bytes( &mut caller, ptr, len )?;
	let source = caller.data().source_id().to_string();
	Ok( match serde_json::from_slice::<serde_json::Value>( &bytes ) {
		Ok( json ) => caller.data().host().heap.store_json( &json, None ),
		Err( err ) => {
			tracing::warn!( source = %source, error = %err, "invalid json" );
			INVALID_DESCRIPTOR
		},
	})
}
