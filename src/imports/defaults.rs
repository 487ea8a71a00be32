//! The `defaults` namespace: typed settings scoped to the calling source.

use wasmtime::Linker ;

use crate::context::SourceContext ;
use crate::descriptor::{ Descriptor, DescriptorHeap, INVALID_DESCRIPTOR };
use crate::settings::SettingValue ;
use crate::value::Value ;
use super::{ Ctx, read_string };



pub const NAMESPACE: &str = "defaults" ;

pub fn add_to_linker( linker: &mut Linker<SourceContext> ) -> wasmtime::Result<()> {
	declare_imports!( linker, NAMESPACE, [
		( "get", get ),
		( "set", set ),
	])
}

fn get( mut caller: Ctx<'_>, key: i32, len: i32 ) -> wasmtime::Result<Descriptor> {
	if len <= 0 { return Ok( INVALID_DESCRIPTOR ) }
	let key = read_string( &mut caller, key, len )?;
	let context = caller.data();
	let mut host = context.host();
	let Some( value ) = host.settings.get( context.source_id(), &key ) else { return Ok( INVALID_DESCRIPTOR ) };
	Ok( store_setting( &mut host.heap, value ))
}

fn store_setting( heap: &mut DescriptorHeap, value: SettingValue ) -> Descriptor {
	match value {
		SettingValue::Bool( bool ) => heap.store( Value::Bool( bool )),
		SettingValue::Int( int ) => heap.store( Value::Int( int )),
		SettingValue::Float( float ) => heap.store( Value::Float( float )),
		SettingValue::String( string ) => heap.store( Value::String( string )),
		SettingValue::StringArray( strings ) => {
			let array = heap.store( Value::Array( Vec::new() ));
			let elements = strings.into_iter()
				.map(| string | heap.store_child( Value::String( string ), array ))
				.collect();
			if let Some( Value::Array( slot )) = heap.get_mut( array ) { *slot = elements }
			array
		},
	}
}

/// Converts a value for storage. Integral floats are kept as ints; arrays keep
/// their string elements. Other kinds cannot be stored.
#[allow( clippy::cast_possible_truncation )]
fn to_setting( heap: &DescriptorHeap, descriptor: Descriptor ) -> Option<SettingValue> {
	Some( match heap.get( descriptor )? {
		Value::Bool( bool ) => SettingValue::Bool( *bool ),
		Value::Int( int ) => SettingValue::Int( *int ),
		Value::Float( float ) if float.is_finite() && float.fract() == 0.0 => SettingValue::Int( *float as i64 ),
		Value::Float( float ) => SettingValue::Float( *float ),
		Value::String( string ) => SettingValue::String( string.clone() ),
		Value::Array( elements ) => SettingValue::StringArray( elements.iter()
			.filter_map(| element | heap.get( *element ).and_then( Value::as_str ).map( str::to_string ))
			.collect()
		),
		Value::Null | Value::Object( _ ) | Value::Date( _ ) | Value::Node( _ ) | Value::Record( _ ) => return None,
	})
}

fn set( mut caller: Ctx<'_>, key: i32, len: i32, value: Descriptor ) -> wasmtime::Result<()> {
	if len <= 0 || value < 0 { return Ok(()) }
	let key = read_string( &mut caller, key, len )?;
	let context = caller.data();
	let mut host = context.host();
	let Some( setting ) = to_setting( &host.heap, value ) else { return Ok(()) };
	if let Err( err ) = host.settings.set( context.source_id(), &key, setting ) {
		tracing::warn!( source = %context.source_id(), key = %key, error = %err, "settings write failed" );
	}
	Ok(())
}
