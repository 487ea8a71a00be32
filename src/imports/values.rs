//! The `std` namespace: constructors, readers and mutators over descriptors.
//!
//! Container reads (`object_get`, `array_get`, `object_keys`, `object_values`)
//! return new descriptors contained by the container they were read from.
//! Removing an element drops its containment edge but never releases it.

use std::collections::BTreeMap ;

use wasmtime::Linker ;

use crate::context::SourceContext ;
use crate::date::parse_date ;
use crate::descriptor::{ Descriptor, DescriptorHeap, INVALID_DESCRIPTOR };
use crate::value::Value ;
use super::{ Ctx, read_string, write_bytes };



pub const NAMESPACE: &str = "std" ;

pub fn add_to_linker( linker: &mut Linker<SourceContext> ) -> wasmtime::Result<()> {
	declare_imports!( linker, NAMESPACE, [
		( "copy", copy ),
		( "destroy", destroy ),
		( "create_null", create_null ),
		( "create_int", create_int ),
		( "create_float", create_float ),
		( "create_string", create_string ),
		( "create_bool", create_bool ),
		( "create_array", create_array ),
		( "create_object", create_object ),
		( "create_date", create_date ),
		( "typeof", type_of ),
		( "string_len", string_len ),
		( "read_string", read_string_into ),
		( "read_int", read_int ),
		( "read_float", read_float ),
		( "read_bool", read_bool ),
		( "read_date", read_date ),
		( "read_date_string", read_date_string ),
		( "object_len", object_len ),
		( "object_get", object_get ),
		( "object_set", object_set ),
		( "object_remove", object_remove ),
		( "object_keys", object_keys ),
		( "object_values", object_values ),
		( "array_len", array_len ),
		( "array_get", array_get ),
		( "array_set", array_set ),
		( "array_append", array_append ),
		( "array_remove", array_remove ),
	])
}

fn store( caller: &Ctx<'_>, value: Value ) -> Descriptor {
	caller.data().host().heap.store( value )
}

/// Shallow copy: a copied container names the same elements and owns none of them.
fn copy( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	let mut host = caller.data().host();
	match host.heap.get( descriptor ).cloned() {
		Some( value ) => host.heap.store( value ),
		None => INVALID_DESCRIPTOR,
	}
}

fn destroy( caller: Ctx<'_>, descriptor: Descriptor ) {
	if descriptor < 0 { return }
	caller.data().host().heap.release( descriptor );
}

fn create_null( caller: Ctx<'_> ) -> Descriptor { store( &caller, Value::Null ) }

fn create_int( caller: Ctx<'_>, int: i64 ) -> Descriptor { store( &caller, Value::Int( int )) }

fn create_float( caller: Ctx<'_>, float: f64 ) -> Descriptor { store( &caller, Value::Float( float )) }

fn create_bool( caller: Ctx<'_>, bool: i32 ) -> Descriptor { store( &caller, Value::Bool( bool != 0 )) }

fn create_array( caller: Ctx<'_> ) -> Descriptor { store( &caller, Value::Array( Vec::new() )) }

fn create_object( caller: Ctx<'_> ) -> Descriptor { store( &caller, Value::Object( BTreeMap::new() )) }

fn create_string( mut caller: Ctx<'_>, ptr: i32, len: i32 ) -> wasmtime::Result<Descriptor> {
	if len <= 0 { return Ok( INVALID_DESCRIPTOR ) }
	let string = read_string( &mut caller, ptr, len )?;
	Ok( store( &caller, Value::String( string )))
}

/// A negative timestamp means "now".
#[allow( clippy::cast_possible_truncation )]
fn create_date( caller: Ctx<'_>, millis: f64 ) -> Descriptor {
	let millis = match millis < 0.0 {
		true => chrono::Utc::now().timestamp_millis(),
		false => millis as i64,
	};
	store( &caller, Value::Date( millis ))
}

fn type_of( caller: Ctx<'_>, descriptor: Descriptor ) -> i32 {
	caller.data().host().heap.type_of( descriptor ).into()
}

/// Byte length of a string value.
fn string_len( caller: Ctx<'_>, descriptor: Descriptor ) -> i32 {
	match caller.data().host().heap.get( descriptor ) {
		Some( Value::String( string )) => i32::try_from( string.len() ).unwrap_or( i32::MAX ),
		_ => -1,
	}
}

/// Writes the first `size` bytes of a string value into `buffer`. Nothing is
/// written if the string is shorter than `size`.
fn read_string_into( mut caller: Ctx<'_>, descriptor: Descriptor, buffer: i32, size: i32 ) -> wasmtime::Result<()> {
	let Ok( size ) = usize::try_from( size ) else { return Ok(()) };
	let bytes = match caller.data().host().heap.get( descriptor ) {
		Some( Value::String( string )) if size <= string.len() => string.as_bytes()[..size].to_vec(),
		_ => return Ok(()),
	};
	write_bytes( &mut caller, buffer, &bytes )?;
	Ok(())
}

#[allow( clippy::cast_possible_truncation )]
fn read_int( caller: Ctx<'_>, descriptor: Descriptor ) -> i64 {
	match caller.data().host().heap.get( descriptor ) {
		Some( Value::Int( int )) => *int,
		Some( Value::Float( float )) => float.floor() as i64,
		Some( Value::Bool( bool )) => i64::from( *bool ),
		Some( Value::String( string )) => parse_int_prefix( string ).unwrap_or( -1 ),
		_ => -1,
	}
}

/// Leading optionally signed decimal integer, ignoring leading whitespace.
fn parse_int_prefix( string: &str ) -> Option<i64> {
	let trimmed = string.trim_start();
	let sign_len = usize::from( trimmed.starts_with([ '-', '+' ]));
	let digits = trimmed[sign_len..].bytes().take_while( u8::is_ascii_digit ).count();
	match digits {
		0 => None,
		_ => trimmed[..sign_len + digits].parse().ok(),
	}
}

#[allow( clippy::cast_precision_loss )]
fn read_float( caller: Ctx<'_>, descriptor: Descriptor ) -> f64 {
	match caller.data().host().heap.get( descriptor ) {
		Some( Value::Int( int )) => *int as f64,
		Some( Value::Float( float )) => *float,
		Some( Value::String( string )) => string.trim().parse().unwrap_or( -1.0 ),
		_ => -1.0,
	}
}

fn read_bool( caller: Ctx<'_>, descriptor: Descriptor ) -> i32 {
	match caller.data().host().heap.get( descriptor ) {
		Some( Value::Bool( bool )) => i32::from( *bool ),
		Some( Value::Int( int )) => i32::from( *int != 0 ),
		Some( Value::Float( float )) => i32::from( *float != 0.0 ),
		_ => 0,
	}
}

#[allow( clippy::cast_precision_loss )]
fn read_date( caller: Ctx<'_>, descriptor: Descriptor ) -> f64 {
	match caller.data().host().heap.get( descriptor ) {
		Some( Value::Date( millis ) | Value::Int( millis )) => *millis as f64,
		Some( Value::Float( float )) => *float,
		_ => -1.0,
	}
}

#[allow( clippy::too_many_arguments, clippy::cast_precision_loss )]
fn read_date_string(
	mut caller: Ctx<'_>,
	descriptor: Descriptor,
	format: i32, format_len: i32,
	_locale: i32, _locale_len: i32,
	zone: i32, zone_len: i32,
) -> wasmtime::Result<f64> {
	if format_len <= 0 { return Ok( -1.0 ) }
	let Some( value ) = caller.data().host().heap.get( descriptor ).and_then( Value::as_str ).map( str::to_string )
	else { return Ok( -1.0 ) };
	let format = read_string( &mut caller, format, format_len )?;
	let zone = match zone_len > 0 {
		true => Some( read_string( &mut caller, zone, zone_len )?),
		false => None,
	};
	Ok( parse_date( &value, &format, zone.as_deref() ).map_or( -1.0, | millis | millis as f64 ))
}

fn object_len( caller: Ctx<'_>, descriptor: Descriptor ) -> i32 {
	let host = caller.data().host();
	let len = match host.heap.get( descriptor ) {
		Some( Value::Object( fields )) => fields.len(),
		Some( Value::Record( record )) => host.heap.record_json( record ).as_object().map_or( 0, serde_json::Map::len ),
		_ => return -1,
	};
	i32::try_from( len ).unwrap_or( i32::MAX )
}

fn object_get( mut caller: Ctx<'_>, descriptor: Descriptor, key: i32, key_len: i32 ) -> wasmtime::Result<Descriptor> {
	if descriptor < 0 || key_len <= 0 { return Ok( INVALID_DESCRIPTOR ) }
	let key = read_string( &mut caller, key, key_len )?;
	let mut host = caller.data().host();
	let heap = &mut host.heap ;
	Ok( match heap.get( descriptor ) {
		Some( Value::Object( fields )) => match fields.get( &key ).copied() {
			Some( field ) => heap.store_view( field, descriptor ),
			None => INVALID_DESCRIPTOR,
		},
		Some( Value::Record( record )) => match heap.record_json( record ).get( &key ).cloned() {
			Some( field ) => heap.store_json( &field, Some( descriptor )),
			None => INVALID_DESCRIPTOR,
		},
		_ => INVALID_DESCRIPTOR,
	})
}

fn object_set( mut caller: Ctx<'_>, descriptor: Descriptor, key: i32, key_len: i32, value: Descriptor ) -> wasmtime::Result<()> {
	if descriptor < 0 || key_len < 0 || value < 0 || descriptor == value { return Ok(()) }
	let key = read_string( &mut caller, key, key_len )?;
	let mut host = caller.data().host();
	let heap = &mut host.heap ;
	if !heap.contains( value ) { return Ok(()) }
	let Some( Value::Object( fields )) = heap.get_mut( descriptor ) else { return Ok(()) };
	if let Some( replaced ) = fields.insert( key, value ) {
		heap.remove_reference( descriptor, replaced );
	}
	heap.add_reference( descriptor, value );
	Ok(())
}

fn object_remove( mut caller: Ctx<'_>, descriptor: Descriptor, key: i32, key_len: i32 ) -> wasmtime::Result<()> {
	if descriptor < 0 || key_len < 0 { return Ok(()) }
	let key = read_string( &mut caller, key, key_len )?;
	let mut host = caller.data().host();
	let heap = &mut host.heap ;
	let Some( Value::Object( fields )) = heap.get_mut( descriptor ) else { return Ok(()) };
	if let Some( removed ) = fields.remove( &key ) {
		heap.remove_reference( descriptor, removed );
	}
	Ok(())
}

/// Field names of an object as an array of strings.
fn object_keys( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	let mut host = caller.data().host();
	let heap = &mut host.heap ;
	let keys: Vec<String> = match heap.get( descriptor ) {
		Some( Value::Object( fields )) => fields.keys().cloned().collect(),
		Some( Value::Record( record )) => heap.record_json( record ).as_object()
			.map(| fields | fields.keys().cloned().collect() )
			.unwrap_or_default(),
		_ => return INVALID_DESCRIPTOR,
	};
	let array = heap.store_child( Value::Array( Vec::new() ), descriptor );
	let elements = keys.into_iter()
		.map(| key | heap.store_child( Value::String( key ), array ))
		.collect();
	set_elements( heap, array, elements );
	array
}

/// Field values of an object as an array. The array names the object's own
/// field descriptors and owns none of them.
fn object_values( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	let mut host = caller.data().host();
	let heap = &mut host.heap ;
	match heap.get( descriptor ) {
		Some( Value::Object( fields )) => {
			let elements = fields.values().copied().collect();
			heap.store_child( Value::Array( elements ), descriptor )
		},
		Some( Value::Record( record )) => {
			let json = heap.record_json( record );
			let array = heap.store_child( Value::Array( Vec::new() ), descriptor );
			let elements = json.as_object()
				.map(| fields | fields.values().map(| field | heap.store_json( field, Some( array ))).collect() )
				.unwrap_or_default();
			set_elements( heap, array, elements );
			array
		},
		_ => INVALID_DESCRIPTOR,
	}
}

fn set_elements( heap: &mut DescriptorHeap, array: Descriptor, elements: Vec<Descriptor> ) {
	if let Some( Value::Array( slot )) = heap.get_mut( array ) { *slot = elements }
}

/// Length of an array, or the number of nodes in a node-set.
fn array_len( caller: Ctx<'_>, descriptor: Descriptor ) -> i32 {
	let len = match caller.data().host().heap.get( descriptor ) {
		Some( Value::Array( elements )) => elements.len(),
		Some( Value::Node( nodes )) => nodes.len(),
		_ => return -1,
	};
	i32::try_from( len ).unwrap_or( i32::MAX )
}

/// Element `index` of an array, or the `index`th node of a node-set as a
/// single-node set.
fn array_get( caller: Ctx<'_>, descriptor: Descriptor, index: i32 ) -> Descriptor {
	let Ok( index ) = usize::try_from( index ) else { return INVALID_DESCRIPTOR };
	let mut host = caller.data().host();
	let heap = &mut host.heap ;
	match heap.get( descriptor ) {
		Some( Value::Array( elements )) => match elements.get( index ).copied() {
			Some( element ) => heap.store_view( element, descriptor ),
			None => INVALID_DESCRIPTOR,
		},
		Some( Value::Node( nodes )) => match nodes.split().into_iter().nth( index ) {
			Some( node ) => heap.store_child( Value::Node( node ), descriptor ),
			None => INVALID_DESCRIPTOR,
		},
		_ => INVALID_DESCRIPTOR,
	}
}

/// Replaces element `index`. Setting one past the end appends; further out is ignored.
fn array_set( caller: Ctx<'_>, descriptor: Descriptor, index: i32, value: Descriptor ) {
	let Ok( index ) = usize::try_from( index ) else { return };
	if descriptor < 0 || value < 0 || descriptor == value { return }
	let mut host = caller.data().host();
	let heap = &mut host.heap ;
	if !heap.contains( value ) { return }
	let Some( Value::Array( elements )) = heap.get_mut( descriptor ) else { return };
	let replaced = match index.cmp( &elements.len() ) {
		std::cmp::Ordering::Less => Some( std::mem::replace( &mut elements[index], value )),
		std::cmp::Ordering::Equal => { elements.push( value ); None },
		std::cmp::Ordering::Greater => return,
	};
	if let Some( replaced ) = replaced { heap.remove_reference( descriptor, replaced ) }
	heap.add_reference( descriptor, value );
}

fn array_append( caller: Ctx<'_>, descriptor: Descriptor, value: Descriptor ) {
	if descriptor < 0 || value < 0 || descriptor == value { return }
	let mut host = caller.data().host();
	let heap = &mut host.heap ;
	if !heap.contains( value ) { return }
	let Some( Value::Array( elements )) = heap.get_mut( descriptor ) else { return };
	elements.push( value );
	heap.add_reference( descriptor, value );
}

fn array_remove( caller: Ctx<'_>, descriptor: Descriptor, index: i32 ) {
	let Ok( index ) = usize::try_from( index ) else { return };
	let mut host = caller.data().host();
	let heap = &mut host.heap ;
	let Some( Value::Array( elements )) = heap.get_mut( descriptor ) else { return };
	if index >= elements.len() { return }
	let removed = elements.remove( index );
	heap.remove_reference( descriptor, removed );
}
