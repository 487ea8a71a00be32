//! The `html` namespace: the tree bridge.
//!
//! Node-set results are contained by the descriptor they were queried from.
//! String results stand alone.

use std::collections::BTreeMap ;

use wasmtime::Linker ;

use crate::context::SourceContext ;
use crate::descriptor::{ Descriptor, INVALID_DESCRIPTOR };
use crate::html::NodeSet ;
use crate::value::Value ;
use super::{ Ctx, read_string };



pub const NAMESPACE: &str = "html" ;

pub fn add_to_linker( linker: &mut Linker<SourceContext> ) -> wasmtime::Result<()> {
	declare_imports!( linker, NAMESPACE, [
		( "parse", parse ),
		( "parse_fragment", parse_fragment ),
		( "parse_with_uri", parse_with_uri ),
		( "parse_fragment_with_uri", parse_fragment_with_uri ),
		( "select", select ),
		( "attr", attr ),
		( "first", first ),
		( "last", last ),
		( "next", next ),
		( "previous", previous ),
		( "set_text", set_text ),
		( "set_html", set_html ),
		( "prepend", prepend ),
		( "append", append ),
		( "base_uri", base_uri ),
		( "body", body ),
		( "text", text ),
		( "own_text", own_text ),
		( "data", data ),
		( "array", array ),
		( "html", html ),
		( "outer_html", outer_html ),
		( "id", id ),
		( "tag_name", tag_name ),
		( "class_name", class_name ),
		( "has_class", has_class ),
		( "has_attr", has_attr ),
	])
}

#[derive( Clone, Copy )]
enum Kind { Document, Fragment }

fn parse_into( mut caller: Ctx<'_>, kind: Kind, ptr: i32, len: i32, uri: Option<( i32, i32 )> ) -> wasmtime::Result<Descriptor> {
	if len <= 0 { return Ok( INVALID_DESCRIPTOR ) }
	let source = read_string( &mut caller, ptr, len )?;
	let base_uri = match uri {
		Some(( uri, uri_len )) if uri_len > 0 => Some( read_string( &mut caller, uri, uri_len )?),
		_ => None,
	};
	let nodes = match kind {
		Kind::Document => NodeSet::parse( &source, base_uri.as_deref() ),
		Kind::Fragment => NodeSet::parse_fragment( &source, base_uri.as_deref() ),
	};
	Ok( caller.data().host().heap.store( Value::Node( nodes )))
}

fn parse( caller: Ctx<'_>, ptr: i32, len: i32 ) -> wasmtime::Result<Descriptor> {
	parse_into( caller, Kind::Document, ptr, len, None )
}

fn parse_fragment( caller: Ctx<'_>, ptr: i32, len: i32 ) -> wasmtime::Result<Descriptor> {
	parse_into( caller, Kind::Fragment, ptr, len, None )
}

fn parse_with_uri( caller: Ctx<'_>, ptr: i32, len: i32, uri: i32, uri_len: i32 ) -> wasmtime::Result<Descriptor> {
	parse_into( caller, Kind::Document, ptr, len, Some(( uri, uri_len )))
}

fn parse_fragment_with_uri( caller: Ctx<'_>, ptr: i32, len: i32, uri: i32, uri_len: i32 ) -> wasmtime::Result<Descriptor> {
	parse_into( caller, Kind::Fragment, ptr, len, Some(( uri, uri_len )))
}

/// The node-set bound to `descriptor`, if any.
fn node( caller: &Ctx<'_>, descriptor: Descriptor ) -> Option<NodeSet> {
	caller.data().host().heap.get( descriptor ).and_then( Value::as_node ).cloned()
}

fn store_nodes( caller: &Ctx<'_>, nodes: NodeSet, parent: Descriptor ) -> Descriptor {
	caller.data().host().heap.store_child( Value::Node( nodes ), parent )
}

fn store_string( caller: &Ctx<'_>, string: Option<String> ) -> Descriptor {
	match string {
		Some( string ) => caller.data().host().heap.store( Value::String( string )),
		None => INVALID_DESCRIPTOR,
	}
}

/// Applies a navigation to the node-set and stores the result as its child.
fn navigate( caller: &Ctx<'_>, descriptor: Descriptor, step: impl FnOnce( &NodeSet ) -> Option<NodeSet> ) -> Descriptor {
	match node( caller, descriptor ).as_ref().and_then( step ) {
		Some( result ) => store_nodes( caller, result, descriptor ),
		None => INVALID_DESCRIPTOR,
	}
}

/// Reads a string from the node-set and stores it.
fn extract( caller: &Ctx<'_>, descriptor: Descriptor, read: impl FnOnce( &NodeSet ) -> Option<String> ) -> Descriptor {
	let string = node( caller, descriptor ).as_ref().and_then( read );
	store_string( caller, string )
}

fn select( mut caller: Ctx<'_>, descriptor: Descriptor, ptr: i32, len: i32 ) -> wasmtime::Result<Descriptor> {
	if len <= 0 { return Ok( INVALID_DESCRIPTOR ) }
	let selector = read_string( &mut caller, ptr, len )?;
	Ok( navigate( &caller, descriptor, | nodes | nodes.select( &selector )))
}

fn attr( mut caller: Ctx<'_>, descriptor: Descriptor, ptr: i32, len: i32 ) -> wasmtime::Result<Descriptor> {
	if len <= 0 { return Ok( INVALID_DESCRIPTOR ) }
	let name = read_string( &mut caller, ptr, len )?;
	Ok( extract( &caller, descriptor, | nodes | Some( nodes.attr( &name ))))
}

fn first( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	navigate( &caller, descriptor, | nodes | Some( nodes.first() ))
}

fn last( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	navigate( &caller, descriptor, | nodes | Some( nodes.last() ))
}

fn next( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	navigate( &caller, descriptor, | nodes | Some( nodes.next() ))
}

fn previous( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	navigate( &caller, descriptor, | nodes | Some( nodes.previous() ))
}

fn body( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	navigate( &caller, descriptor, | nodes | Some( nodes.body() ))
}

fn mutate( mut caller: Ctx<'_>, descriptor: Descriptor, ptr: i32, len: i32, apply: impl FnOnce( &NodeSet, &str )) -> wasmtime::Result<()> {
	if descriptor < 0 { return Ok(()) }
	let Some( nodes ) = node( &caller, descriptor ) else { return Ok(()) };
	let markup = read_string( &mut caller, ptr, len )?;
	apply( &nodes, &markup );
	Ok(())
}

fn set_text( caller: Ctx<'_>, descriptor: Descriptor, ptr: i32, len: i32 ) -> wasmtime::Result<()> {
	mutate( caller, descriptor, ptr, len, NodeSet::set_text )
}

fn set_html( caller: Ctx<'_>, descriptor: Descriptor, ptr: i32, len: i32 ) -> wasmtime::Result<()> {
	mutate( caller, descriptor, ptr, len, NodeSet::set_html )
}

fn prepend( caller: Ctx<'_>, descriptor: Descriptor, ptr: i32, len: i32 ) -> wasmtime::Result<()> {
	mutate( caller, descriptor, ptr, len, NodeSet::prepend )
}

fn append( caller: Ctx<'_>, descriptor: Descriptor, ptr: i32, len: i32 ) -> wasmtime::Result<()> {
	mutate( caller, descriptor, ptr, len, NodeSet::append )
}

fn base_uri( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	extract( &caller, descriptor, | nodes | Some( nodes.base_uri() ))
}

fn text( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	extract( &caller, descriptor, | nodes | Some( nodes.text() ))
}

fn own_text( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	extract( &caller, descriptor, | nodes | Some( nodes.own_text() ))
}

fn html( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	extract( &caller, descriptor, NodeSet::html )
}

fn outer_html( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	extract( &caller, descriptor, NodeSet::outer_html )
}

fn id( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	extract( &caller, descriptor, | nodes | Some( nodes.id() ))
}

fn tag_name( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	extract( &caller, descriptor, | nodes | Some( nodes.tag_name() ))
}

fn class_name( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	extract( &caller, descriptor, | nodes | Some( nodes.class_name() ))
}

/// `data-*` attributes of the first node as an object of strings.
fn data( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	let Some( nodes ) = node( &caller, descriptor ) else { return INVALID_DESCRIPTOR };
	let mut host = caller.data().host();
	let heap = &mut host.heap ;
	let object = heap.store( Value::Object( BTreeMap::new() ));
	let fields = nodes.data().into_iter()
		.map(|( key, value )| ( key, heap.store_child( Value::String( value ), object )))
		.collect();
	if let Some( Value::Object( slot )) = heap.get_mut( object ) { *slot = fields }
	object
}

/// One single-node set per node, collected in an array contained by `descriptor`.
fn array( caller: Ctx<'_>, descriptor: Descriptor ) -> Descriptor {
	let Some( nodes ) = node( &caller, descriptor ) else { return INVALID_DESCRIPTOR };
	let mut host = caller.data().host();
	let heap = &mut host.heap ;
	let array = heap.store_child( Value::Array( Vec::new() ), descriptor );
	let elements = nodes.split().into_iter()
		.map(| node | heap.store_child( Value::Node( node ), array ))
		.collect();
	if let Some( Value::Array( slot )) = heap.get_mut( array ) { *slot = elements }
	array
}

fn has_class( mut caller: Ctx<'_>, descriptor: Descriptor, ptr: i32, len: i32 ) -> wasmtime::Result<i32> {
	if len <= 0 { return Ok( -1 ) }
	let class = read_string( &mut caller, ptr, len )?;
	Ok( node( &caller, descriptor ).map_or( 0, | nodes | i32::from( nodes.has_class( &class ))))
}

fn has_attr( mut caller: Ctx<'_>, descriptor: Descriptor, ptr: i32, len: i32 ) -> wasmtime::Result<i32> {
	if len <= 0 { return Ok( -1 ) }
	let name = read_string( &mut caller, ptr, len )?;
	Ok( node( &caller, descriptor ).map_or( 0, | nodes | i32::from( nodes.has_attr( &name ))))
}
