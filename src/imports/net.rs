//! The `net` namespace: request objects addressed by id.
//!
//! `send` blocks the calling guest until the transport answers. Rate limiting
//! applies to the source making the call, through its own context.

use std::sync::Arc ;
use std::time::Instant ;

use wasmtime::Linker ;

use crate::context::SourceContext ;
use crate::descriptor::{ Descriptor, INVALID_DESCRIPTOR };
use crate::html::NodeSet ;
use crate::request::HttpMethod ;
use crate::value::Value ;
use super::{ Ctx, read_bytes, read_string, write_bytes };



pub const NAMESPACE: &str = "net" ;

pub fn add_to_linker( linker: &mut Linker<SourceContext> ) -> wasmtime::Result<()> {
	declare_imports!( linker, NAMESPACE, [
		( "init", init ),
		( "send", send ),
		( "close", close ),
		( "set_url", set_url ),
		( "set_header", set_header ),
		( "set_body", set_body ),
		( "get_url", get_url ),
		( "get_data_size", get_data_size ),
		( "get_data", get_data ),
		( "get_status_code", get_status_code ),
		( "get_header", get_header ),
		( "json", json ),
		( "html", html ),
		( "set_rate_limit", set_rate_limit ),
		( "set_rate_limit_period", set_rate_limit_period ),
	])
}

fn init( caller: Ctx<'_>, method: i32 ) -> i32 {
	caller.data().host().requests.init( HttpMethod::from_code( method ))
}

fn close( caller: Ctx<'_>, id: i32 ) {
	caller.data().host().requests.close( id );
}

fn set_url( mut caller: Ctx<'_>, id: i32, ptr: i32, len: i32 ) -> wasmtime::Result<()> {
	if len <= 0 || caller.data().host().requests.get( id ).is_none() { return Ok(()) }
	let url = read_string( &mut caller, ptr, len )?;
	if let Some( request ) = caller.data().host().requests.get_mut( id ) {
		request.url = Some( url );
	}
	Ok(())
}

fn set_header( mut caller: Ctx<'_>, id: i32, key: i32, key_len: i32, value: i32, value_len: i32 ) -> wasmtime::Result<()> {
	if key_len <= 0 || value_len <= 0 || caller.data().host().requests.get( id ).is_none() { return Ok(()) }
	let key = read_string( &mut caller, key, key_len )?;
	let value = read_string( &mut caller, value, value_len )?;
	if let Some( request ) = caller.data().host().requests.get_mut( id ) {
		request.set_header( key, value );
	}
	Ok(())
}

fn set_body( mut caller: Ctx<'_>, id: i32, ptr: i32, len: i32 ) -> wasmtime::Result<()> {
	if len <= 0 || caller.data().host().requests.get( id ).is_none() { return Ok(()) }
	let body = read_bytes( &mut caller, ptr, len )?;
	if let Some( request ) = caller.data().host().requests.get_mut( id ) {
		request.body = Some( body );
	}
	Ok(())
}

fn send( mut caller: Ctx<'_>, id: i32 ) {
	let shared = caller.data().shared();
	let mut host = shared.borrow_mut();
	let transport = Arc::clone( &host.transport );
	let user_agent = host.user_agent.clone();
	let limiter = &mut caller.data_mut().rate_limiter ;
	host.requests.send_at( id, limiter, transport.as_ref(), &user_agent, Instant::now() );
}

fn get_url( caller: Ctx<'_>, id: i32 ) -> Descriptor {
	let mut host = caller.data().host();
	match host.requests.get( id ).and_then(| request | request.url.clone() ) {
		Some( url ) => host.heap.store( Value::String( url )),
		None => INVALID_DESCRIPTOR,
	}
}

/// Unread payload bytes, `-1` without a payload.
fn get_data_size( caller: Ctx<'_>, id: i32 ) -> i32 {
	caller.data().host().requests.get( id )
		.and_then(| request | request.response.as_ref() )
		.and_then(| response | response.remaining() )
		.map_or( -1, | remaining | i32::try_from( remaining ).unwrap_or( i32::MAX ))
}

/// Copies exactly `size` unread bytes into `buffer`, or nothing at all.
fn get_data( mut caller: Ctx<'_>, id: i32, buffer: i32, size: i32 ) -> wasmtime::Result<()> {
	let Some( size ) = usize::try_from( size ).ok().filter(| size | *size > 0 ) else { return Ok(()) };
	let bytes = caller.data().host().requests.get_mut( id )
		.and_then(| request | request.response.as_mut() )
		.and_then(| response | response.take( size ).map( <[u8]>::to_vec ));
	if let Some( bytes ) = bytes { write_bytes( &mut caller, buffer, &bytes )?; }
	Ok(())
}

fn get_status_code( caller: Ctx<'_>, id: i32 ) -> i32 {
	caller.data().host().requests.get( id )
		.and_then(| request | request.response.as_ref() )
		.map_or( -1, | response | i32::from( response.status ))
}

fn get_header( mut caller: Ctx<'_>, id: i32, key: i32, key_len: i32 ) -> wasmtime::Result<Descriptor> {
	if key_len <= 0 { return Ok( INVALID_DESCRIPTOR ) }
	let key = read_string( &mut caller, key, key_len )?;
	let mut host = caller.data().host();
	let header = host.requests.get( id )
		.and_then(| request | request.response.as_ref() )
		.and_then(| response | response.header( &key ).map( str::to_string ));
	Ok( match header {
		Some( value ) => host.heap.store( Value::String( value )),
		None => INVALID_DESCRIPTOR,
	})
}

/// Decodes the whole payload as JSON, ignoring the read cursor.
fn json( caller: Ctx<'_>, id: i32 ) -> Descriptor {
	let mut host = caller.data().host();
	let Some( payload ) = host.requests.get( id )
		.and_then(| request | request.response.as_ref() )
		.and_then(| response | response.payload.as_deref() )
	else { return INVALID_DESCRIPTOR };
	match serde_json::from_slice::<serde_json::Value>( payload ) {
		Ok( json ) => host.heap.store_json( &json, None ),
		Err( err ) => {
			tracing::warn!( request = id, error = %err, "response is not valid json" );
			INVALID_DESCRIPTOR
		},
	}
}

/// Parses the whole payload as a document whose base URI is the request URL.
fn html( caller: Ctx<'_>, id: i32 ) -> Descriptor {
	let mut host = caller.data().host();
	let Some( request ) = host.requests.get( id ) else { return INVALID_DESCRIPTOR };
	let Some( payload ) = request.response.as_ref().and_then(| response | response.payload.as_deref() )
	else { return INVALID_DESCRIPTOR };
	let document = NodeSet::parse( &String::from_utf8_lossy( payload ), request.url.as_deref() );
	host.heap.store( Value::Node( document ))
}

fn set_rate_limit( mut caller: Ctx<'_>, limit: i32 ) {
	caller.data_mut().rate_limiter.set_limit( limit );
}

/// Period in milliseconds.
fn set_rate_limit_period( mut caller: Ctx<'_>, period: i32 ) {
	caller.data_mut().rate_limiter.set_period_millis( period );
}
