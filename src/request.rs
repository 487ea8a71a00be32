//! Request objects addressed by id, and the send / read-back protocol of `net`.
//!
//! The table lives beside the descriptor heap but is independent of it: a request
//! is only ever removed by `net.close`, never by releasing a descriptor.

use std::collections::HashMap ;
use std::time::Instant ;

use crate::rate_limit::RateLimiter ;
use crate::transport::{ HttpRequest, HttpResponse, Transport };



/// Status reported for a send rejected by the rate limiter.
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429 ;

/// Status reported when the transport failed before any response arrived.
pub const STATUS_TRANSPORT_FAILURE: u16 = 0 ;

/// Method codes passed to `net.init`.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash, Default )]
pub enum HttpMethod {
	#[default] Get,
	Post,
	Head,
	Put,
	Delete,
}

impl HttpMethod {
	/// Unknown codes fall back to `GET`.
	pub fn from_code( code: i32 ) -> Self { match code {
		1 => Self::Post,
		2 => Self::Head,
		3 => Self::Put,
		4 => Self::Delete,
		_ => Self::Get,
	}}
}

/// A stored response and the position of the next `get_data` read.
#[derive( Debug, Clone, PartialEq, Eq, Default )]
pub struct Response {
	pub status: u16,
	pub headers: Vec<( String, String )>,
	/// `None` for synthetic responses that carry no payload.
	pub payload: Option<Vec<u8>>,
	cursor: usize,
}

impl Response {

	fn synthetic( status: u16 ) -> Self {
		Self { status, ..Self::default() }
	}

	/// Unread bytes, or `None` without a payload.
	pub fn remaining( &self ) -> Option<usize> {
		self.payload.as_ref().map(| payload | payload.len().saturating_sub( self.cursor ))
	}

	/// Takes exactly `size` bytes from the cursor. Returns `None` without moving
	/// the cursor when fewer than `size` bytes remain.
	pub fn take( &mut self, size: usize ) -> Option<&[u8]> {
		let payload = self.payload.as_ref()?;
		let end = self.cursor.checked_add( size ).filter(| end | *end <= payload.len() )?;
		let start = std::mem::replace( &mut self.cursor, end );
		Some( &payload[start..end] )
	}

	pub fn header( &self, name: &str ) -> Option<&str> {
		self.headers.iter()
			.find(|( known, _ )| known.eq_ignore_ascii_case( name ))
			.map(|( _, value )| value.as_str() )
	}

}

impl From<HttpResponse> for Response {
	fn from( response: HttpResponse ) -> Self {
		Self {
			status: response.status,
			headers: response.headers,
			payload: Some( response.body ),
			cursor: 0,
		}
	}
}

/// One request under construction, possibly with the response of its last send.
#[derive( Debug, Clone, PartialEq, Eq, Default )]
pub struct Request {
	pub method: HttpMethod,
	pub url: Option<String>,
	/// Header names are stored as given; a later `set_header` with the same name
	/// (ignoring case) replaces the earlier value.
	pub headers: Vec<( String, String )>,
	pub body: Option<Vec<u8>>,
	pub response: Option<Response>,
}

impl Request {

	pub fn new( method: HttpMethod ) -> Self {
		Self { method, ..Self::default() }
	}

	pub fn set_header( &mut self, name: String, value: String ) {
		match self.headers.iter_mut().find(|( known, _ )| known.eq_ignore_ascii_case( &name )) {
			Some( entry ) => entry.1 = value,
			None => self.headers.push(( name, value )),
		}
	}

	fn has_header( &self, name: &str ) -> bool {
		self.headers.iter().any(|( known, _ )| known.eq_ignore_ascii_case( name ))
	}

}

/// Requests keyed by id. Ids come from one counter and are never reused.
#[derive( Debug, Default )]
pub struct RequestTable {
	next: i32,
	requests: HashMap<i32, Request>,
}

impl RequestTable {

	pub fn new() -> Self { Self::default() }

	/// Opens a request and returns its id, or `-1` if the id space is exhausted.
	pub fn init( &mut self, method: HttpMethod ) -> i32 {
		let Some( next ) = self.next.checked_add( 1 ) else { return -1 };
		let id = std::mem::replace( &mut self.next, next );
		self.requests.insert( id, Request::new( method ));
		tracing::debug!( request = id, ?method, "init" );
		id
	}

	pub fn get( &self, id: i32 ) -> Option<&Request> { self.requests.get( &id ) }

	pub fn get_mut( &mut self, id: i32 ) -> Option<&mut Request> { self.requests.get_mut( &id ) }

	pub fn close( &mut self, id: i32 ) {
		if self.requests.remove( &id ).is_some() {
			tracing::debug!( request = id, "close" );
		}
	}

	pub fn len( &self ) -> usize { self.requests.len() }

	pub fn is_empty( &self ) -> bool { self.requests.is_empty() }

	/// Sends request `id`, replacing any earlier response.
	///
	/// Nothing happens for an unknown id or a request without a URL. A send the
	/// limiter rejects is answered with a payload-less 429 without touching the
	/// transport. A transport failure is answered with a payload-less status 0.
	pub fn send_at(
		&mut self,
		id: i32,
		limiter: &mut RateLimiter,
		transport: &dyn Transport,
		user_agent: &str,
		now: Instant,
	) {

		let Some( request ) = self.requests.get_mut( &id ) else { return };
		let Some( url ) = request.url.clone() else { return };

		if !limiter.check_at( now ) {
			tracing::debug!( request = id, url = %url, limit = limiter.limit(), "rate limited" );
			request.response = Some( Response::synthetic( STATUS_TOO_MANY_REQUESTS ));
			return ;
		}

		let mut headers = request.headers.clone();
		if !request.has_header( "user-agent" ) {
			headers.push(( "User-Agent".to_string(), user_agent.to_string() ));
		}
		let outgoing = HttpRequest { method: request.method, url, headers, body: request.body.clone() };

		tracing::debug!( request = id, method = ?outgoing.method, url = %outgoing.url, "send" );
		limiter.record_at( now );
		request.response = Some( match transport.execute( &outgoing ) {
			Ok( response ) => response.into(),
			Err( err ) => {
				tracing::debug!( request = id, error = %err, "transport failure" );
				Response::synthetic( STATUS_TRANSPORT_FAILURE )
			},
		});

	}

}
