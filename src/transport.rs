//! The network boundary behind `net.send`.
//!
//! Requests reach the network through a [`Transport`], which lets embedders and
//! tests swap the default `reqwest` client for their own.

use std::time::Duration ;

use itertools::Itertools ;

use crate::error::TransportError ;
use crate::request::HttpMethod ;



/// A fully configured outgoing request.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct HttpRequest {
	pub method: HttpMethod,
	pub url: String,
	pub headers: Vec<( String, String )>,
	pub body: Option<Vec<u8>>,
}

/// A completed response. Header names are lower-case and repeated names are
/// merged into one comma-separated value.
#[derive( Debug, Clone, PartialEq, Eq, Default )]
pub struct HttpResponse {
	pub status: u16,
	pub headers: Vec<( String, String )>,
	pub body: Vec<u8>,
}

impl HttpResponse {

	pub fn new( status: u16, body: impl Into<Vec<u8>> ) -> Self {
		Self { status, headers: Vec::new(), body: body.into() }
	}

	pub fn with_header( mut self, name: &str, value: &str ) -> Self {
		self.headers.push(( name.to_ascii_lowercase(), value.to_string() ));
		self.headers = merge_headers( self.headers.into_iter() );
		self
	}

	/// Case-insensitive header lookup.
	pub fn header( &self, name: &str ) -> Option<&str> {
		self.headers.iter()
			.find(|( known, _ )| known.eq_ignore_ascii_case( name ))
			.map(|( _, value )| value.as_str() )
	}

}

/// Executes requests synchronously. Called from inside a guest invocation, so an
/// implementation blocks until the response or a failure is available.
pub trait Transport: Send + Sync {
	fn execute( &self, request: &HttpRequest ) -> Result<HttpResponse, TransportError>;
}

/// Default transport backed by a blocking `reqwest` client.
#[derive( Debug, Clone )]
pub struct ReqwestTransport {
	client: reqwest::blocking::Client,
}

impl ReqwestTransport {

	pub fn new( timeout: Option<Duration> ) -> Result<Self, TransportError> {
		let client = reqwest::blocking::Client::builder()
			.timeout( timeout )
			.build()
			.map_err(| err | TransportError::Client( err.to_string() ))?;
		Ok( Self { client })
	}

}

impl Transport for ReqwestTransport {
	fn execute( &self, request: &HttpRequest ) -> Result<HttpResponse, TransportError> {

		let url = reqwest::Url::parse( &request.url )
			.map_err(| err | TransportError::InvalidUrl( format!( "{}: {}", request.url, err )))?;

		let mut builder = self.client.request( request.method.into(), url );
		for ( name, value ) in &request.headers {
			builder = builder.header( name.as_str(), value.as_str() );
		}
		if let Some( body ) = &request.body {
			builder = builder.body( body.clone() );
		}

		let response = builder.send().map_err(| err | TransportError::Request( err.to_string() ))?;
		let status = response.status().as_u16();
		let headers = merge_headers( response.headers().iter()
			.map(|( name, value )| ( name.as_str().to_string(), String::from_utf8_lossy( value.as_bytes() ).into_owned() ))
		);
		let body = response.bytes()
			.map_err(| err | TransportError::Request( err.to_string() ))?
			.to_vec();

		Ok( HttpResponse { status, headers, body })

	}
}

impl From<HttpMethod> for reqwest::Method {
	fn from( method: HttpMethod ) -> Self { match method {
		HttpMethod::Get => reqwest::Method::GET,
		HttpMethod::Post => reqwest::Method::POST,
		HttpMethod::Head => reqwest::Method::HEAD,
		HttpMethod::Put => reqwest::Method::PUT,
		HttpMethod::Delete => reqwest::Method::DELETE,
	}}
}

/// Lower-cases names and joins the values of repeated names with `", "`.
/// The result is sorted by name.
pub(crate) fn merge_headers( headers: impl Iterator<Item = ( String, String )> ) -> Vec<( String, String )> {
	headers
		.map(|( name, value )| ( name.to_ascii_lowercase(), value ))
		.into_group_map_by(|( name, _ )| name.clone() )
		.into_iter()
		.map(|( name, values )| ( name, values.into_iter().map(|( _, value )| value ).join( ", " )))
		.sorted_by(| a, b | a.0.cmp( &b.0 ))
		.collect()
}
