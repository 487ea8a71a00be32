//! Typed per-source settings behind the `defaults` namespace.
//!
//! Values are persisted as `"<kind>:<payload>"` strings under `"<source>:<key>"`.

use std::collections::BTreeMap ;
use std::path::{ Path, PathBuf };

use itertools::Itertools ;

use crate::error::SettingsError ;



/// Separator between the elements of a string-array payload.
const ARRAY_SEPARATOR: char = '\0' ;

#[derive( Debug, Clone, PartialEq )]
pub enum SettingValue {
	Bool( bool ),
	Int( i64 ),
	Float( f64 ),
	String( String ),
	StringArray( Vec<String> ),
}

impl SettingValue {

	pub fn encode( &self ) -> String {
		match self {
			Self::Bool( bool ) => format!( "bool:{bool}" ),
			Self::Int( int ) => format!( "int:{int}" ),
			Self::Float( float ) => format!( "float:{float}" ),
			Self::String( string ) => format!( "string:{string}" ),
			Self::StringArray( strings ) => format!( "stringarray:{}", strings.iter().join( &ARRAY_SEPARATOR.to_string() )),
		}
	}

	/// Parses an encoded value. Unknown kinds and malformed payloads yield `None`.
	pub fn decode( encoded: &str ) -> Option<Self> {
		let ( kind, payload ) = encoded.split_once( ':' )?;
		match kind {
			"bool" | "boolean" => payload.parse().ok().map( Self::Bool ),
			"int" => payload.parse().ok().map( Self::Int ),
			"float" => payload.parse().ok().map( Self::Float ),
			"string" => Some( Self::String( payload.to_string() )),
			"stringarray" => Some( Self::StringArray( match payload.is_empty() {
				true => Vec::new(),
				false => payload.split( ARRAY_SEPARATOR ).map( str::to_string ).collect(),
			})),
			_ => None,
		}
	}

}

/// Storage for encoded settings.
pub trait SettingsStore {
	fn get( &self, source: &str, key: &str ) -> Option<SettingValue>;
	fn set( &mut self, source: &str, key: &str, value: SettingValue ) -> Result<(), SettingsError>;
}

fn scoped_key( source: &str, key: &str ) -> String { format!( "{source}:{key}" ) }

/// Settings kept in memory for the lifetime of the host.
#[derive( Debug, Default, Clone )]
pub struct MemorySettings {
	entries: BTreeMap<String, String>,
}

impl MemorySettings {
	pub fn new() -> Self { Self::default() }
}

impl SettingsStore for MemorySettings {

	fn get( &self, source: &str, key: &str ) -> Option<SettingValue> {
		self.entries.get( &scoped_key( source, key )).and_then(| encoded | SettingValue::decode( encoded ))
	}

	fn set( &mut self, source: &str, key: &str, value: SettingValue ) -> Result<(), SettingsError> {
		self.entries.insert( scoped_key( source, key ), value.encode() );
		Ok(())
	}

}

/// Settings persisted to a JSON file. Every write rewrites the file.
#[derive( Debug )]
pub struct FileSettings {
	path: PathBuf,
	entries: BTreeMap<String, String>,
}

impl FileSettings {

	/// Opens `path`, starting empty if the file does not exist yet.
	pub fn open( path: impl AsRef<Path> ) -> Result<Self, SettingsError> {
		let path = path.as_ref().to_path_buf();
		let entries = match std::fs::read( &path ) {
			Ok( bytes ) => serde_json::from_slice( &bytes )?,
			Err( err ) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
			Err( err ) => return Err( err.into() ),
		};
		Ok( Self { path, entries })
	}

	pub fn path( &self ) -> &Path { &self.path }

	fn flush( &self ) -> Result<(), SettingsError> {
		let bytes = serde_json::to_vec_pretty( &self.entries )?;
		std::fs::write( &self.path, bytes )?;
		Ok(())
	}

}

impl SettingsStore for FileSettings {

	fn get( &self, source: &str, key: &str ) -> Option<SettingValue> {
		self.entries.get( &scoped_key( source, key )).and_then(| encoded | SettingValue::decode( encoded ))
	}

	fn set( &mut self, source: &str, key: &str, value: SettingValue ) -> Result<(), SettingsError> {
		self.entries.insert( scoped_key( source, key ), value.encode() );
		self.flush()
	}

}
