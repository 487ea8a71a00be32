//! The closed set of host values a guest can name through a [`Descriptor`].
//!
//! Containers never embed their elements by value. An [`Value::Array`] or
//! [`Value::Object`] holds the descriptors of its elements, which is what lets a
//! release cascade through the heap without deep copies.

use std::collections::BTreeMap ;

use crate::descriptor::Descriptor ;
use crate::html::NodeSet ;
use crate::models::{ Chapter, DeepLink, Manga, Page };



/// A host-side value bound to a descriptor.
#[derive( Debug, Clone, PartialEq )]
pub enum Value {
	Null,
	Int( i64 ),
	Float( f64 ),
	String( String ),
	Bool( bool ),
	/// Ordered element descriptors.
	Array( Vec<Descriptor> ),
	/// Field name to element descriptor.
	Object( BTreeMap<String, Descriptor> ),
	/// Milliseconds since the Unix epoch.
	Date( i64 ),
	/// The result of a tree query.
	Node( NodeSet ),
	/// A composite record assembled by the `aidoku` namespace or by the host.
	Record( Box<Record> ),
}

/// Composite domain records. Guests read their fields through `std.object_get`
/// using the camelCase property names of [`Record::to_json`].
#[derive( Debug, Clone, PartialEq )]
pub enum Record {
	Manga( Manga ),
	Chapter( Chapter ),
	Page( Page ),
	DeepLink( DeepLink ),
	/// A page of manga. `entries` names an array of manga descriptors that is
	/// contained by the record's own descriptor.
	MangaPageResult { entries: Descriptor, has_next_page: bool },
}

/// Variant tags reported by `std.typeof`.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
#[repr( i32 )]
pub enum ObjectType {
	Null = 0,
	Int = 1,
	Float = 2,
	String = 3,
	Bool = 4,
	Array = 5,
	Object = 6,
	Date = 7,
	Node = 8,
	Unknown = 9,
}

impl From<ObjectType> for i32 {
	fn from( kind: ObjectType ) -> i32 { kind as i32 }
}

impl Value {

	/// Tag of this value on its own. Arrays are always [`ObjectType::Array`] here;
	/// the node-array affordance needs the heap, see
	/// [`DescriptorHeap::type_of`]( crate::DescriptorHeap::type_of ).
	pub fn object_type( &self ) -> ObjectType {
		match self {
			Self::Null => ObjectType::Null,
			Self::Int( _ ) => ObjectType::Int,
			Self::Float( float ) if float.is_finite() && float.fract() == 0.0 => ObjectType::Int,
			Self::Float( _ ) => ObjectType::Float,
			Self::String( _ ) => ObjectType::String,
			Self::Bool( _ ) => ObjectType::Bool,
			Self::Array( _ ) => ObjectType::Array,
			Self::Object( _ ) | Self::Record( _ ) => ObjectType::Object,
			Self::Date( _ ) => ObjectType::Date,
			Self::Node( _ ) => ObjectType::Node,
		}
	}

	pub fn as_str( &self ) -> Option<&str> {
		match self {
			Self::String( string ) => Some( string ),
			_ => None,
		}
	}

	pub fn as_node( &self ) -> Option<&NodeSet> {
		match self {
			Self::Node( nodes ) => Some( nodes ),
			_ => None,
		}
	}

	/// `true` for values that carry element descriptors.
	pub fn is_container( &self ) -> bool {
		matches!( self, Self::Array( _ ) | Self::Object( _ ))
	}

}

impl From<&str> for Value {
	fn from( string: &str ) -> Self { Self::String( string.to_string() ) }
}

impl From<String> for Value {
	fn from( string: String ) -> Self { Self::String( string ) }
}

impl From<Record> for Value {
	fn from( record: Record ) -> Self { Self::Record( Box::new( record )) }
}

impl Record {

	/// Property view used by `std.object_*` on records.
	///
	/// A page result's `manga` property is resolved from the heap by
	/// [`DescriptorHeap::record_json`]( crate::DescriptorHeap::record_json ); here
	/// it is reported as `null`.
	pub fn to_json( &self ) -> serde_json::Value {
		let json = match self {
			Self::Manga( manga ) => serde_json::to_value( manga ),
			Self::Chapter( chapter ) => serde_json::to_value( chapter ),
			Self::Page( page ) => serde_json::to_value( page ),
			Self::DeepLink( link ) => serde_json::to_value( link ),
			Self::MangaPageResult { has_next_page, .. } => Ok( serde_json::json!({
				"manga": serde_json::Value::Null,
				"hasNextPage": has_next_page,
			})),
		};
		json.unwrap_or( serde_json::Value::Null )
	}

}
