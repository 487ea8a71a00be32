//! The descriptor heap: integer handles naming host values.
//!
//! Guests only ever hold opaque `i32` handles. Every handle is checked against
//! the table on use, so a module cannot forge access to host memory, only present
//! integers that either resolve or degrade to a sentinel.
//!
//! Besides the bindings the heap records **containment edges** `parent → child`.
//! Releasing a descriptor releases everything reachable through its edges.
//! An edge is only recorded when both ends are bound, and each parent's edge set
//! is detached before its children are visited, so a release terminates even if a
//! guest links a container into itself.
//!
//! A **view** is a descriptor aliasing another binding. Reads and writes through a
//! view reach the aliased value, and releasing a view drops only the alias.

use std::collections::{ BTreeMap, HashMap };

use crate::value::{ ObjectType, Record, Value };



/// Opaque handle naming one [`Value`] in a [`DescriptorHeap`].
pub type Descriptor = i32 ;

/// Returned by every handle-producing operation for "absent / invalid / null".
pub const INVALID_DESCRIPTOR: Descriptor = -1 ;

/// Maximum nesting followed when rendering values to JSON.
const JSON_DEPTH_LIMIT: usize = 64 ;

/// Table of live descriptors plus the containment graph used for cascading release.
///
/// Handles come from a single monotonically increasing counter and are never
/// reused, even after release.
#[derive( Debug, Default )]
pub struct DescriptorHeap {
	next: Descriptor,
	values: HashMap<Descriptor, Value>,
	aliases: HashMap<Descriptor, Descriptor>,
	references: HashMap<Descriptor, Vec<Descriptor>>,
}

impl DescriptorHeap {

	pub fn new() -> Self { Self::default() }

	/// Binds `value` to a fresh descriptor.
	pub fn store( &mut self, value: Value ) -> Descriptor {
		let Some( descriptor ) = self.allocate() else { return INVALID_DESCRIPTOR };
		tracing::trace!( descriptor, kind = ?value.object_type(), "store" );
		self.values.insert( descriptor, value );
		descriptor
	}

	/// Binds `value` to a fresh descriptor contained by `parent`. If `parent` is not
	/// bound, the value is stored without an edge.
	pub fn store_child( &mut self, value: Value, parent: Descriptor ) -> Descriptor {
		let descriptor = self.store( value );
		self.add_reference( parent, descriptor );
		descriptor
	}

	fn allocate( &mut self ) -> Option<Descriptor> {
		match self.next.checked_add( 1 ) {
			Some( next ) => {
				let descriptor = self.next ;
				self.next = next ;
				Some( descriptor )
			},
			None => {
				tracing::warn!( "descriptor space exhausted" );
				None
			},
		}
	}

	/// The binding a descriptor names: the aliased descriptor for a view, else itself.
	pub fn resolve( &self, descriptor: Descriptor ) -> Descriptor {
		self.aliases.get( &descriptor ).copied().unwrap_or( descriptor )
	}

	pub fn get( &self, descriptor: Descriptor ) -> Option<&Value> {
		self.values.get( &self.resolve( descriptor ))
	}

	pub fn get_mut( &mut self, descriptor: Descriptor ) -> Option<&mut Value> {
		let descriptor = self.resolve( descriptor );
		self.values.get_mut( &descriptor )
	}

	pub fn contains( &self, descriptor: Descriptor ) -> bool {
		self.values.contains_key( &self.resolve( descriptor ))
	}

	/// Number of live descriptors, views included. Hosts can watch this to spot
	/// guest leaks.
	pub fn len( &self ) -> usize { self.values.len() + self.aliases.len() }

	pub fn is_empty( &self ) -> bool { self.values.is_empty() && self.aliases.is_empty() }

	/// Releases `descriptor` and, depth first, every descriptor reachable through
	/// containment edges. Unknown or already released descriptors are ignored.
	pub fn release( &mut self, descriptor: Descriptor ) {
		let mut pending = vec![ descriptor ];
		while let Some( current ) = pending.pop() {
			if self.aliases.remove( &current ).is_some() {
				tracing::trace!( descriptor = current, "release view" );
				continue
			}
			if self.values.remove( &current ).is_some() {
				tracing::trace!( descriptor = current, "release" );
			}
			if let Some( children ) = self.references.remove( &current ) {
				pending.extend( children.into_iter().rev() );
			}
		}
	}

	/// Records `parent → child` so that releasing `parent` also releases `child`.
	/// Ignored unless both descriptors are bound and name distinct bindings. A view
	/// parent records the edge on the value it aliases.
	pub fn add_reference( &mut self, parent: Descriptor, child: Descriptor ) {
		let parent = self.resolve( parent );
		if parent == self.resolve( child ) || !self.contains( parent ) || !self.contains( child ) { return }
		self.references.entry( parent ).or_default().push( child );
	}

	/// Drops one `parent → child` edge without releasing `child`.
	pub fn remove_reference( &mut self, parent: Descriptor, child: Descriptor ) {
		let parent = self.resolve( parent );
		let Some( children ) = self.references.get_mut( &parent ) else { return };
		if let Some( position ) = children.iter().position(| &known | known == child ) {
			children.remove( position );
		}
		if children.is_empty() { self.references.remove( &parent ); }
	}

	/// Descriptors directly contained by `parent`.
	pub fn references( &self, parent: Descriptor ) -> &[Descriptor] {
		self.references.get( &self.resolve( parent )).map_or( &[], Vec::as_slice )
	}

	/// Classifies a descriptor for `std.typeof`. Integral floats report as ints and
	/// a non-empty array whose first element is a node-set reports as a node-set.
	pub fn type_of( &self, descriptor: Descriptor ) -> ObjectType {
		match self.get( descriptor ) {
			None => ObjectType::Null,
			Some( Value::Array( elements )) => match elements.first().and_then(| first | self.get( *first )) {
				Some( Value::Node( _ )) => ObjectType::Node,
				_ => ObjectType::Array,
			},
			Some( value ) => value.object_type(),
		}
	}

	/// Binds a fresh view of `source` as a child of `parent`.
	///
	/// Mutating through the view mutates `source` itself. Releasing the view, or
	/// `parent`, drops the alias and leaves `source` bound.
	pub fn store_view( &mut self, source: Descriptor, parent: Descriptor ) -> Descriptor {
		let target = self.resolve( source );
		if !self.values.contains_key( &target ) { return INVALID_DESCRIPTOR }
		let Some( descriptor ) = self.allocate() else { return INVALID_DESCRIPTOR };
		tracing::trace!( descriptor, target, "store view" );
		self.aliases.insert( descriptor, target );
		self.add_reference( parent, descriptor );
		descriptor
	}

	/// Stores a JSON document as a graph of descriptors. Containers own their
	/// elements; the root is a child of `parent` when one is given.
	pub fn store_json( &mut self, json: &serde_json::Value, parent: Option<Descriptor> ) -> Descriptor {
		let value = match json {
			serde_json::Value::Null => Value::Null,
			serde_json::Value::Bool( bool ) => Value::Bool( *bool ),
			serde_json::Value::Number( number ) => match number.as_i64() {
				Some( int ) => Value::Int( int ),
				None => Value::Float( number.as_f64().unwrap_or( f64::NAN )),
			},
			serde_json::Value::String( string ) => Value::String( string.clone() ),
			serde_json::Value::Array( _ ) => Value::Array( Vec::new() ),
			serde_json::Value::Object( _ ) => Value::Object( BTreeMap::new() ),
		};
		let descriptor = match parent {
			Some( parent ) => self.store_child( value, parent ),
			None => self.store( value ),
		};
		if descriptor == INVALID_DESCRIPTOR { return descriptor }

		match json {
			serde_json::Value::Array( items ) => {
				let elements = items.iter()
					.map(| item | self.store_json( item, Some( descriptor )))
					.collect();
				if let Some( slot ) = self.get_mut( descriptor ) { *slot = Value::Array( elements ); }
			},
			serde_json::Value::Object( fields ) => {
				let entries = fields.iter()
					.map(|( key, field )| ( key.clone(), self.store_json( field, Some( descriptor ))))
					.collect();
				if let Some( slot ) = self.get_mut( descriptor ) { *slot = Value::Object( entries ); }
			},
			_ => {},
		}
		descriptor
	}

	/// Renders a descriptor to JSON, following element descriptors.
	pub fn to_json( &self, descriptor: Descriptor ) -> serde_json::Value {
		self.to_json_bounded( descriptor, JSON_DEPTH_LIMIT )
	}

	fn to_json_bounded( &self, descriptor: Descriptor, depth: usize ) -> serde_json::Value {
		use serde_json::Value as Json ;
		let Some( depth ) = depth.checked_sub( 1 ) else { return Json::Null };
		match self.get( descriptor ) {
			None | Some( Value::Null ) => Json::Null,
			Some( Value::Int( int )) => Json::from( *int ),
			Some( Value::Float( float )) => Json::from( *float ),
			Some( Value::String( string )) => Json::from( string.as_str() ),
			Some( Value::Bool( bool )) => Json::from( *bool ),
			Some( Value::Date( millis )) => Json::from( *millis ),
			Some( Value::Array( elements )) => elements.iter()
				.map(| element | self.to_json_bounded( *element, depth ))
				.collect(),
			Some( Value::Object( fields )) => Json::Object( fields.iter()
				.map(|( key, field )| ( key.clone(), self.to_json_bounded( *field, depth )))
				.collect()
			),
			Some( Value::Node( nodes )) => Json::from( nodes.outer_html().unwrap_or_default() ),
			Some( Value::Record( record )) => self.record_json( record ),
		}
	}

	/// Property view of a record with heap-backed fields resolved.
	pub fn record_json( &self, record: &Record ) -> serde_json::Value {
		match record {
			Record::MangaPageResult { entries, has_next_page } => serde_json::json!({
				"manga": self.to_json( *entries ),
				"hasNextPage": has_next_page,
			}),
			record => record.to_json(),
		}
	}

}
