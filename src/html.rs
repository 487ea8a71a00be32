//! Parsed HTML trees and node-set queries for the `html` namespace.
//!
//! A [`NodeSet`] is a list of element ids into one shared [`Document`]. Query
//! results share the document with the set they came from, so mutations made
//! through one set are visible through every other set over the same tree.

use std::cell::RefCell ;
use std::rc::Rc ;

use ego_tree::{ NodeId, NodeRef, Tree };
use itertools::Itertools ;
use scraper::{ ElementRef, Html, Node, Selector };
use url::Url ;



/// A parsed tree plus the base URI it was loaded with.
pub struct Document {
	html: Html,
	base_uri: Option<String>,
}

impl std::fmt::Debug for Document {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "Document" )
			.field( "base_uri", &self.base_uri )
			.finish_non_exhaustive()
	}
}

/// An ordered selection of elements within one [`Document`].
#[derive( Clone )]
pub struct NodeSet {
	document: Rc<RefCell<Document>>,
	nodes: Vec<NodeId>,
}

impl PartialEq for NodeSet {
	fn eq( &self, other: &Self ) -> bool {
		Rc::ptr_eq( &self.document, &other.document ) && self.nodes == other.nodes
	}
}

impl std::fmt::Debug for NodeSet {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "NodeSet" )
			.field( "nodes", &self.nodes.len() )
			.finish_non_exhaustive()
	}
}

#[derive( Clone, Copy )]
enum Position { Prepend, Append }

impl NodeSet {

	/// Parses a full document. The set holds the document's root element.
	pub fn parse( source: &str, base_uri: Option<&str> ) -> Self {
		Self::from_html( Html::parse_document( source ), base_uri )
	}

	/// Parses a bodiless fragment. The set holds the fragment's wrapping root element.
	pub fn parse_fragment( source: &str, base_uri: Option<&str> ) -> Self {
		Self::from_html( Html::parse_fragment( source ), base_uri )
	}

	fn from_html( html: Html, base_uri: Option<&str> ) -> Self {
		let root = html.root_element().id();
		Self {
			document: Rc::new( RefCell::new( Document { html, base_uri: base_uri.map( str::to_string ) })),
			nodes: vec![ root ],
		}
	}

	fn with_nodes( &self, nodes: Vec<NodeId> ) -> Self {
		Self { document: Rc::clone( &self.document ), nodes }
	}

	pub fn len( &self ) -> usize { self.nodes.len() }

	pub fn is_empty( &self ) -> bool { self.nodes.is_empty() }

	/// Runs `f` over every element of the set, in order.
	fn elements<R>( &self, f: impl FnOnce( &mut dyn Iterator<Item = ElementRef<'_>> ) -> R ) -> R {
		let document = self.document.borrow();
		let mut elements = self.nodes.iter()
			.filter_map(| id | document.html.tree.get( *id ))
			.filter_map( ElementRef::wrap );
		f( &mut elements )
	}

	fn first_element<R>( &self, f: impl FnOnce( ElementRef<'_> ) -> R ) -> Option<R> {
		self.elements(| elements | elements.next().map( f ))
	}

	/// Descendants of every node matching a CSS selector. `None` if the selector
	/// does not parse.
	pub fn select( &self, selector: &str ) -> Option<Self> {
		let selector = Selector::parse( selector )
			.map_err(| err | tracing::warn!( selector, error = %err, "unparsable selector" ))
			.ok()?;
		let nodes = self.elements(| elements | elements
			.flat_map(| scope | scope.select( &selector )
				.filter( move | found | found.id() != scope.id() )
				.map(| found | found.id() )
				.collect::<Vec<_>>()
			)
			.unique()
			.collect()
		);
		Some( self.with_nodes( nodes ))
	}

	/// Attribute of the first element. `abs:name` resolves the value against the
	/// document's base URI. Missing attributes read as an empty string.
	pub fn attr( &self, name: &str ) -> String {
		let ( name, absolute ) = match name.strip_prefix( "abs:" ) {
			Some( name ) => ( name, true ),
			None => ( name, false ),
		};
		let value = self.first_element(| element | element.value().attr( name ).map( str::to_string ))
			.flatten()
			.unwrap_or_default();
		match absolute && !value.is_empty() {
			true => self.resolve( &value ),
			false => value,
		}
	}

	fn resolve( &self, reference: &str ) -> String {
		let base = self.base_uri();
		Url::parse( &base )
			.and_then(| base | base.join( reference ))
			.or_else(|_| Url::parse( reference ))
			.map(| url | url.to_string() )
			.unwrap_or_default()
	}

	pub fn first( &self ) -> Self {
		self.with_nodes( self.nodes.first().copied().into_iter().collect() )
	}

	pub fn last( &self ) -> Self {
		self.with_nodes( self.nodes.last().copied().into_iter().collect() )
	}

	/// The element sibling immediately after each node.
	pub fn next( &self ) -> Self {
		self.siblings( true )
	}

	/// The element sibling immediately before each node.
	pub fn previous( &self ) -> Self {
		self.siblings( false )
	}

	fn siblings( &self, forward: bool ) -> Self {
		let nodes = {
			let document = self.document.borrow();
			self.nodes.iter()
				.filter_map(| id | document.html.tree.get( *id ))
				.filter_map(| node | match forward {
					true => node.next_siblings().find(| sibling | sibling.value().is_element() ),
					false => node.prev_siblings().find(| sibling | sibling.value().is_element() ),
				})
				.map(| sibling | sibling.id() )
				.unique()
				.collect()
		};
		self.with_nodes( nodes )
	}

	/// Concatenated text of every node in the set, descendants included.
	pub fn text( &self ) -> String {
		self.elements(| elements | elements.flat_map(| element | element.text() ).collect() )
	}

	/// Concatenated text of the direct text children of every node in the set.
	pub fn own_text( &self ) -> String {
		self.elements(| elements | elements
			.flat_map(| element | element.children() )
			.filter_map(| child | child.value().as_text().map(| text | String::from( &**text )))
			.collect()
		)
	}

	/// Inner HTML of the first node.
	pub fn html( &self ) -> Option<String> {
		self.first_element(| element | element.inner_html() )
	}

	/// Outer HTML of the first node.
	pub fn outer_html( &self ) -> Option<String> {
		self.first_element(| element | element.html() )
	}

	/// The document's first `<base href>`, else the base URI given at parse time,
	/// else empty.
	pub fn base_uri( &self ) -> String {
		let document = self.document.borrow();
		Selector::parse( "base[href]" ).ok()
			.and_then(| selector | document.html.select( &selector ).next()
				.and_then(| base | base.value().attr( "href" ).map( str::to_string ))
			)
			.or_else(|| document.base_uri.clone() )
			.unwrap_or_default()
	}

	/// The document `<body>` if the set contains one, else the set itself.
	pub fn body( &self ) -> Self {
		match self.select( "body" ) {
			Some( body ) if !body.is_empty() => body.first(),
			_ => self.clone(),
		}
	}

	/// `data-*` attributes of the first node, prefix stripped.
	pub fn data( &self ) -> Vec<( String, String )> {
		self.first_element(| element | element.value().attrs()
			.filter_map(| ( name, value ) | name.strip_prefix( "data-" ).map(| key | ( key.to_string(), value.to_string() )))
			.collect()
		).unwrap_or_default()
	}

	/// One single-node set per node.
	pub fn split( &self ) -> Vec<Self> {
		self.nodes.iter().map(| id | self.with_nodes( vec![ *id ])).collect()
	}

	pub fn id( &self ) -> String {
		self.first_element(| element | element.value().id().unwrap_or_default().to_string() )
			.unwrap_or_default()
	}

	/// Upper-case tag name of the first node.
	pub fn tag_name( &self ) -> String {
		self.first_element(| element | element.value().name().to_uppercase() )
			.unwrap_or_default()
	}

	pub fn class_name( &self ) -> String {
		self.first_element(| element | element.value().attr( "class" ).unwrap_or_default().to_string() )
			.unwrap_or_default()
	}

	/// Whether any node carries the class.
	pub fn has_class( &self, class: &str ) -> bool {
		self.elements(| mut elements | (&mut elements).any(| element | element.value().classes().any(| known | known == class )))
	}

	/// Whether the first node carries the attribute.
	pub fn has_attr( &self, name: &str ) -> bool {
		self.first_element(| element | element.value().attr( name ).is_some() ).unwrap_or( false )
	}

	/// Replaces the children of every node with a single text node.
	pub fn set_text( &self, text: &str ) {
		let escaped = text.replace( '&', "&amp;" ).replace( '<', "&lt;" ).replace( '>', "&gt;" );
		self.replace_children( &escaped );
	}

	/// Replaces the children of every node with parsed markup.
	pub fn set_html( &self, markup: &str ) {
		self.replace_children( markup );
	}

	/// Inserts parsed markup before the existing children of every node.
	pub fn prepend( &self, markup: &str ) {
		self.insert( markup, Position::Prepend );
	}

	/// Inserts parsed markup after the existing children of every node.
	pub fn append( &self, markup: &str ) {
		self.insert( markup, Position::Append );
	}

	fn replace_children( &self, markup: &str ) {
		{
			let mut document = self.document.borrow_mut();
			let tree = &mut document.html.tree ;
			for id in &self.nodes {
				let children = tree.get( *id )
					.map(| node | node.children().map(| child | child.id() ).collect::<Vec<_>>() )
					.unwrap_or_default();
				for child in children {
					if let Some( mut child ) = tree.get_mut( child ) { child.detach(); }
				}
			}
		}
		self.insert( markup, Position::Append );
	}

	fn insert( &self, markup: &str, position: Position ) {
		let fragment = Html::parse_fragment( markup );
		let fragment_root = fragment.root_element();
		let mut document = self.document.borrow_mut();
		let tree = &mut document.html.tree ;
		for id in &self.nodes {
			match position {
				Position::Append => fragment_root.children()
					.for_each(| child | graft( tree, *id, child, Position::Append )),
				Position::Prepend => fragment_root.children().collect::<Vec<_>>().into_iter().rev()
					.for_each(| child | graft( tree, *id, child, Position::Prepend )),
			}
		}
	}

}

/// Copies `source` and its subtree under `parent`.
fn graft( tree: &mut Tree<Node>, parent: NodeId, source: NodeRef<'_, Node>, position: Position ) {
	let Some( mut parent_node ) = tree.get_mut( parent ) else { return };
	let copied = match position {
		Position::Append => parent_node.append( source.value().clone() ).id(),
		Position::Prepend => parent_node.prepend( source.value().clone() ).id(),
	};
	for child in source.children() {
		graft( tree, copied, child, Position::Append );
	}
}
