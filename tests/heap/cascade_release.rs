use std::collections::BTreeMap ;
use aidoku_host::{ DescriptorHeap, Value, INVALID_DESCRIPTOR };

#[test]
fn descriptors_are_monotonic_and_never_reused() {

	let mut heap = DescriptorHeap::new();
	let first = heap.store( Value::Int( 1 ));
	let second = heap.store( Value::Int( 2 ));
	heap.release( first );
	let third = heap.store( Value::Int( 3 ));

	assert_eq!(( first, second, third ), ( 0, 1, 2 ));
	assert_ne!( third, INVALID_DESCRIPTOR );

}

#[test]
fn release_cascades_through_nested_containers() {

	let mut heap = DescriptorHeap::new();
	let outer = heap.store( Value::Object( BTreeMap::new() ));
	let inner = heap.store_child( Value::Array( Vec::new() ), outer );
	let leaf = heap.store_child( Value::String( "leaf".into() ), inner );
	let unrelated = heap.store( Value::Bool( true ));

	heap.release( outer );

	assert!( !heap.contains( outer ));
	assert!( !heap.contains( inner ));
	assert!( !heap.contains( leaf ));
	assert!( heap.contains( unrelated ));
	assert_eq!( heap.len(), 1 );

}

#[test]
fn releasing_twice_is_a_no_op() {

	let mut heap = DescriptorHeap::new();
	let parent = heap.store( Value::Array( Vec::new() ));
	let child = heap.store_child( Value::Null, parent );
	let survivor = heap.store( Value::Null );

	heap.release( parent );
	heap.release( parent );
	heap.release( child );
	heap.release( INVALID_DESCRIPTOR );
	heap.release( 1_000 );

	assert_eq!( heap.len(), 1 );
	assert!( heap.contains( survivor ));

}

#[test]
fn removed_edge_does_not_cascade() {

	let mut heap = DescriptorHeap::new();
	let parent = heap.store( Value::Object( BTreeMap::new() ));
	let child = heap.store( Value::Int( 7 ));
	heap.add_reference( parent, child );
	heap.remove_reference( parent, child );

	heap.release( parent );

	match heap.get( child ) {
		Some( Value::Int( 7 )) => {}
		other => panic!( "Expected child to survive, found: {:#?}", other ),
	}

}

#[test]
fn self_and_dangling_edges_are_ignored() {

	let mut heap = DescriptorHeap::new();
	let node = heap.store( Value::Array( Vec::new() ));
	heap.add_reference( node, node );
	heap.add_reference( node, 99 );
	heap.add_reference( 99, node );

	assert!( heap.references( node ).is_empty() );
	assert!( heap.references( 99 ).is_empty() );

}

#[test]
fn cyclic_edges_still_terminate() {

	let mut heap = DescriptorHeap::new();
	let a = heap.store( Value::Array( Vec::new() ));
	let b = heap.store_child( Value::Array( Vec::new() ), a );
	heap.add_reference( b, a );

	heap.release( a );

	assert!( heap.is_empty() );

}
