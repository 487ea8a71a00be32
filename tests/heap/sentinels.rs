use aidoku_host::{ DescriptorHeap, ObjectType, Value, INVALID_DESCRIPTOR };

#[test]
fn unknown_descriptors_read_as_absent() {

	let mut heap = DescriptorHeap::new();
	let known = heap.store( Value::Int( 1 ));

	assert!( heap.get( INVALID_DESCRIPTOR ).is_none() );
	assert!( heap.get( known + 1 ).is_none() );
	assert_eq!( heap.type_of( INVALID_DESCRIPTOR ), ObjectType::Null );
	assert_eq!( heap.to_json( 42 ), serde_json::Value::Null );

}

#[test]
fn store_child_of_unknown_parent_stores_without_edge() {

	let mut heap = DescriptorHeap::new();
	let orphan = heap.store_child( Value::Int( 5 ), 77 );

	assert!( heap.contains( orphan ));
	assert!( heap.references( 77 ).is_empty() );

}
