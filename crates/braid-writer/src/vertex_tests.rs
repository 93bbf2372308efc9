use crate::vertex::{
    BlobVertex, StructuralKey, Unifiable, UnsignedConstant, VertexId, VertexSequence,
};

#[test]
fn keys_of_equal_constants_match() {
    assert_eq!(
        UnsignedConstant::new(42).structural_key(),
        UnsignedConstant::new(42).structural_key()
    );
    assert_ne!(
        UnsignedConstant::new(42).structural_key(),
        UnsignedConstant::new(43).structural_key()
    );
}

#[test]
fn kinds_keep_identical_payloads_apart() {
    // A constant and a blob can serialize the same bytes into their keys;
    // the kind tag must still separate them.
    let constant = UnsignedConstant::new(0).structural_key();
    let blob = BlobVertex::new(Vec::new()).structural_key();
    assert_ne!(constant, blob);
}

#[test]
fn blob_keys_compare_contents() {
    assert_eq!(
        BlobVertex::new(vec![1, 2, 3]).structural_key(),
        BlobVertex::new(vec![1, 2, 3]).structural_key()
    );
    assert_ne!(
        BlobVertex::new(vec![1, 2, 3]).structural_key(),
        BlobVertex::new(vec![1, 2, 4]).structural_key()
    );
    assert_ne!(
        BlobVertex::new(vec![]).structural_key(),
        BlobVertex::new(vec![0]).structural_key()
    );
}

#[test]
fn length_prefix_prevents_concatenation_collisions() {
    let mut a = StructuralKey::new(0x100);
    a.push_bytes(b"ab");
    a.push_bytes(b"c");
    let mut b = StructuralKey::new(0x100);
    b.push_bytes(b"a");
    b.push_bytes(b"bc");
    assert_ne!(a, b);
}

#[test]
fn sequence_keys_compare_element_handles() {
    let mut a = VertexSequence::new();
    a.push(VertexId(0));
    a.push(VertexId(1));
    let mut b = VertexSequence::new();
    b.push(VertexId(0));
    b.push(VertexId(1));
    let mut c = VertexSequence::new();
    c.push(VertexId(1));
    c.push(VertexId(0));
    assert_eq!(a.structural_key(), b.structural_key());
    assert_ne!(a.structural_key(), c.structural_key());
    assert_eq!(a.len(), 2);
    assert!(!a.is_empty());
    assert!(VertexSequence::new().is_empty());
}
