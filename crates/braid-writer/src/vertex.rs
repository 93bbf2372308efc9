//! Vertex graph building blocks.

use crate::writer::SaveContext;

/// Handle to a vertex owned by a [`Writer`](crate::Writer).
///
/// Handles are plain arena indices; they are only meaningful against the
/// writer that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexId(pub(crate) u32);

impl VertexId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the serialization graph.
///
/// `save` emits the vertex's bytes through the context. It is called once
/// per layout pass and must emit the same logical content every time;
/// only encoding widths may differ between passes as offsets move.
pub trait Vertex {
    fn save(&self, cx: &mut SaveContext<'_>);
}

/// Content fingerprint used to deduplicate structurally equal vertices.
///
/// A key is a kind discriminant plus a byte string built from the fields
/// that define the vertex's identity. Two vertices unify exactly when
/// their keys are equal, so every [`Unifiable`] impl must feed in every
/// field that affects its serialized form, length-prefixing anything of
/// variable size.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructuralKey {
    kind: u32,
    bytes: Vec<u8>,
}

impl StructuralKey {
    pub fn new(kind: u32) -> Self {
        Self {
            kind,
            bytes: Vec::new(),
        }
    }

    pub fn push_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn push_u64(&mut self, value: u64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a length-prefixed byte string.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.push_u32(bytes.len() as u32);
        self.bytes.extend_from_slice(bytes);
    }

    /// Append a reference to another (already unified) vertex.
    pub fn push_vertex(&mut self, id: VertexId) {
        self.push_u32(id.0);
    }
}

/// Key kinds for the built-in vertices. User vertices should start at
/// [`KIND_USER`].
pub const KIND_UNSIGNED_CONSTANT: u32 = 1;
pub const KIND_BLOB: u32 = 2;
pub const KIND_SEQUENCE: u32 = 3;
pub const KIND_USER: u32 = 0x100;

/// A vertex that can participate in deduplication.
pub trait Unifiable: Vertex {
    fn structural_key(&self) -> StructuralKey;
}

/// A single unsigned VarInt.
#[derive(Clone, Debug)]
pub struct UnsignedConstant {
    value: u32,
}

impl UnsignedConstant {
    pub fn new(value: u32) -> Self {
        Self { value }
    }
}

impl Vertex for UnsignedConstant {
    fn save(&self, cx: &mut SaveContext<'_>) {
        cx.write_unsigned(self.value);
    }
}

impl Unifiable for UnsignedConstant {
    fn structural_key(&self) -> StructuralKey {
        let mut key = StructuralKey::new(KIND_UNSIGNED_CONSTANT);
        key.push_u32(self.value);
        key
    }
}

/// A length-prefixed opaque byte string.
#[derive(Clone, Debug)]
pub struct BlobVertex {
    bytes: Vec<u8>,
}

impl BlobVertex {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl Vertex for BlobVertex {
    fn save(&self, cx: &mut SaveContext<'_>) {
        cx.write_counted_bytes(&self.bytes);
    }
}

impl Unifiable for BlobVertex {
    fn structural_key(&self) -> StructuralKey {
        let mut key = StructuralKey::new(KIND_BLOB);
        key.push_bytes(&self.bytes);
        key
    }
}

/// A counted sequence of vertices emitted inline, in order.
///
/// Unification compares element handles, so elements must themselves be
/// unified before a sequence containing them is.
#[derive(Clone, Debug, Default)]
pub struct VertexSequence {
    elements: Vec<VertexId>,
}

impl VertexSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: VertexId) {
        self.elements.push(element);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Vertex for VertexSequence {
    fn save(&self, cx: &mut SaveContext<'_>) {
        cx.write_unsigned(self.elements.len() as u32);
        for &element in &self.elements {
            cx.save_inline(element);
        }
    }
}

impl Unifiable for VertexSequence {
    fn structural_key(&self) -> StructuralKey {
        let mut key = StructuralKey::new(KIND_SEQUENCE);
        key.push_u32(self.elements.len() as u32);
        for &element in &self.elements {
            key.push_vertex(element);
        }
        key
    }
}
