//! Offset-convergence serialization engine.
//!
//! Relative references are VarInt-encoded, so a vertex's size depends on
//! the distance to its targets, which depends on every vertex's offset,
//! which depends on every vertex's size. [`Writer::save`] resolves the
//! cycle iteratively:
//!
//! 1. an initial pass assigns first-guess offsets, encoding references
//!    to not-yet-positioned vertices at maximum width;
//! 2. shrinking passes let offsets move only downward, rolling the
//!    buffer back when the running adjustment says a vertex starts
//!    earlier than the bytes already written (capped at 10 passes;
//!    intermediate buffers are estimates, not valid blobs);
//! 3. growing passes let offsets move only upward, zero-padding gaps.
//!    Growth is monotonic and bounded by the maximum-width encoding of
//!    every reference, so this phase terminates; the pass that ends with
//!    zero adjustment has written the final blob.

use indexmap::IndexMap;

use braid_format::varint;

use crate::vertex::{StructuralKey, Unifiable, Vertex, VertexId};

/// Relative-target placeholder for references whose target has no offset
/// yet. Takes the maximum-width signed encoding, so later passes can only
/// shrink it.
const UNASSIGNED_TARGET: i32 = 0x7FFF_FFFF;

/// Upper bound on shrinking passes. Shrinking is not provably monotonic,
/// so it is capped; the growing phase converges from whatever layout the
/// cap left behind.
const MAX_SHRINK_ITERATIONS: u32 = 10;

/// `iteration` value of a vertex that no pass has positioned yet.
const NOT_SAVED: u32 = u32::MAX;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum SavePhase {
    #[default]
    Initial,
    Shrinking,
    Growing,
}

/// Per-vertex layout state, owned by the writer and indexed by
/// [`VertexId`].
#[derive(Clone, Copy, Debug)]
struct VertexState {
    offset: u32,
    /// Pass that most recently positioned this vertex, or [`NOT_SAVED`].
    iteration: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Placement {
    NotPlaced,
    Unified,
    Placed,
}

/// Handle to a section created by [`Writer::new_section`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionId(u32);

#[derive(Default)]
struct Section {
    placed: Vec<VertexId>,
}

#[derive(Default)]
struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    #[inline]
    fn position(&self) -> u32 {
        self.buf.len() as u32
    }

    fn clear(&mut self) {
        self.buf.clear();
    }

    fn rollback_to(&mut self, offset: u32) {
        self.buf.truncate(offset as usize);
    }

    fn pad_to(&mut self, offset: u32) {
        self.buf.resize(offset as usize, 0);
    }
}

/// Graph builder and serializer.
///
/// Vertices are moved into the writer (via [`add`](Writer::add) or
/// [`unify`](Writer::unify)) and referenced by handle from then on.
/// Emission order is fixed by [`place`](Writer::place): sections in
/// creation order, placed vertices in placement order within each.
/// [`save`](Writer::save) consumes the writer, so a graph is serialized
/// at most once.
#[derive(Default)]
pub struct Writer {
    vertices: Vec<Box<dyn Vertex>>,
    states: Vec<VertexState>,
    placements: Vec<Placement>,
    sections: Vec<Section>,
    unified: IndexMap<StructuralKey, VertexId>,
    encoder: Encoder,
    phase: SavePhase,
    iteration: u32,
    offset_adjustment: i64,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new section after all existing ones.
    pub fn new_section(&mut self) -> SectionId {
        let id = SectionId(self.sections.len() as u32);
        self.sections.push(Section::default());
        id
    }

    /// Move a vertex into the writer and return its handle.
    pub fn add<V: Vertex + 'static>(&mut self, vertex: V) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Box::new(vertex));
        self.states.push(VertexState {
            offset: 0,
            iteration: NOT_SAVED,
        });
        self.placements.push(Placement::NotPlaced);
        id
    }

    /// Intern a vertex by structural key: the first occurrence of a key
    /// wins and every later structurally equal vertex is dropped in favor
    /// of the existing handle.
    pub fn unify<V: Unifiable + 'static>(&mut self, vertex: V) -> VertexId {
        let key = vertex.structural_key();
        if let Some(&existing) = self.unified.get(&key) {
            return existing;
        }
        let id = self.add(vertex);
        self.placements[id.index()] = Placement::Unified;
        self.unified.insert(key, id);
        id
    }

    /// Append a vertex to a section's emission order. Placing an
    /// already-placed vertex is a no-op.
    pub fn place(&mut self, section: SectionId, id: VertexId) {
        if self.placements[id.index()] == Placement::Placed {
            return;
        }
        self.placements[id.index()] = Placement::Placed;
        self.sections[section.0 as usize].placed.push(id);
    }

    /// Run the layout to its fixed point and return the final blob.
    pub fn save(mut self) -> SavedBlob {
        self.phase = SavePhase::Initial;
        self.iteration = 0;
        self.offset_adjustment = 0;
        self.encoder.clear();
        self.run_pass();

        self.phase = SavePhase::Shrinking;
        loop {
            self.iteration += 1;
            self.offset_adjustment = 0;
            self.encoder.clear();
            self.run_pass();
            if self.offset_adjustment == 0 || self.iteration >= MAX_SHRINK_ITERATIONS {
                break;
            }
        }

        self.phase = SavePhase::Growing;
        loop {
            self.iteration += 1;
            self.offset_adjustment = 0;
            self.encoder.clear();
            self.run_pass();
            if self.offset_adjustment == 0 {
                break;
            }
        }

        let offsets = self
            .placements
            .iter()
            .zip(&self.states)
            .map(|(placement, state)| {
                (*placement == Placement::Placed).then_some(state.offset)
            })
            .collect();
        SavedBlob {
            bytes: self.encoder.buf,
            offsets,
        }
    }

    fn run_pass(&mut self) {
        for s in 0..self.sections.len() {
            for i in 0..self.sections[s].placed.len() {
                let id = self.sections[s].placed[i];
                self.position_vertex(id);
                self.save_vertex(id);
            }
        }
    }

    /// Assign the vertex's offset for this pass and reconcile the buffer
    /// position with it.
    fn position_vertex(&mut self, id: VertexId) {
        let current = self.encoder.position();
        let offset = self.states[id.index()].offset;
        let new_offset = match self.phase {
            SavePhase::Initial => current,
            SavePhase::Shrinking => {
                let delta = i64::from(current) - i64::from(offset);
                self.offset_adjustment = self.offset_adjustment.min(delta);
                let target = i64::from(offset) + self.offset_adjustment;
                debug_assert!((0..=i64::from(current)).contains(&target));
                if target < i64::from(current) {
                    self.encoder.rollback_to(target as u32);
                }
                target as u32
            }
            SavePhase::Growing => {
                let delta = i64::from(current) - i64::from(offset);
                self.offset_adjustment = self.offset_adjustment.max(delta);
                let target = i64::from(offset) + self.offset_adjustment;
                debug_assert!(target >= i64::from(current));
                self.encoder.pad_to(target as u32);
                target as u32
            }
        };
        let state = &mut self.states[id.index()];
        state.offset = new_offset;
        state.iteration = self.iteration;
    }

    fn save_vertex(&mut self, id: VertexId) {
        let vertices = &self.vertices;
        let mut cx = SaveContext {
            encoder: &mut self.encoder,
            vertices,
            states: &self.states,
            phase: self.phase,
            iteration: self.iteration,
            offset_adjustment: &mut self.offset_adjustment,
        };
        vertices[id.index()].save(&mut cx);
    }
}

/// Emission context handed to [`Vertex::save`].
///
/// Carries the phase and iteration of the pass explicitly; a `save`
/// implementation never reads writer state through any other channel.
pub struct SaveContext<'a> {
    encoder: &'a mut Encoder,
    vertices: &'a [Box<dyn Vertex>],
    states: &'a [VertexState],
    phase: SavePhase,
    iteration: u32,
    offset_adjustment: &'a mut i64,
}

impl SaveContext<'_> {
    /// Offset the next written byte will land at.
    #[inline]
    pub fn current_offset(&self) -> u32 {
        self.encoder.position()
    }

    /// Number of the running pass (0 is the initial pass).
    #[inline]
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Whether this pass is in the growing phase. Content that cannot
    /// affect convergence (string bodies, hashtable boundary values) is
    /// only materialized when this is true.
    #[inline]
    pub fn is_growing(&self) -> bool {
        self.phase == SavePhase::Growing
    }

    pub fn write_u8(&mut self, value: u8) {
        self.encoder.buf.push(value);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.encoder.buf.extend_from_slice(bytes);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_unsigned(&mut self, value: u32) {
        varint::write_unsigned(&mut self.encoder.buf, value);
    }

    pub fn write_signed(&mut self, value: i32) {
        varint::write_signed(&mut self.encoder.buf, value);
    }

    pub fn write_unsigned_long(&mut self, value: u64) {
        varint::write_unsigned_long(&mut self.encoder.buf, value);
    }

    pub fn write_signed_long(&mut self, value: i64) {
        varint::write_signed_long(&mut self.encoder.buf, value);
    }

    /// Append `count` zero bytes.
    pub fn write_pad(&mut self, count: u32) {
        let len = self.encoder.buf.len() + count as usize;
        self.encoder.buf.resize(len, 0);
    }

    /// Append a counted byte string. Outside the growing phase only the
    /// length is real; the body is zero padding, since content cannot
    /// affect convergence. Growing passes write the actual bytes, so the
    /// final buffer is complete.
    pub fn write_counted_bytes(&mut self, bytes: &[u8]) {
        self.write_unsigned(bytes.len() as u32);
        if self.is_growing() {
            self.write_bytes(bytes);
        } else {
            self.write_pad(bytes.len() as u32);
        }
    }

    /// Append a counted UTF-8 string (the write-side match for
    /// `Parser::get_string`).
    pub fn write_string(&mut self, s: &str) {
        self.write_counted_bytes(s.as_bytes());
    }

    /// Overwrite one already-written byte.
    pub fn patch_byte_at(&mut self, offset: u32, value: u8) {
        self.encoder.buf[offset as usize] = value;
    }

    /// Encode a reference to `target` as a signed VarInt delta from the
    /// offset where the encoding begins.
    ///
    /// A target never positioned by any pass gets the maximum-width
    /// placeholder (possible only before the growing phase). A target
    /// not yet repositioned by the current pass is estimated at its
    /// previous offset plus the running adjustment.
    pub fn write_relative_target(&mut self, target: VertexId) {
        let state = self.states[target.index()];
        if state.iteration == NOT_SAVED {
            debug_assert!(self.phase != SavePhase::Growing);
            self.write_signed(UNASSIGNED_TARGET);
            return;
        }
        let mut offset = i64::from(state.offset);
        if state.iteration < self.iteration {
            offset += *self.offset_adjustment;
        }
        let delta = offset - i64::from(self.encoder.position());
        self.write_signed(delta as i32);
    }

    /// Emit another vertex's bytes at the current position, as part of
    /// this vertex. Inline children are not independently positioned and
    /// must not also be placed in a section.
    pub fn save_inline(&mut self, id: VertexId) {
        let vertices = self.vertices;
        vertices[id.index()].save(self);
    }

    /// Fold a size change that positioning cannot see (a vertex switching
    /// its own encoding width mid-pass) into the running adjustment,
    /// which also forces another pass.
    pub fn update_offset_adjustment(&mut self, delta: i64) {
        if self.phase == SavePhase::Growing {
            *self.offset_adjustment = (*self.offset_adjustment).max(delta);
        } else {
            *self.offset_adjustment = (*self.offset_adjustment).min(delta);
        }
    }
}

/// Result of [`Writer::save`]: the final blob plus the final offset of
/// every placed vertex, for producers that build outer headers around
/// the blob.
pub struct SavedBlob {
    bytes: Vec<u8>,
    offsets: Vec<Option<u32>>,
}

impl SavedBlob {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Final offset of a placed vertex, or `None` if it was never placed.
    pub fn offset_of(&self, id: VertexId) -> Option<u32> {
        self.offsets.get(id.index()).copied().flatten()
    }
}
