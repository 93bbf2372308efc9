//! Hash index builder, the write-side counterpart of
//! `braid_format::Hashtable`.

use std::cell::{Cell, RefCell};

use crate::vertex::{Vertex, VertexId};
use crate::writer::SaveContext;

/// Default average entries per bucket.
pub const DEFAULT_FILL_FACTOR: u32 = 13;

#[derive(Clone, Copy, Debug)]
struct HashEntry {
    hashcode: u32,
    target: VertexId,
}

#[derive(Clone, Copy, Debug)]
struct Layout {
    /// Power of two, or 0 while not yet computed.
    bucket_count: u32,
    /// Boundary width code 0/1/2 for 1/2/4 bytes.
    entry_index_size: u8,
}

/// A bucketed hash index over vertices placed elsewhere in the blob.
///
/// Entries are appended while building the graph; bucket layout is
/// computed on the first save pass and the boundary width is then
/// re-evaluated after every pass against the actual span of the table.
/// Layout state lives in cells because re-evaluation happens inside
/// `save`, which takes the vertex by shared reference.
pub struct VertexHashtable {
    fill_factor: u32,
    entries: RefCell<Vec<HashEntry>>,
    layout: Cell<Layout>,
}

impl Default for VertexHashtable {
    fn default() -> Self {
        Self::new()
    }
}

impl VertexHashtable {
    pub fn new() -> Self {
        Self::with_fill_factor(DEFAULT_FILL_FACTOR)
    }

    pub fn with_fill_factor(fill_factor: u32) -> Self {
        assert!(fill_factor > 0);
        Self {
            fill_factor,
            entries: RefCell::new(Vec::new()),
            layout: Cell::new(Layout {
                bucket_count: 0,
                // Start at the widest code; narrowing is driven by the
                // actual table span once a pass has produced one.
                entry_index_size: 2,
            }),
        }
    }

    /// Add an entry. Only valid before the table is first saved.
    pub fn append(&mut self, hashcode: u32, target: VertexId) {
        debug_assert_eq!(self.layout.get().bucket_count, 0);
        self.entries.get_mut().push(HashEntry { hashcode, target });
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Compute the bucket count and sort entries by (bucket, low byte)
    /// on the first save; later saves reuse the layout.
    fn ensure_layout(&self) -> Layout {
        let mut layout = self.layout.get();
        if layout.bucket_count == 0 {
            let mut entries = self.entries.borrow_mut();
            let estimate = entries.len() as u32 / self.fill_factor;
            let bucket_count = estimate.next_power_of_two().max(1);
            let sort_mask = ((bucket_count - 1) << 8) | 0xFF;
            entries.sort_by_key(|entry| entry.hashcode & sort_mask);
            layout.bucket_count = bucket_count;
            self.layout.set(layout);
        }
        layout
    }
}

/// Back-patch one boundary slot with the table-relative current offset.
/// Values too wide for a narrowed slot truncate; the width re-evaluation
/// at the end of the pass forces a correcting pass in that case.
fn patch_slot(cx: &mut SaveContext<'_>, base: u32, size: u8, slot: u32) {
    let value = cx.current_offset() - base;
    let at = base + (slot << size);
    for i in 0..(1u32 << size) {
        cx.patch_byte_at(at + i, (value >> (8 * i)) as u8);
    }
}

impl Vertex for VertexHashtable {
    fn save(&self, cx: &mut SaveContext<'_>) {
        let layout = self.ensure_layout();
        let bucket_count = layout.bucket_count;
        let size = layout.entry_index_size;
        let bucket_shift = bucket_count.trailing_zeros() as u8;

        cx.write_u8((bucket_shift << 2) | size);
        let base = cx.current_offset();
        cx.write_pad((bucket_count + 1) << size);

        let entries = self.entries.borrow();
        let mut current_bucket = 0u32;
        patch_slot(cx, base, size, 0);
        for entry in entries.iter() {
            let bucket = (entry.hashcode >> 8) & (bucket_count - 1);
            while current_bucket < bucket {
                current_bucket += 1;
                patch_slot(cx, base, size, current_bucket);
            }
            cx.write_u8(entry.hashcode as u8);
            cx.write_relative_target(entry.target);
        }
        while current_bucket < bucket_count {
            current_bucket += 1;
            patch_slot(cx, base, size, current_bucket);
        }

        // Boundary values must fit the slot width; re-evaluate against
        // the actual span. Growing passes may only widen.
        let span = cx.current_offset() - base;
        let needed: u8 = if span > 0xFFFF {
            2
        } else if span > 0xFF {
            1
        } else {
            0
        };
        let widen_only = cx.is_growing();
        if (widen_only && needed > size) || (!widen_only && needed != size) {
            self.layout.set(Layout {
                bucket_count,
                entry_index_size: needed,
            });
            let delta =
                i64::from(bucket_count + 1) * ((1i64 << needed) - (1i64 << size));
            cx.update_offset_adjustment(delta);
        }
    }
}
