#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Writer side of the braid metadata format.
//!
//! A blob is assembled as a graph of [`Vertex`] values placed into
//! [`Section`](SectionId)s. Because cross-references are encoded as
//! variable-width relative offsets, vertex sizes depend on the very
//! offsets being computed; [`Writer::save`] runs the layout to a fixed
//! point before flushing bytes.

pub mod hashtable;
pub mod vertex;
pub mod writer;

#[cfg(test)]
mod roundtrip_tests;
#[cfg(test)]
mod vertex_tests;

pub use hashtable::{DEFAULT_FILL_FACTOR, VertexHashtable};
pub use vertex::{
    BlobVertex, StructuralKey, Unifiable, UnsignedConstant, Vertex, VertexId, VertexSequence,
};
pub use writer::{SaveContext, SavedBlob, SectionId, Writer};
