#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Read side of the braid metadata format.
//!
//! This crate contains:
//! - VarInt codec (unary length prefix, little-endian payload packing)
//! - Bounds-checked buffer reader and sequential parser
//! - Bucketed hash index reader with O(1)-ish point lookup
//!
//! The write side lives in `braid-writer`. Byte layout is bit-exact
//! between the two: the VarInt tag bits and the hashtable layout are the
//! wire format.
//!
//! Every read validates its offsets against the buffer size before
//! touching memory. The blob is assumed corrupt or adversarial; any
//! violation is [`FormatError::Malformed`] and is never recovered locally.

pub mod error;
pub mod hashtable;
pub mod parser;
pub mod reader;
pub mod varint;

#[cfg(test)]
mod hashtable_tests;

pub use error::FormatError;
pub use hashtable::{AllEntriesCursor, Hashtable, LookupCursor};
pub use parser::Parser;
pub use reader::{MAX_BLOB_SIZE, Reader};
