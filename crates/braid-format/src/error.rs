//! Read-path error type.

/// Error raised while reading a metadata blob.
///
/// The read path has one data error: [`Malformed`](Self::Malformed). It
/// covers every out-of-bounds offset or lookahead, every unrecognized
/// VarInt tag pattern, and impossible hashtable headers. Readers propagate
/// it immediately; a blob that trips it may be corrupt or adversarial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Out-of-bounds access, unrecognized tag pattern, or impossible header.
    #[error("malformed metadata blob")]
    Malformed,
    /// Buffer exceeds the maximum addressable size (guards offset arithmetic).
    #[error("blob too large: {0} bytes")]
    TooLarge(usize),
}
