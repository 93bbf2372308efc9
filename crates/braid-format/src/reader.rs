//! Immutable, bounds-checked byte-buffer view.

use crate::error::FormatError;
use crate::varint;

/// Largest supported blob size (`2^32 / 4`).
///
/// Keeping the size well under `u32::MAX` guarantees that every
/// `offset + lookahead` sum computed during reading stays clear of `u32`
/// overflow.
pub const MAX_BLOB_SIZE: usize = (u32::MAX / 4) as usize;

/// Read-only view over a metadata blob.
///
/// `Reader` is `Copy` and may be shared freely: all mutable read-side
/// state lives in [`Parser`](crate::Parser) values. Every operation
/// validates its `(offset, lookahead)` pair against the buffer size and
/// fails with [`FormatError::Malformed`] on violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    /// Wrap a byte region. Fails with [`FormatError::TooLarge`] above
    /// [`MAX_BLOB_SIZE`].
    pub fn new(data: &'a [u8]) -> Result<Self, FormatError> {
        if data.len() >= MAX_BLOB_SIZE {
            return Err(FormatError::TooLarge(data.len()));
        }
        Ok(Self { data })
    }

    /// Buffer size in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.data.len() as u32
    }

    /// Whether the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Validate that `lookahead` bytes starting at `offset` are in bounds.
    #[inline]
    fn ensure(&self, offset: u32, lookahead: u32) -> Result<usize, FormatError> {
        if u64::from(offset) + u64::from(lookahead) > self.data.len() as u64 {
            return Err(FormatError::Malformed);
        }
        Ok(offset as usize)
    }

    #[inline]
    fn array_at<const N: usize>(&self, offset: u32) -> Result<[u8; N], FormatError> {
        let at = self.ensure(offset, N as u32)?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.data[at..at + N]);
        Ok(buf)
    }

    /// A counted slice starting at `offset`.
    pub fn bytes_at(&self, offset: u32, len: u32) -> Result<&'a [u8], FormatError> {
        let at = self.ensure(offset, len)?;
        Ok(&self.data[at..at + len as usize])
    }

    /// Read one byte, returning `(value, new_offset)`.
    pub fn read_u8(&self, offset: u32) -> Result<(u8, u32), FormatError> {
        let b: [u8; 1] = self.array_at(offset)?;
        Ok((b[0], offset + 1))
    }

    /// Read an unaligned little-endian `u16`.
    pub fn read_u16(&self, offset: u32) -> Result<(u16, u32), FormatError> {
        let b: [u8; 2] = self.array_at(offset)?;
        Ok((u16::from_le_bytes(b), offset + 2))
    }

    /// Read an unaligned little-endian `u32`.
    pub fn read_u32(&self, offset: u32) -> Result<(u32, u32), FormatError> {
        let b: [u8; 4] = self.array_at(offset)?;
        Ok((u32::from_le_bytes(b), offset + 4))
    }

    /// Read an unaligned little-endian `u64`.
    pub fn read_u64(&self, offset: u32) -> Result<(u64, u32), FormatError> {
        let b: [u8; 8] = self.array_at(offset)?;
        Ok((u64::from_le_bytes(b), offset + 8))
    }

    /// Read an unaligned little-endian `f32`.
    pub fn read_f32(&self, offset: u32) -> Result<(f32, u32), FormatError> {
        let b: [u8; 4] = self.array_at(offset)?;
        Ok((f32::from_le_bytes(b), offset + 4))
    }

    /// Read an unaligned little-endian `f64`.
    pub fn read_f64(&self, offset: u32) -> Result<(f64, u32), FormatError> {
        let b: [u8; 8] = self.array_at(offset)?;
        Ok((f64::from_le_bytes(b), offset + 8))
    }

    /// Decode an unsigned 32-bit VarInt, returning `(value, new_offset)`.
    pub fn decode_unsigned(&self, offset: u32) -> Result<(u32, u32), FormatError> {
        let (value, next) = varint::decode_unsigned(self.data, offset as usize)?;
        Ok((value, next as u32))
    }

    /// Decode a signed 32-bit VarInt, returning `(value, new_offset)`.
    pub fn decode_signed(&self, offset: u32) -> Result<(i32, u32), FormatError> {
        let (value, next) = varint::decode_signed(self.data, offset as usize)?;
        Ok((value, next as u32))
    }

    /// Decode an unsigned 64-bit VarInt, returning `(value, new_offset)`.
    pub fn decode_unsigned_long(&self, offset: u32) -> Result<(u64, u32), FormatError> {
        let (value, next) = varint::decode_unsigned_long(self.data, offset as usize)?;
        Ok((value, next as u32))
    }

    /// Decode a signed 64-bit VarInt, returning `(value, new_offset)`.
    pub fn decode_signed_long(&self, offset: u32) -> Result<(i64, u32), FormatError> {
        let (value, next) = varint::decode_signed_long(self.data, offset as usize)?;
        Ok((value, next as u32))
    }

    /// Advance past one encoded integer without decoding it.
    pub fn skip_integer(&self, offset: u32) -> Result<u32, FormatError> {
        let next = varint::skip_integer(self.data, offset as usize)?;
        Ok(next as u32)
    }
}
