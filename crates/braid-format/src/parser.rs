//! Sequential cursor over a [`Reader`].

use crate::error::FormatError;
use crate::reader::Reader;

/// Mutable cursor over a [`Reader`], providing sequential forms of every
/// read operation plus relative-offset resolution.
///
/// After any successful operation the cursor sits just past the bytes it
/// consumed. "Not found" results from enumeration are expressed as
/// `Option<Parser>` by the callers, never as a special parser value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parser<'a> {
    reader: Reader<'a>,
    offset: u32,
}

impl<'a> Parser<'a> {
    /// Position a parser at `offset` within `reader`.
    pub fn new(reader: Reader<'a>, offset: u32) -> Self {
        Self { reader, offset }
    }

    /// The underlying reader.
    #[inline]
    pub fn reader(&self) -> Reader<'a> {
        self.reader
    }

    /// Current cursor offset.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Read one byte and advance.
    pub fn get_u8(&mut self) -> Result<u8, FormatError> {
        let (value, next) = self.reader.read_u8(self.offset)?;
        self.offset = next;
        Ok(value)
    }

    /// Read a little-endian `u16` and advance.
    pub fn get_u16(&mut self) -> Result<u16, FormatError> {
        let (value, next) = self.reader.read_u16(self.offset)?;
        self.offset = next;
        Ok(value)
    }

    /// Read a little-endian `u32` and advance.
    pub fn get_u32(&mut self) -> Result<u32, FormatError> {
        let (value, next) = self.reader.read_u32(self.offset)?;
        self.offset = next;
        Ok(value)
    }

    /// Read a little-endian `u64` and advance.
    pub fn get_u64(&mut self) -> Result<u64, FormatError> {
        let (value, next) = self.reader.read_u64(self.offset)?;
        self.offset = next;
        Ok(value)
    }

    /// Read a little-endian `f32` and advance.
    pub fn get_f32(&mut self) -> Result<f32, FormatError> {
        let (value, next) = self.reader.read_f32(self.offset)?;
        self.offset = next;
        Ok(value)
    }

    /// Read a little-endian `f64` and advance.
    pub fn get_f64(&mut self) -> Result<f64, FormatError> {
        let (value, next) = self.reader.read_f64(self.offset)?;
        self.offset = next;
        Ok(value)
    }

    /// Decode an unsigned 32-bit VarInt and advance.
    pub fn get_unsigned(&mut self) -> Result<u32, FormatError> {
        let (value, next) = self.reader.decode_unsigned(self.offset)?;
        self.offset = next;
        Ok(value)
    }

    /// Decode a signed 32-bit VarInt and advance.
    pub fn get_signed(&mut self) -> Result<i32, FormatError> {
        let (value, next) = self.reader.decode_signed(self.offset)?;
        self.offset = next;
        Ok(value)
    }

    /// Decode an unsigned 64-bit VarInt and advance.
    pub fn get_unsigned_long(&mut self) -> Result<u64, FormatError> {
        let (value, next) = self.reader.decode_unsigned_long(self.offset)?;
        self.offset = next;
        Ok(value)
    }

    /// Decode a signed 64-bit VarInt and advance.
    pub fn get_signed_long(&mut self) -> Result<i64, FormatError> {
        let (value, next) = self.reader.decode_signed_long(self.offset)?;
        self.offset = next;
        Ok(value)
    }

    /// Advance past one encoded integer without decoding it.
    pub fn skip_integer(&mut self) -> Result<(), FormatError> {
        self.offset = self.reader.skip_integer(self.offset)?;
        Ok(())
    }

    /// Decode a signed VarInt and resolve it against the offset where the
    /// encoding began, yielding the absolute target offset.
    pub fn get_relative_offset(&mut self) -> Result<u32, FormatError> {
        let base = self.offset;
        let (delta, next) = self.reader.decode_signed(base)?;
        self.offset = next;
        let target = i64::from(base) + i64::from(delta);
        if target < 0 || target > i64::from(self.reader.len()) {
            return Err(FormatError::Malformed);
        }
        Ok(target as u32)
    }

    /// Resolve a relative offset and return a parser positioned at it.
    pub fn get_parser_from_relative_offset(&mut self) -> Result<Parser<'a>, FormatError> {
        let target = self.get_relative_offset()?;
        Ok(Parser::new(self.reader, target))
    }

    /// Read a counted UTF-8 string and advance. Invalid UTF-8 is
    /// [`FormatError::Malformed`].
    pub fn get_string(&mut self) -> Result<&'a str, FormatError> {
        let len = self.get_unsigned()?;
        let bytes = self.reader.bytes_at(self.offset, len)?;
        let s = std::str::from_utf8(bytes).map_err(|_| FormatError::Malformed)?;
        self.offset += len;
        Ok(s)
    }
}
