//! Bucketed hash index reader.
//!
//! Layout at a parser position:
//! - one header byte: `(bucket_shift << 2) | entry_index_size_code`, with
//!   size code 0/1/2 selecting 1/2/4-byte bucket boundaries;
//! - `bucket_count + 1` fixed-width boundary offsets, relative to just
//!   past the header byte, delimiting each bucket's entry range;
//! - entries: one byte holding the low 8 bits of the full hashcode, then
//!   a signed VarInt relative offset to the payload.
//!
//! Entries within a bucket are sorted ascending by low byte, so a lookup
//! can stop at the first strictly greater low byte.

use crate::error::FormatError;
use crate::parser::Parser;
use crate::reader::Reader;

/// Reader-side view of a serialized hash index.
#[derive(Clone, Copy, Debug)]
pub struct Hashtable<'a> {
    reader: Reader<'a>,
    /// Offset just past the header byte; bucket boundaries are relative to it.
    base_offset: u32,
    bucket_mask: u32,
    /// Boundary width code: 0/1/2 for 1/2/4 bytes.
    entry_index_size: u8,
}

impl<'a> Hashtable<'a> {
    /// Parse the header byte at the parser's position. The parser is left
    /// just past it.
    pub fn new(parser: &mut Parser<'a>) -> Result<Self, FormatError> {
        let header = parser.get_u8()?;
        let bucket_shift = u32::from(header >> 2);
        if bucket_shift > 31 {
            return Err(FormatError::Malformed);
        }
        let entry_index_size = header & 3;
        if entry_index_size > 2 {
            return Err(FormatError::Malformed);
        }
        Ok(Self {
            reader: parser.reader(),
            base_offset: parser.offset(),
            bucket_mask: (1u32 << bucket_shift) - 1,
            entry_index_size,
        })
    }

    /// Number of buckets (`2^bucket_shift`).
    pub fn bucket_count(&self) -> u32 {
        self.bucket_mask.wrapping_add(1)
    }

    /// Absolute offset of boundary slot `slot`.
    fn slot_offset(&self, slot: u32) -> Result<u32, FormatError> {
        let at = u64::from(self.base_offset) + (u64::from(slot) << self.entry_index_size);
        u32::try_from(at).map_err(|_| FormatError::Malformed)
    }

    /// Absolute `(start, end)` of a bucket's entry range.
    fn bucket_range(&self, bucket: u32) -> Result<(u32, u32), FormatError> {
        let (start, end) = match self.entry_index_size {
            0 => {
                let (s, next) = self.reader.read_u8(self.slot_offset(bucket)?)?;
                let (e, _) = self.reader.read_u8(next)?;
                (u32::from(s), u32::from(e))
            }
            1 => {
                let (s, next) = self.reader.read_u16(self.slot_offset(bucket)?)?;
                let (e, _) = self.reader.read_u16(next)?;
                (u32::from(s), u32::from(e))
            }
            _ => {
                let (s, next) = self.reader.read_u32(self.slot_offset(bucket)?)?;
                let (e, _) = self.reader.read_u32(next)?;
                (s, e)
            }
        };
        let start = self
            .base_offset
            .checked_add(start)
            .ok_or(FormatError::Malformed)?;
        let end = self
            .base_offset
            .checked_add(end)
            .ok_or(FormatError::Malformed)?;
        Ok((start, end))
    }

    /// Point lookup: a cursor over the entries of `hashcode`'s bucket that
    /// share its low byte.
    ///
    /// Low-byte matches are a pre-filter; callers must still verify the
    /// full hashcode against the payload.
    pub fn lookup(&self, hashcode: u32) -> Result<LookupCursor<'a>, FormatError> {
        let bucket = (hashcode >> 8) & self.bucket_mask;
        let (start, end) = self.bucket_range(bucket)?;
        Ok(LookupCursor {
            parser: Parser::new(self.reader, start),
            end_offset: end,
            low_hashcode: hashcode as u8,
        })
    }

    /// Walk every bucket in order, yielding every entry exactly once.
    pub fn all_entries(&self) -> AllEntriesCursor<'a> {
        AllEntriesCursor {
            table: *self,
            bucket: 0,
            parser: Parser::new(self.reader, self.base_offset),
            end_offset: 0,
        }
    }
}

/// Stateful point-lookup cursor returned by [`Hashtable::lookup`].
#[derive(Clone, Copy, Debug)]
pub struct LookupCursor<'a> {
    parser: Parser<'a>,
    end_offset: u32,
    low_hashcode: u8,
}

impl<'a> LookupCursor<'a> {
    /// Next entry whose low byte matches, as a parser positioned at its
    /// payload, or `None` once the bucket ends or a greater low byte is
    /// seen.
    pub fn next_match(&mut self) -> Result<Option<Parser<'a>>, FormatError> {
        while self.parser.offset() < self.end_offset {
            let low = self.parser.get_u8()?;
            if low == self.low_hashcode {
                return self.parser.get_parser_from_relative_offset().map(Some);
            }
            if low > self.low_hashcode {
                break;
            }
            self.parser.skip_integer()?;
        }
        self.end_offset = 0;
        Ok(None)
    }
}

/// Full-scan cursor returned by [`Hashtable::all_entries`].
#[derive(Clone, Copy, Debug)]
pub struct AllEntriesCursor<'a> {
    table: Hashtable<'a>,
    bucket: u32,
    parser: Parser<'a>,
    end_offset: u32,
}

impl<'a> AllEntriesCursor<'a> {
    /// Next entry's payload parser, or `None` after the last bucket.
    pub fn next_entry(&mut self) -> Result<Option<Parser<'a>>, FormatError> {
        loop {
            if self.parser.offset() < self.end_offset {
                self.parser.get_u8()?;
                return self.parser.get_parser_from_relative_offset().map(Some);
            }
            if self.bucket >= self.table.bucket_count() {
                return Ok(None);
            }
            let (start, end) = self.table.bucket_range(self.bucket)?;
            self.parser = Parser::new(self.table.reader, start);
            self.end_offset = end;
            self.bucket += 1;
        }
    }
}
