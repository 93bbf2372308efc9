//! Variable-length integer codec.
//!
//! The 32-bit scheme packs a unary length prefix into the low bits of the
//! first byte (not a per-byte continuation bit):
//!
//! | first byte | total bytes | payload bits |
//! |------------|-------------|--------------|
//! | `xxxxxxx0` | 1           | 7            |
//! | `xxxxxx01` | 2           | 14           |
//! | `xxxxx011` | 3           | 21           |
//! | `xxxx0111` | 4           | 28           |
//! | `00001111` | 5           | 32 (raw little-endian `u32`) |
//!
//! Payload bits are packed little-endian-first: the first byte carries the
//! low 7/6/5/4 bits, each following byte the next 8. Signed variants use
//! the identical layout with a sign-extending shift on the final byte.
//!
//! 64-bit values representable in 32 bits reuse the 32-bit scheme. The
//! remainder use first byte `00011111` followed by the raw little-endian
//! `u64` (9 bytes total); a first byte with all five tag bits set is
//! exactly the 9-byte boundary.

use crate::error::FormatError;

/// Append the VarInt encoding of an unsigned 32-bit value.
pub fn write_unsigned(out: &mut Vec<u8>, value: u32) {
    if value < (1 << 7) {
        out.push((value << 1) as u8);
    } else if value < (1 << 14) {
        out.push((value << 2) as u8 | 1);
        out.push((value >> 6) as u8);
    } else if value < (1 << 21) {
        out.push((value << 3) as u8 | 3);
        out.push((value >> 5) as u8);
        out.push((value >> 13) as u8);
    } else if value < (1 << 28) {
        out.push((value << 4) as u8 | 7);
        out.push((value >> 4) as u8);
        out.push((value >> 12) as u8);
        out.push((value >> 20) as u8);
    } else {
        out.push(15);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

/// Append the VarInt encoding of a signed 32-bit value.
pub fn write_signed(out: &mut Vec<u8>, value: i32) {
    let d = value as u32;
    if (-(1 << 6)..(1 << 6)).contains(&value) {
        out.push((d << 1) as u8);
    } else if (-(1 << 13)..(1 << 13)).contains(&value) {
        out.push((d << 2) as u8 | 1);
        out.push((d >> 6) as u8);
    } else if (-(1 << 20)..(1 << 20)).contains(&value) {
        out.push((d << 3) as u8 | 3);
        out.push((d >> 5) as u8);
        out.push((d >> 13) as u8);
    } else if (-(1 << 27)..(1 << 27)).contains(&value) {
        out.push((d << 4) as u8 | 7);
        out.push((d >> 4) as u8);
        out.push((d >> 12) as u8);
        out.push((d >> 20) as u8);
    } else {
        out.push(15);
        out.extend_from_slice(&d.to_le_bytes());
    }
}

/// Append the VarInt encoding of an unsigned 64-bit value.
pub fn write_unsigned_long(out: &mut Vec<u8>, value: u64) {
    if value <= u64::from(u32::MAX) {
        write_unsigned(out, value as u32);
    } else {
        out.push(31);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

/// Append the VarInt encoding of a signed 64-bit value.
pub fn write_signed_long(out: &mut Vec<u8>, value: i64) {
    if i64::from(value as i32) == value {
        write_signed(out, value as i32);
    } else {
        out.push(31);
        out.extend_from_slice(&(value as u64).to_le_bytes());
    }
}

/// Encoded byte length of an unsigned 32-bit value (1-5), without encoding.
///
/// The writer uses this for size estimation during layout.
pub fn unsigned_encoding_size(value: u32) -> u32 {
    if value < (1 << 7) {
        1
    } else if value < (1 << 14) {
        2
    } else if value < (1 << 21) {
        3
    } else if value < (1 << 28) {
        4
    } else {
        5
    }
}

#[inline]
fn byte_at(data: &[u8], offset: usize) -> Result<u8, FormatError> {
    data.get(offset).copied().ok_or(FormatError::Malformed)
}

#[inline]
fn array_at<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], FormatError> {
    let bytes = data
        .get(offset..offset + N)
        .ok_or(FormatError::Malformed)?;
    let mut buf = [0u8; N];
    buf.copy_from_slice(bytes);
    Ok(buf)
}

/// Decode an unsigned 32-bit VarInt, returning `(value, new_offset)`.
///
/// Bounded by the slice end; insufficient bytes are [`FormatError::Malformed`].
pub fn decode_unsigned(data: &[u8], offset: usize) -> Result<(u32, usize), FormatError> {
    let b0 = byte_at(data, offset)?;
    if b0 & 1 == 0 {
        Ok((u32::from(b0 >> 1), offset + 1))
    } else if b0 & 2 == 0 {
        let b: [u8; 2] = array_at(data, offset)?;
        Ok((u32::from(b[0] >> 2) | u32::from(b[1]) << 6, offset + 2))
    } else if b0 & 4 == 0 {
        let b: [u8; 3] = array_at(data, offset)?;
        Ok((
            u32::from(b[0] >> 3) | u32::from(b[1]) << 5 | u32::from(b[2]) << 13,
            offset + 3,
        ))
    } else if b0 & 8 == 0 {
        let b: [u8; 4] = array_at(data, offset)?;
        Ok((
            u32::from(b[0] >> 4)
                | u32::from(b[1]) << 4
                | u32::from(b[2]) << 12
                | u32::from(b[3]) << 20,
            offset + 4,
        ))
    } else if b0 & 16 == 0 {
        let b: [u8; 4] = array_at(data, offset + 1)?;
        Ok((u32::from_le_bytes(b), offset + 5))
    } else {
        Err(FormatError::Malformed)
    }
}

/// Decode a signed 32-bit VarInt, returning `(value, new_offset)`.
///
/// Same layout as the unsigned scheme; the final byte is sign-extended.
pub fn decode_signed(data: &[u8], offset: usize) -> Result<(i32, usize), FormatError> {
    let b0 = byte_at(data, offset)?;
    if b0 & 1 == 0 {
        Ok((i32::from((b0 as i8) >> 1), offset + 1))
    } else if b0 & 2 == 0 {
        let b: [u8; 2] = array_at(data, offset)?;
        Ok((i32::from(b[0] >> 2) | i32::from(b[1] as i8) << 6, offset + 2))
    } else if b0 & 4 == 0 {
        let b: [u8; 3] = array_at(data, offset)?;
        Ok((
            i32::from(b[0] >> 3) | i32::from(b[1]) << 5 | i32::from(b[2] as i8) << 13,
            offset + 3,
        ))
    } else if b0 & 8 == 0 {
        let b: [u8; 4] = array_at(data, offset)?;
        Ok((
            i32::from(b[0] >> 4)
                | i32::from(b[1]) << 4
                | i32::from(b[2]) << 12
                | i32::from(b[3] as i8) << 20,
            offset + 4,
        ))
    } else if b0 & 16 == 0 {
        let b: [u8; 4] = array_at(data, offset + 1)?;
        Ok((i32::from_le_bytes(b), offset + 5))
    } else {
        Err(FormatError::Malformed)
    }
}

/// Decode an unsigned 64-bit VarInt, returning `(value, new_offset)`.
pub fn decode_unsigned_long(data: &[u8], offset: usize) -> Result<(u64, usize), FormatError> {
    let b0 = byte_at(data, offset)?;
    if b0 & 31 != 31 {
        let (value, next) = decode_unsigned(data, offset)?;
        Ok((u64::from(value), next))
    } else {
        let b: [u8; 8] = array_at(data, offset + 1)?;
        Ok((u64::from_le_bytes(b), offset + 9))
    }
}

/// Decode a signed 64-bit VarInt, returning `(value, new_offset)`.
pub fn decode_signed_long(data: &[u8], offset: usize) -> Result<(i64, usize), FormatError> {
    let b0 = byte_at(data, offset)?;
    if b0 & 31 != 31 {
        let (value, next) = decode_signed(data, offset)?;
        Ok((i64::from(value), next))
    } else {
        let b: [u8; 8] = array_at(data, offset + 1)?;
        Ok((i64::from_le_bytes(b), offset + 9))
    }
}

/// Advance past one encoded integer without decoding it.
pub fn skip_integer(data: &[u8], offset: usize) -> Result<usize, FormatError> {
    let b0 = byte_at(data, offset)?;
    let len = if b0 & 1 == 0 {
        1
    } else if b0 & 2 == 0 {
        2
    } else if b0 & 4 == 0 {
        3
    } else if b0 & 8 == 0 {
        4
    } else if b0 & 16 == 0 {
        5
    } else {
        9
    };
    let next = offset + len;
    if next > data.len() {
        return Err(FormatError::Malformed);
    }
    Ok(next)
}
