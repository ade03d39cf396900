//! Bounds-checked primitive reads over a byte buffer.
//!
//! Every read verifies `offset + width <= buffer.len()` before touching the
//! buffer and reports [`ParseError::Truncated`] otherwise.

use crate::error::{ParseError, ParseResult};

/// Byte order of a TIFF region (or of a container's fixed fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// Decode a TIFF byte-order marker (`II` or `MM`).
    pub fn from_marker(marker: &[u8]) -> Option<Self> {
        match marker {
            b"II" => Some(Self::LittleEndian),
            b"MM" => Some(Self::BigEndian),
            _ => None,
        }
    }
}

/// Borrow `len` bytes starting at `offset`.
pub fn slice(buf: &[u8], offset: usize, len: usize) -> ParseResult<&[u8]> {
    let end = offset.checked_add(len).ok_or(ParseError::Truncated {
        offset,
        needed: len,
        len: buf.len(),
    })?;
    buf.get(offset..end).ok_or(ParseError::Truncated {
        offset,
        needed: len,
        len: buf.len(),
    })
}

fn array<const N: usize>(buf: &[u8], offset: usize) -> ParseResult<[u8; N]> {
    let bytes = slice(buf, offset, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

pub fn read_u8(buf: &[u8], offset: usize) -> ParseResult<u8> {
    buf.get(offset).copied().ok_or(ParseError::Truncated {
        offset,
        needed: 1,
        len: buf.len(),
    })
}

pub fn read_u16(buf: &[u8], offset: usize, order: ByteOrder) -> ParseResult<u16> {
    let b = array::<2>(buf, offset)?;
    Ok(match order {
        ByteOrder::LittleEndian => u16::from_le_bytes(b),
        ByteOrder::BigEndian => u16::from_be_bytes(b),
    })
}

/// 24-bit unsigned field, as used by WebP's `VP8X` and `ANMF` chunks.
pub fn read_u24(buf: &[u8], offset: usize, order: ByteOrder) -> ParseResult<u32> {
    let [a, b, c] = array::<3>(buf, offset)?;
    Ok(match order {
        ByteOrder::LittleEndian => u32::from_le_bytes([a, b, c, 0]),
        ByteOrder::BigEndian => u32::from_be_bytes([0, a, b, c]),
    })
}

pub fn read_u32(buf: &[u8], offset: usize, order: ByteOrder) -> ParseResult<u32> {
    let b = array::<4>(buf, offset)?;
    Ok(match order {
        ByteOrder::LittleEndian => u32::from_le_bytes(b),
        ByteOrder::BigEndian => u32::from_be_bytes(b),
    })
}

pub fn read_i32(buf: &[u8], offset: usize, order: ByteOrder) -> ParseResult<i32> {
    let b = array::<4>(buf, offset)?;
    Ok(match order {
        ByteOrder::LittleEndian => i32::from_le_bytes(b),
        ByteOrder::BigEndian => i32::from_be_bytes(b),
    })
}

/// Unsigned rational: numerator then denominator.
pub fn read_rational(buf: &[u8], offset: usize, order: ByteOrder) -> ParseResult<(u32, u32)> {
    let num = read_u32(buf, offset, order)?;
    let den = read_u32(buf, offset.saturating_add(4), order)?;
    Ok((num, den))
}

/// Signed rational: numerator then denominator.
pub fn read_srational(buf: &[u8], offset: usize, order: ByteOrder) -> ParseResult<(i32, i32)> {
    let num = read_i32(buf, offset, order)?;
    let den = read_i32(buf, offset.saturating_add(4), order)?;
    Ok((num, den))
}
