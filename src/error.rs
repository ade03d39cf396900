//! Error taxonomy for the binary decoders.
//!
//! None of these errors escape [`analyze`](crate::metadata::analyze): each one
//! is absorbed at the boundary of the record, chunk, block or region that
//! raised it, and whatever was decoded before the failure is kept.

use thiserror::Error;

/// A failure while decoding one structure inside an image buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The buffer ends before the structure being read.
    #[error("truncated: need {needed} bytes at offset {offset}, buffer holds {len}")]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },

    /// A signature or magic value did not match at a region boundary.
    #[error("invalid header: {0}")]
    InvalidHeader(&'static str),

    /// A TIFF field type outside the decode table.
    #[error("unsupported field type {0}")]
    UnsupportedEncoding(u16),
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;
