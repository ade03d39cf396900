//! TIFF/EXIF decoding.
//!
//! - [`bytes`]: bounds-checked primitive reads in either byte order
//! - [`tags`]: tag names and categories for the root, EXIF and GPS directories
//! - [`decode_tiff`]: walk a TIFF region into entries plus a [`GpsCoordinate`]
//!
//! A TIFF region is the same whether it comes from a JPEG `APP1` segment, a
//! WebP `EXIF` chunk or a PNG `eXIf` chunk; the container walkers locate it
//! and hand over its start offset.

pub mod bytes;
mod gps;
mod reader;
pub mod tags;

pub use bytes::ByteOrder;
pub use gps::{Coordinates, GpsCoordinate, dms_to_decimal};
pub use reader::{TiffMetadata, decode_tiff};

pub(crate) use reader::format_decimal;
