//! Container detection and the four format walkers.
//!
//! Each walker checks its own signature, walks its segment/chunk/block
//! structure and returns an [`Extraction`]. A walker only fails for a bad
//! signature; damage further in stops the walk and keeps what was read.

pub mod gif;
pub mod jpeg;
pub mod png;
pub mod webp;

use serde::Serialize;

use crate::error::ParseResult;
use crate::exif::{self, GpsCoordinate};
use crate::metadata::{Category, MetadataEntry};

/// The container formats the engine can walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContainerKind {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl ContainerKind {
    /// Match the buffer's signature, trying JPEG, PNG, WebP, then GIF.
    pub fn detect(buffer: &[u8]) -> Option<Self> {
        if jpeg::is_jpeg(buffer) {
            Some(Self::Jpeg)
        } else if png::is_png(buffer) {
            Some(Self::Png)
        } else if webp::is_webp(buffer) {
            Some(Self::WebP)
        } else if gif::is_gif(buffer) {
            Some(Self::Gif)
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::WebP => "WebP",
            Self::Gif => "GIF",
        }
    }
}

/// What one walker produced: entries in decode order plus any GPS fields
/// found in embedded TIFF blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub entries: Vec<MetadataEntry>,
    pub gps: GpsCoordinate,
}

impl Extraction {
    pub(crate) fn push(&mut self, tag: &str, value: impl Into<String>, category: Category) {
        self.entries.push(MetadataEntry::new(tag, value, category));
    }

    /// Decode an embedded TIFF block at `start` and merge it. A malformed
    /// block is logged and dropped; entries collected so far stay.
    pub(crate) fn absorb_tiff(&mut self, buffer: &[u8], start: usize) {
        match exif::decode_tiff(buffer, start) {
            Ok(tiff) => {
                self.entries.extend(tiff.entries);
                self.gps.merge(tiff.gps);
            }
            Err(e) => log::debug!("embedded TIFF block at {start} skipped: {e}"),
        }
    }
}

/// Run the walker for `kind`. A signature failure yields an empty extraction.
pub fn extract(kind: ContainerKind, buffer: &[u8]) -> Extraction {
    let result: ParseResult<Extraction> = match kind {
        ContainerKind::Jpeg => jpeg::walk(buffer),
        ContainerKind::Png => png::walk(buffer),
        ContainerKind::WebP => webp::walk(buffer),
        ContainerKind::Gif => gif::walk(buffer),
    };
    match result {
        Ok(mut extraction) => {
            extraction.entries.insert(
                0,
                MetadataEntry::new("Format", kind.name(), Category::Image),
            );
            extraction
        }
        Err(e) => {
            log::warn!("{} header rejected: {e}", kind.name());
            Extraction::default()
        }
    }
}

/// `Yes`/`No` rendering used for flag entries.
pub(crate) fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}
