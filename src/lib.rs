//! # pixmeta
//!
//! Image metadata inspection: identify a JPEG, PNG, WebP or GIF container from its
//! bytes, walk its segments/chunks/blocks, and decode any embedded TIFF/EXIF record
//! (including the GPS directory) into a flat list of categorized entries.
//!
//! ## Quick Start
//!
//! The simplest way to use the library is through the pipeline module, which handles
//! file I/O and attribute collection:
//!
//! ```rust,no_run
//! use pixmeta::config::Config;
//! use pixmeta::pipeline::{collect_images, inspect_file};
//! use std::path::PathBuf;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!
//!     // Collect supported image files from paths (files or directories)
//!     let images = collect_images(&[PathBuf::from("./photos")], &config.scan);
//!
//!     for path in &images {
//!         let report = inspect_file(path)?;
//!         println!("{}: {:?}", path.display(), report.format);
//!         for (category, entries) in report.grouped() {
//!             println!("  [{category}]");
//!             for entry in entries {
//!                 println!("    {} = {}", entry.tag(), entry.value());
//!             }
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Lower-Level Usage
//!
//! [`metadata::analyze`] works on an in-memory buffer and never fails. The
//! container walkers and the TIFF decoder are available individually:
//!
//! ```rust
//! use pixmeta::container::{self, ContainerKind};
//! use pixmeta::metadata::{analyze, FileAttributes};
//!
//! let gif = b"GIF89a\x02\x00\x02\x00\x00\x00\x00\x3b";
//! assert_eq!(ContainerKind::detect(gif), Some(ContainerKind::Gif));
//!
//! let extraction = container::extract(ContainerKind::Gif, gif);
//! assert_eq!(extraction.entries[0].value(), "GIF");
//!
//! let attributes = FileAttributes {
//!     name: "tiny.gif".into(),
//!     size: gif.len() as u64,
//!     mime_type: "image/gif".into(),
//!     modified: None,
//! };
//! let report = analyze(gif, &attributes);
//! assert_eq!(report.get("ImageWidth"), Some("2"));
//! assert!(report.coordinates.is_none());
//! ```
//!
//! ## Supported Formats
//!
//! | Format | Walked structures |
//! |--------|-------------------|
//! | JPEG | SOF dimensions, APP0 JFIF, APP1 EXIF/XMP, APP2 ICC, APP13 Photoshop, COM |
//! | PNG | IHDR, text chunks, eXIf, pHYs, tIME, gAMA, sRGB, iCCP, acTL |
//! | WebP | VP8/VP8L/VP8X, EXIF, ICCP, XMP, ANIM/ANMF |
//! | GIF | Screen descriptor, graphic control, comments, application blocks, frames |
//!
//! ## Modules
//!
//! - [`container`]: format detection and the four container walkers
//! - [`exif`]: bounds-checked reads, tag dictionary, TIFF/IFD and GPS decoding
//! - [`metadata`]: entry types, categories and report aggregation
//! - [`pipeline`]: file inspection, image collection, metadata stripping
//! - [`config`]: configuration types and loading/saving
//! - [`error`]: parse error taxonomy

pub mod config;
pub mod container;
pub mod error;
pub mod exif;
pub mod metadata;
pub mod pipeline;

#[doc(hidden)]
pub mod test_support;

pub use container::ContainerKind;
pub use error::{ParseError, ParseResult};
pub use metadata::{Category, FileAttributes, MetadataEntry, Report, analyze};
