//! Metadata entries and the aggregator that turns one buffer into a [`Report`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::container::{self, ContainerKind};
use crate::exif::Coordinates;

/// Maximum length (in characters) of an entry value.
pub const MAX_VALUE_CHARS: usize = 500;

/// Presentation group of an entry. Groups are displayed in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    File,
    Image,
    Camera,
    #[serde(rename = "Date/Time")]
    DateTime,
    Author,
    #[serde(rename = "EXIF")]
    Exif,
    #[serde(rename = "GPS")]
    Gps,
    Text,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Self::File => "File",
            Self::Image => "Image",
            Self::Camera => "Camera",
            Self::DateTime => "Date/Time",
            Self::Author => "Author",
            Self::Exif => "EXIF",
            Self::Gps => "GPS",
            Self::Text => "Text",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One `(tag, value, category)` triple. The value is capped at
/// [`MAX_VALUE_CHARS`] characters when the entry is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataEntry {
    tag: String,
    value: String,
    category: Category,
}

impl MetadataEntry {
    pub fn new(tag: impl Into<String>, value: impl Into<String>, category: Category) -> Self {
        let value = value.into();
        let value = match value.char_indices().nth(MAX_VALUE_CHARS) {
            Some((cut, _)) => value[..cut].to_string(),
            None => value,
        };
        Self {
            tag: tag.into(),
            value,
            category,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

/// Container-independent attributes supplied by the caller, never read from
/// the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAttributes {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub modified: Option<DateTime<Local>>,
}

impl FileAttributes {
    /// The four `File` entries, in fixed order.
    pub fn to_entries(&self) -> Vec<MetadataEntry> {
        let modified = self
            .modified
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        vec![
            MetadataEntry::new("FileName", &self.name, Category::File),
            MetadataEntry::new("FileSize", format_size(self.size), Category::File),
            MetadataEntry::new("MimeType", &self.mime_type, Category::File),
            MetadataEntry::new("LastModified", modified, Category::File),
        ]
    }
}

fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} bytes")
    } else if b < KB * KB {
        format!("{:.1} KB ({bytes} bytes)", b / KB)
    } else {
        format!("{:.1} MB ({bytes} bytes)", b / (KB * KB))
    }
}

/// Everything extracted from one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Detected container, `None` when no signature matched.
    pub format: Option<ContainerKind>,
    /// File attributes first, then container and embedded metadata in decode order.
    pub entries: Vec<MetadataEntry>,
    /// Signed GPS position, present only for a complete GPS record.
    pub coordinates: Option<Coordinates>,
}

impl Report {
    /// Entries grouped by category. Groups follow [`Category`] order; entries
    /// keep their decode order inside each group.
    pub fn grouped(&self) -> Vec<(Category, Vec<&MetadataEntry>)> {
        let mut groups: BTreeMap<Category, Vec<&MetadataEntry>> = BTreeMap::new();
        for entry in &self.entries {
            groups.entry(entry.category()).or_default().push(entry);
        }
        groups.into_iter().collect()
    }

    /// First entry with the given tag.
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.tag() == tag)
            .map(MetadataEntry::value)
    }
}

/// Parse `buffer` and merge the result with the caller's file attributes.
///
/// Never fails: an unrecognised or damaged buffer yields the file attributes
/// plus whatever could be decoded before the damage.
pub fn analyze(buffer: &[u8], attributes: &FileAttributes) -> Report {
    let mut entries = attributes.to_entries();

    let format = ContainerKind::detect(buffer);
    let coordinates = match format {
        Some(kind) => {
            log::debug!("{}: detected {}", attributes.name, kind.name());
            let extraction = container::extract(kind, buffer);
            entries.extend(extraction.entries);
            extraction.gps.signed()
        }
        None => {
            log::debug!("{}: no known container signature", attributes.name);
            None
        }
    };

    Report {
        format,
        entries,
        coordinates,
    }
}
