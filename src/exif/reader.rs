use crate::error::{ParseError, ParseResult};
use crate::metadata::MetadataEntry;

use super::bytes::{self, ByteOrder};
use super::gps::{self, GpsCoordinate};
use super::tags::{self, TagNamespace};

const TIFF_MAGIC: u16 = 42;
const IFD_ENTRY_LEN: usize = 12;

// TIFF field types
const TYPE_BYTE: u16 = 1;
const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;
const TYPE_UNDEFINED: u16 = 7;
const TYPE_SLONG: u16 = 9;
const TYPE_SRATIONAL: u16 = 10;
const TYPE_IFD: u16 = 13;

// Multi-value caps per type
const MAX_BYTES: usize = 32;
const MAX_SHORTS: usize = 16;
const MAX_LONGS: usize = 8;
const MAX_RATIONALS: usize = 8;
// ASCII values are capped at 500 characters later; no need to read more.
const MAX_ASCII_READ: usize = 2048;

/// Entries and GPS fields decoded from one TIFF region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TiffMetadata {
    pub entries: Vec<MetadataEntry>,
    pub gps: GpsCoordinate,
}

/// Size in bytes of one element of a TIFF field type.
fn type_size(field_type: u16) -> ParseResult<usize> {
    match field_type {
        TYPE_BYTE | TYPE_ASCII | TYPE_UNDEFINED => Ok(1),
        TYPE_SHORT => Ok(2),
        TYPE_LONG | TYPE_SLONG => Ok(4),
        TYPE_RATIONAL | TYPE_SRATIONAL => Ok(8),
        other => Err(ParseError::UnsupportedEncoding(other)),
    }
}

/// A raw 12-byte directory entry.
#[derive(Debug, Clone, Copy)]
struct IfdEntry {
    tag: u16,
    field_type: u16,
    count: u32,
    value_offset: u32,
    /// Position of the entry itself inside the region.
    position: usize,
}

#[derive(Debug, Default)]
struct Ifd {
    entries: Vec<IfdEntry>,
    next: Option<usize>,
}

impl Ifd {
    /// Offset stored in a sub-IFD pointer tag, if present.
    fn pointer(&self, tag: u16) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.tag == tag && matches!(e.field_type, TYPE_LONG | TYPE_IFD))
            .map(|e| e.value_offset as usize)
    }
}

/// A TIFF region: offsets inside it are relative to its first byte.
struct TiffRegion<'a> {
    data: &'a [u8],
    order: ByteOrder,
}

/// Decode the TIFF structure beginning at `start` in `buf`.
///
/// Header failures (bad byte-order marker, wrong magic, unreadable root
/// directory) abort the region. Failures inside a single entry or sub-IFD
/// only drop that entry or sub-IFD.
pub fn decode_tiff(buf: &[u8], start: usize) -> ParseResult<TiffMetadata> {
    let data = buf.get(start..).ok_or(ParseError::Truncated {
        offset: start,
        needed: 8,
        len: buf.len(),
    })?;

    let order = ByteOrder::from_marker(bytes::slice(data, 0, 2)?)
        .ok_or(ParseError::InvalidHeader("TIFF byte order"))?;
    if bytes::read_u16(data, 2, order)? != TIFF_MAGIC {
        return Err(ParseError::InvalidHeader("TIFF magic"));
    }
    let ifd0_offset = bytes::read_u32(data, 4, order)? as usize;

    let region = TiffRegion { data, order };
    let root = region.read_ifd(ifd0_offset)?;

    let mut out = TiffMetadata::default();
    out.entries
        .extend(region.decode_entries(&root, TagNamespace::Root, ""));

    if let Some(offset) = root.pointer(tags::TAG_EXIF_IFD_POINTER) {
        match region.read_ifd(offset) {
            Ok(ifd) => out
                .entries
                .extend(region.decode_entries(&ifd, TagNamespace::Exif, "")),
            Err(e) => log::debug!("EXIF IFD at {offset} unreadable: {e}"),
        }
    }

    if let Some(offset) = root.pointer(tags::TAG_GPS_IFD_POINTER) {
        match region.read_ifd(offset) {
            Ok(ifd) => {
                let (entries, coordinate) = region.decode_gps(&ifd);
                out.entries.extend(entries);
                out.gps = coordinate;
            }
            Err(e) => log::debug!("GPS IFD at {offset} unreadable: {e}"),
        }
    }

    // IFD1 describes the embedded thumbnail
    if let Some(offset) = root.next.filter(|&o| o != ifd0_offset) {
        match region.read_ifd(offset) {
            Ok(ifd) => out
                .entries
                .extend(region.decode_entries(&ifd, TagNamespace::Root, "Thumbnail")),
            Err(e) => log::debug!("IFD1 at {offset} unreadable: {e}"),
        }
    }

    Ok(out)
}

impl TiffRegion<'_> {
    /// Read a directory. Only an unreadable entry count is an error; a
    /// directory cut short keeps the entries read before the cut.
    fn read_ifd(&self, offset: usize) -> ParseResult<Ifd> {
        let count = bytes::read_u16(self.data, offset, self.order)? as usize;
        let first = offset.saturating_add(2);

        let mut ifd = Ifd::default();
        for i in 0..count {
            let position = first.saturating_add(i * IFD_ENTRY_LEN);
            match self.read_entry(position) {
                Ok(entry) => ifd.entries.push(entry),
                Err(e) => {
                    log::debug!("IFD at {offset} cut after {i} of {count} entries: {e}");
                    return Ok(ifd);
                }
            }
        }

        let next_at = first.saturating_add(count * IFD_ENTRY_LEN);
        ifd.next = bytes::read_u32(self.data, next_at, self.order)
            .ok()
            .filter(|&n| n != 0)
            .map(|n| n as usize);
        Ok(ifd)
    }

    fn read_entry(&self, position: usize) -> ParseResult<IfdEntry> {
        let raw = bytes::slice(self.data, position, IFD_ENTRY_LEN)?;
        Ok(IfdEntry {
            tag: bytes::read_u16(raw, 0, self.order)?,
            field_type: bytes::read_u16(raw, 2, self.order)?,
            count: bytes::read_u32(raw, 4, self.order)?,
            value_offset: bytes::read_u32(raw, 8, self.order)?,
            position,
        })
    }

    /// Where the value bytes of `entry` start: inline in the entry when the
    /// whole value fits in four bytes, otherwise at the stored offset.
    fn value_base(&self, entry: &IfdEntry) -> ParseResult<usize> {
        let unit = type_size(entry.field_type)?;
        let span = unit.saturating_mul(entry.count as usize);
        Ok(if span <= 4 {
            entry.position + 8
        } else {
            entry.value_offset as usize
        })
    }

    fn decode_entries(
        &self,
        ifd: &Ifd,
        namespace: TagNamespace,
        prefix: &str,
    ) -> Vec<MetadataEntry> {
        ifd.entries
            .iter()
            .filter(|e| {
                namespace != TagNamespace::Root
                    || !matches!(e.tag, tags::TAG_EXIF_IFD_POINTER | tags::TAG_GPS_IFD_POINTER)
            })
            .filter_map(|e| self.generic_entry(e, namespace, prefix))
            .collect()
    }

    fn generic_entry(
        &self,
        entry: &IfdEntry,
        namespace: TagNamespace,
        prefix: &str,
    ) -> Option<MetadataEntry> {
        match self.decode_value(entry) {
            Ok(value) if !value.is_empty() => {
                let info = tags::resolve(namespace, entry.tag);
                Some(MetadataEntry::new(
                    format!("{prefix}{}", info.name),
                    value,
                    info.category,
                ))
            }
            Ok(_) => None,
            Err(e) => {
                log::debug!("skipping tag 0x{:04x}: {e}", entry.tag);
                None
            }
        }
    }

    fn decode_gps(&self, ifd: &Ifd) -> (Vec<MetadataEntry>, GpsCoordinate) {
        let mut entries = Vec::new();
        let mut coordinate = GpsCoordinate::default();

        for entry in &ifd.entries {
            match entry.tag {
                tags::TAG_GPS_LATITUDE_REF | tags::TAG_GPS_LONGITUDE_REF => {
                    let Some(reference) = self.read_reference(entry) else {
                        continue;
                    };
                    if entry.tag == tags::TAG_GPS_LATITUDE_REF {
                        coordinate.latitude_ref = Some(reference);
                    } else {
                        coordinate.longitude_ref = Some(reference);
                    }
                    let info = tags::resolve(TagNamespace::Gps, entry.tag);
                    let value = reference.to_string();
                    entries.push(MetadataEntry::new(info.name, value, info.category));
                }
                tags::TAG_GPS_LATITUDE | tags::TAG_GPS_LONGITUDE => {
                    if entry.count != 3 || entry.field_type != TYPE_RATIONAL {
                        log::debug!(
                            "ignoring GPS tag 0x{:04x} with type {} count {}",
                            entry.tag,
                            entry.field_type,
                            entry.count
                        );
                        continue;
                    }
                    let degrees = match self.read_dms(entry) {
                        Ok(dms) => gps::dms_to_decimal(dms),
                        Err(e) => {
                            log::debug!("skipping GPS tag 0x{:04x}: {e}", entry.tag);
                            continue;
                        }
                    };
                    if entry.tag == tags::TAG_GPS_LATITUDE {
                        coordinate.latitude = Some(degrees);
                    } else {
                        coordinate.longitude = Some(degrees);
                    }
                    let info = tags::resolve(TagNamespace::Gps, entry.tag);
                    let value = format!("{degrees:.6}");
                    entries.push(MetadataEntry::new(info.name, value, info.category));
                }
                _ => entries.extend(self.generic_entry(entry, TagNamespace::Gps, "")),
            }
        }

        (entries, coordinate)
    }

    /// First character of a single-character ASCII reference (`N`, `S`, `E`, `W`).
    fn read_reference(&self, entry: &IfdEntry) -> Option<char> {
        if entry.field_type != TYPE_ASCII || entry.count == 0 {
            return None;
        }
        let base = self.value_base(entry).ok()?;
        match bytes::read_u8(self.data, base) {
            Ok(0) | Err(_) => None,
            Ok(b) => Some(b as char),
        }
    }

    fn read_dms(&self, entry: &IfdEntry) -> ParseResult<[(u32, u32); 3]> {
        let base = self.value_base(entry)?;
        let mut dms = [(0, 0); 3];
        for (i, part) in dms.iter_mut().enumerate() {
            *part = bytes::read_rational(self.data, base.saturating_add(i * 8), self.order)?;
        }
        Ok(dms)
    }

    /// Render an entry's value as text per its field type.
    fn decode_value(&self, entry: &IfdEntry) -> ParseResult<String> {
        let base = self.value_base(entry)?;
        let count = entry.count as usize;
        let (data, order) = (self.data, self.order);

        match entry.field_type {
            TYPE_BYTE | TYPE_UNDEFINED => join(base, count, MAX_BYTES, 1, |at| {
                bytes::read_u8(data, at).map(|v| v.to_string())
            }),
            TYPE_ASCII => {
                let readable = count.saturating_sub(1).min(MAX_ASCII_READ);
                let raw = bytes::slice(data, base, readable)?;
                let text: String = raw
                    .iter()
                    .take_while(|&&b| b != 0)
                    .map(|&b| b as char)
                    .collect();
                Ok(text.trim_end().to_string())
            }
            TYPE_SHORT => join(base, count, MAX_SHORTS, 2, |at| {
                bytes::read_u16(data, at, order).map(|v| v.to_string())
            }),
            TYPE_LONG => join(base, count, MAX_LONGS, 4, |at| {
                bytes::read_u32(data, at, order).map(|v| v.to_string())
            }),
            TYPE_SLONG => join(base, count, MAX_LONGS, 4, |at| {
                bytes::read_i32(data, at, order).map(|v| v.to_string())
            }),
            TYPE_RATIONAL => join(base, count, MAX_RATIONALS, 8, |at| {
                let (num, den) = bytes::read_rational(data, at, order)?;
                Ok(format_ratio(num as f64, den as f64))
            }),
            TYPE_SRATIONAL => join(base, count, MAX_RATIONALS, 8, |at| {
                let (num, den) = bytes::read_srational(data, at, order)?;
                Ok(format_ratio(num as f64, den as f64))
            }),
            other => Err(ParseError::UnsupportedEncoding(other)),
        }
    }
}

/// Read up to `cap` elements of `unit` bytes and comma-join them.
fn join(
    base: usize,
    count: usize,
    cap: usize,
    unit: usize,
    read: impl Fn(usize) -> ParseResult<String>,
) -> ParseResult<String> {
    let parts = (0..count.min(cap))
        .map(|i| read(base.saturating_add(i * unit)))
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(parts.join(", "))
}

fn format_ratio(num: f64, den: f64) -> String {
    if den == 0.0 {
        "0".to_string()
    } else {
        format_decimal(num / den)
    }
}

/// Fixed six-decimal rendering with trailing zeros trimmed (`2.8`, `72`).
pub fn format_decimal(value: f64) -> String {
    let s = format!("{value:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}
