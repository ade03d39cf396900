//! JPEG marker-segment walker.

use crate::error::{ParseError, ParseResult};
use crate::exif::bytes::{self, ByteOrder};
use crate::metadata::Category;

use super::Extraction;

const SOI: [u8; 2] = [0xFF, 0xD8];

// Marker codes (second byte after 0xFF)
const TEM: u8 = 0x01;
const SOF0: u8 = 0xC0;
const SOF1: u8 = 0xC1;
const SOF2: u8 = 0xC2;
const RST0: u8 = 0xD0;
const SOI_MARKER: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;
const APP2: u8 = 0xE2;
const APP13: u8 = 0xED;
const COM: u8 = 0xFE;

const XMP_NAMESPACE: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const ICC_SIGNATURE: &[u8] = b"ICC_PROFILE\0";
const PHOTOSHOP_SIGNATURE: &[u8] = b"Photoshop 3.0\0";

pub fn is_jpeg(buf: &[u8]) -> bool {
    buf.starts_with(&SOI)
}

/// Walk the marker segments up to EOI or the start of scan data.
pub fn walk(buf: &[u8]) -> ParseResult<Extraction> {
    if !is_jpeg(buf) {
        return Err(ParseError::InvalidHeader("JPEG start-of-image marker"));
    }

    let mut out = Extraction::default();
    let mut icc_bytes = 0usize;
    let mut offset = SOI.len();

    loop {
        let (Ok(prefix), Ok(marker)) =
            (bytes::read_u8(buf, offset), bytes::read_u8(buf, offset + 1))
        else {
            break;
        };
        if prefix != 0xFF {
            log::debug!("JPEG: expected marker at {offset}, found 0x{prefix:02x}");
            break;
        }

        match marker {
            // fill byte before the real marker
            0xFF => {
                offset += 1;
                continue;
            }
            EOI => break,
            TEM | RST0..=SOI_MARKER => {
                offset += 2;
                continue;
            }
            _ => {}
        }

        // `segment_start` is the position of the length field
        let segment_start = offset + 2;
        let length = match bytes::read_u16(buf, segment_start, ByteOrder::BigEndian) {
            Ok(len) if len >= 2 => len as usize,
            Ok(len) => {
                log::debug!("JPEG: marker 0x{marker:02x} declares invalid length {len}");
                break;
            }
            Err(e) => {
                log::debug!("JPEG: segment length unreadable: {e}");
                break;
            }
        };
        let payload = segment_payload(buf, segment_start, length);

        match marker {
            APP0 => jfif(payload, &mut out),
            APP1 if payload.starts_with(b"Exif") => out.absorb_tiff(buf, segment_start + 8),
            APP1 if payload.starts_with(XMP_NAMESPACE) => {
                let packet = &payload[XMP_NAMESPACE.len()..];
                out.push("XMP", String::from_utf8_lossy(packet), Category::Text);
            }
            APP2 if payload.starts_with(ICC_SIGNATURE) => {
                icc_bytes += payload.len().saturating_sub(14);
            }
            APP13 if payload.starts_with(PHOTOSHOP_SIGNATURE) => {
                out.push(
                    "PhotoshopIRB",
                    format!("Present ({} bytes)", payload.len() - PHOTOSHOP_SIGNATURE.len()),
                    Category::Text,
                );
            }
            COM => {
                let text = String::from_utf8_lossy(payload);
                let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
                if !text.is_empty() {
                    out.push("Comment", text, Category::Text);
                }
            }
            SOF0 | SOF1 | SOF2 => {
                if let Err(e) = frame_header(buf, segment_start, marker, &mut out) {
                    log::debug!("JPEG: frame header skipped: {e}");
                }
            }
            SOS => {
                log::debug!("JPEG: start of scan at {offset}, stopping");
                break;
            }
            _ => {}
        }

        offset = segment_start + length;
    }

    if icc_bytes > 0 {
        out.push("ICCProfile", format!("Present ({icc_bytes} bytes)"), Category::Image);
    }

    Ok(out)
}

/// Segment data after the length field, clamped to the buffer.
fn segment_payload(buf: &[u8], segment_start: usize, length: usize) -> &[u8] {
    let start = (segment_start + 2).min(buf.len());
    let end = (segment_start + length).min(buf.len());
    &buf[start..end.max(start)]
}

/// SOFn: precision, then height before width, then component count.
fn frame_header(
    buf: &[u8],
    segment_start: usize,
    marker: u8,
    out: &mut Extraction,
) -> ParseResult<()> {
    let precision = bytes::read_u8(buf, segment_start + 2)?;
    let height = bytes::read_u16(buf, segment_start + 3, ByteOrder::BigEndian)?;
    let width = bytes::read_u16(buf, segment_start + 5, ByteOrder::BigEndian)?;
    out.push("ImageWidth", width.to_string(), Category::Image);
    out.push("ImageHeight", height.to_string(), Category::Image);
    out.push("BitDepth", precision.to_string(), Category::Image);

    if let Ok(components) = bytes::read_u8(buf, segment_start + 7) {
        out.push("ColorComponents", components.to_string(), Category::Image);
    }
    let encoding = match marker {
        SOF0 => "Baseline DCT",
        SOF1 => "Extended sequential DCT",
        _ => "Progressive DCT",
    };
    out.push("Encoding", encoding, Category::Image);
    Ok(())
}

fn jfif(payload: &[u8], out: &mut Extraction) {
    if !payload.starts_with(b"JFIF\0") || payload.len() < 12 {
        return;
    }
    out.push(
        "JFIFVersion",
        format!("{}.{:02}", payload[5], payload[6]),
        Category::Image,
    );
    let x = u16::from_be_bytes([payload[8], payload[9]]);
    let y = u16::from_be_bytes([payload[10], payload[11]]);
    let density = match payload[7] {
        1 => format!("{x}x{y} dpi"),
        2 => format!("{x}x{y} dots/cm"),
        _ => format!("{x}:{y} (aspect ratio)"),
    };
    out.push("Density", density, Category::Image);
}
