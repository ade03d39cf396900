//! WebP (RIFF) chunk walker.
//!
//! Chunks follow the 12-byte `RIFF <size> WEBP` header, each as
//! `FourCC, u32 LE size, payload`, padded to an even length.

use crate::error::{ParseError, ParseResult};
use crate::exif::bytes::{self, ByteOrder};
use crate::metadata::Category;

use super::{Extraction, yes_no};

const LE: ByteOrder = ByteOrder::LittleEndian;
const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

const VP8_START_CODE: [u8; 3] = [0x9D, 0x01, 0x2A];
const VP8L_SIGNATURE: u8 = 0x2F;

// VP8X feature flags
const FLAG_ICC: u8 = 0x20;
const FLAG_ALPHA: u8 = 0x10;
const FLAG_EXIF: u8 = 0x08;
const FLAG_XMP: u8 = 0x04;
const FLAG_ANIMATION: u8 = 0x02;

pub fn is_webp(buf: &[u8]) -> bool {
    buf.len() >= HEADER_LEN && &buf[0..4] == b"RIFF" && &buf[8..12] == b"WEBP"
}

/// Running state across chunks.
#[derive(Debug, Default)]
struct Walk {
    out: Extraction,
    canvas_known: bool,
    frames: u32,
    duration_ms: u64,
}

pub fn walk(buf: &[u8]) -> ParseResult<Extraction> {
    if !is_webp(buf) {
        return Err(ParseError::InvalidHeader("RIFF/WEBP header"));
    }
    let declared = bytes::read_u32(buf, 4, LE)? as usize;
    if declared.saturating_add(8) != buf.len() {
        log::debug!("WebP: RIFF size {declared} disagrees with buffer length {}", buf.len());
    }

    let mut state = Walk::default();
    let mut offset = HEADER_LEN;

    while buf.len().saturating_sub(offset) >= CHUNK_HEADER_LEN {
        let fourcc = &buf[offset..offset + 4];
        let size = bytes::read_u32(buf, offset + 4, LE)? as usize;
        let data_start = offset + CHUNK_HEADER_LEN;
        let data_end = data_start.saturating_add(size);
        if data_end > buf.len() {
            log::debug!(
                "WebP: {} chunk at {offset} truncated ({size} bytes declared)",
                String::from_utf8_lossy(fourcc)
            );
        }
        let payload = &buf[data_start..data_end.min(buf.len())];

        if let Err(e) = state.chunk(fourcc, payload) {
            log::debug!("WebP: {} chunk skipped: {e}", String::from_utf8_lossy(fourcc));
        }

        offset = data_end.saturating_add(size & 1);
    }

    Ok(state.finish())
}

impl Walk {
    fn chunk(&mut self, fourcc: &[u8], payload: &[u8]) -> ParseResult<()> {
        match fourcc {
            b"VP8 " => self.lossy(payload),
            b"VP8L" => self.lossless(payload),
            b"VP8X" => self.extended(payload),
            b"EXIF" => {
                let start = if payload.starts_with(b"Exif\0\0") { 6 } else { 0 };
                self.out.absorb_tiff(payload, start);
                Ok(())
            }
            b"ICCP" => {
                self.out.push(
                    "ICCProfile",
                    format!("Present ({} bytes)", payload.len()),
                    Category::Image,
                );
                Ok(())
            }
            b"XMP " => {
                self.out
                    .push("XMP", String::from_utf8_lossy(payload), Category::Text);
                Ok(())
            }
            b"ANIM" => self.animation(payload),
            b"ANMF" => {
                self.frames += 1;
                // frame duration: 24-bit LE after x, y, width-1, height-1
                if let Ok(duration) = bytes::read_u24(payload, 12, LE) {
                    self.duration_ms += duration as u64;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn dimensions(&mut self, width: u32, height: u32) {
        self.out.push("ImageWidth", width.to_string(), Category::Image);
        self.out.push("ImageHeight", height.to_string(), Category::Image);
    }

    /// `VP8 `: 14-bit width and height at payload bytes 6..10.
    fn lossy(&mut self, payload: &[u8]) -> ParseResult<()> {
        if bytes::slice(payload, 3, 3)? != VP8_START_CODE {
            return Err(ParseError::InvalidHeader("VP8 start code"));
        }
        let width = bytes::read_u16(payload, 6, LE)? & 0x3FFF;
        let height = bytes::read_u16(payload, 8, LE)? & 0x3FFF;
        self.out.push("Compression", "Lossy (VP8)", Category::Image);
        if !self.canvas_known {
            self.dimensions(width as u32, height as u32);
        }
        Ok(())
    }

    /// `VP8L`: two 14-bit fields (stored minus one) after the signature byte.
    fn lossless(&mut self, payload: &[u8]) -> ParseResult<()> {
        if bytes::read_u8(payload, 0)? != VP8L_SIGNATURE {
            return Err(ParseError::InvalidHeader("VP8L signature"));
        }
        let bits = bytes::read_u32(payload, 1, LE)?;
        let width = (bits & 0x3FFF) + 1;
        let height = ((bits >> 14) & 0x3FFF) + 1;
        self.out.push("Compression", "Lossless (VP8L)", Category::Image);
        if !self.canvas_known {
            self.dimensions(width, height);
        }
        Ok(())
    }

    /// `VP8X`: feature flags and 24-bit canvas size (stored minus one).
    fn extended(&mut self, payload: &[u8]) -> ParseResult<()> {
        let flags = bytes::read_u8(payload, 0)?;
        let width = bytes::read_u24(payload, 4, LE)? + 1;
        let height = bytes::read_u24(payload, 7, LE)? + 1;
        self.dimensions(width, height);
        self.canvas_known = true;

        let features: Vec<&str> = [
            (FLAG_ALPHA, "Alpha"),
            (FLAG_ANIMATION, "Animation"),
            (FLAG_ICC, "ICC profile"),
            (FLAG_EXIF, "EXIF"),
            (FLAG_XMP, "XMP"),
        ]
        .iter()
        .filter(|(flag, _)| flags & flag != 0)
        .map(|(_, name)| *name)
        .collect();
        let features = if features.is_empty() {
            "None".to_string()
        } else {
            features.join(", ")
        };
        self.out.push("Features", features, Category::Image);
        Ok(())
    }

    /// `ANIM`: background color (BGRA bytes, read as LE u32) and loop count.
    fn animation(&mut self, payload: &[u8]) -> ParseResult<()> {
        let background = bytes::read_u32(payload, 0, LE)?;
        let loops = bytes::read_u16(payload, 4, LE)?;
        self.out.push(
            "BackgroundColor",
            format!("#{background:08X} (ARGB)"),
            Category::Image,
        );
        let loops = if loops == 0 {
            "Infinite".to_string()
        } else {
            loops.to_string()
        };
        self.out.push("LoopCount", loops, Category::Image);
        Ok(())
    }

    fn finish(mut self) -> Extraction {
        if self.frames > 0 {
            self.out.push("Animated", yes_no(self.frames > 1), Category::Image);
            self.out
                .push("FrameCount", self.frames.to_string(), Category::Image);
            if self.duration_ms > 0 {
                self.out.push(
                    "Duration",
                    format!("{:.2}s", self.duration_ms as f64 / 1000.0),
                    Category::Image,
                );
            }
        }
        self.out
    }
}
