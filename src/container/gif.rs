//! GIF block walker: header, logical screen descriptor, then extension and
//! image blocks up to the trailer.

use crate::error::{ParseError, ParseResult};
use crate::exif::bytes::{self, ByteOrder};
use crate::exif::format_decimal;
use crate::metadata::Category;

use super::{Extraction, yes_no};

const LE: ByteOrder = ByteOrder::LittleEndian;
const HEADER_LEN: usize = 13;

const EXTENSION: u8 = 0x21;
const IMAGE_DESCRIPTOR: u8 = 0x2C;
const TRAILER: u8 = 0x3B;

const GRAPHIC_CONTROL: u8 = 0xF9;
const COMMENT: u8 = 0xFE;
const APPLICATION: u8 = 0xFF;

pub fn is_gif(buf: &[u8]) -> bool {
    buf.starts_with(b"GIF")
}

/// Bytes taken by a color table whose packed size field is `bits`.
fn color_table_len(bits: u8) -> usize {
    3 * (1usize << ((bits & 0x07) + 1))
}

#[derive(Debug, Default)]
struct Walk {
    out: Extraction,
    screen: (u16, u16),
    frames: u32,
    // hundredths of a second
    delay_total: u64,
    first_control_seen: bool,
}

pub fn walk(buf: &[u8]) -> ParseResult<Extraction> {
    if !is_gif(buf) {
        return Err(ParseError::InvalidHeader("GIF signature"));
    }
    let version = bytes::slice(buf, 3, 3)?;
    if version != b"87a" && version != b"89a" {
        return Err(ParseError::InvalidHeader("GIF version"));
    }

    let mut state = Walk::default();
    state.out.push(
        "Version",
        format!("GIF{}", String::from_utf8_lossy(version)),
        Category::Image,
    );

    let offset = match state.screen_descriptor(buf) {
        Ok(next) => next,
        Err(e) => {
            log::debug!("GIF: logical screen descriptor unreadable: {e}");
            return Ok(state.out);
        }
    };

    if let Err(e) = state.blocks(buf, offset) {
        log::debug!("GIF: block walk stopped: {e}");
    }

    Ok(state.finish())
}

impl Walk {
    /// Logical screen descriptor at bytes 6..13. Returns the offset past the
    /// global color table.
    fn screen_descriptor(&mut self, buf: &[u8]) -> ParseResult<usize> {
        let width = bytes::read_u16(buf, 6, LE)?;
        let height = bytes::read_u16(buf, 8, LE)?;
        let packed = bytes::read_u8(buf, 10)?;
        let background = bytes::read_u8(buf, 11)?;
        let aspect = bytes::read_u8(buf, 12)?;
        self.screen = (width, height);

        let out = &mut self.out;
        out.push("ImageWidth", width.to_string(), Category::Image);
        out.push("ImageHeight", height.to_string(), Category::Image);

        let has_global = packed & 0x80 != 0;
        let table_bits = packed & 0x07;
        let global = if has_global {
            format!("Yes ({} colors)", 1u32 << (table_bits + 1))
        } else {
            "No".to_string()
        };
        out.push("GlobalColorTable", global, Category::Image);
        out.push(
            "ColorResolution",
            format!("{} bits", ((packed >> 4) & 0x07) + 1),
            Category::Image,
        );
        if has_global {
            out.push("ColorTableSorted", yes_no(packed & 0x08 != 0), Category::Image);
            out.push("BackgroundColorIndex", background.to_string(), Category::Image);
        }
        if aspect != 0 {
            let ratio = (aspect as f64 + 15.0) / 64.0;
            out.push("PixelAspectRatio", format_decimal(ratio), Category::Image);
        }

        let mut offset = HEADER_LEN;
        if has_global {
            offset += color_table_len(table_bits);
        }
        Ok(offset)
    }

    fn blocks(&mut self, buf: &[u8], mut offset: usize) -> ParseResult<()> {
        loop {
            let introducer = bytes::read_u8(buf, offset)?;
            offset = match introducer {
                TRAILER => return Ok(()),
                EXTENSION => self.extension(buf, offset + 1)?,
                IMAGE_DESCRIPTOR => self.image(buf, offset + 1)?,
                other => {
                    log::debug!("GIF: unknown block 0x{other:02x} at {offset}");
                    return Ok(());
                }
            };
        }
    }

    /// Extension introduced at `offset - 1`; returns the offset after it.
    fn extension(&mut self, buf: &[u8], offset: usize) -> ParseResult<usize> {
        let label = bytes::read_u8(buf, offset)?;
        let body = offset + 1;
        match label {
            GRAPHIC_CONTROL => self.graphic_control(buf, body)?,
            COMMENT => {
                let (text, _) = sub_block_data(buf, body)?;
                let text = String::from_utf8_lossy(&text);
                let text = text.trim_end_matches('\0').trim();
                if !text.is_empty() {
                    self.out.push("Comment", text, Category::Text);
                }
            }
            APPLICATION => self.application(buf, body)?,
            _ => {}
        }
        skip_sub_blocks(buf, body)
    }

    /// Graphic control block: packed flags, delay (1/100 s), transparent index.
    fn graphic_control(&mut self, buf: &[u8], body: usize) -> ParseResult<()> {
        if bytes::read_u8(buf, body)? < 4 {
            return Ok(());
        }
        let packed = bytes::read_u8(buf, body + 1)?;
        let delay = bytes::read_u16(buf, body + 2, LE)?;
        let transparent_index = bytes::read_u8(buf, body + 4)?;
        self.delay_total += delay as u64;

        if !self.first_control_seen {
            self.first_control_seen = true;
            let disposal = match (packed >> 2) & 0x07 {
                0 => "Unspecified".to_string(),
                1 => "Do not dispose".to_string(),
                2 => "Restore to background".to_string(),
                3 => "Restore to previous".to_string(),
                n => format!("Reserved ({n})"),
            };
            self.out.push("DisposalMethod", disposal, Category::Image);
            let transparent = packed & 0x01 != 0;
            self.out
                .push("Transparency", yes_no(transparent), Category::Image);
            if transparent {
                self.out.push(
                    "TransparentColorIndex",
                    transparent_index.to_string(),
                    Category::Image,
                );
            }
        }
        Ok(())
    }

    fn application(&mut self, buf: &[u8], body: usize) -> ParseResult<()> {
        let size = bytes::read_u8(buf, body)? as usize;
        let identifier = bytes::slice(buf, body + 1, size.min(11))?;
        // 8-byte application identifier; the 3-byte authentication code varies
        if identifier.starts_with(b"NETSCAPE") || identifier.starts_with(b"ANIMEXTS") {
            // first data sub-block: 0x03, 0x01, loop count (u16 LE)
            let data = body + 1 + size;
            if bytes::read_u8(buf, data)? >= 3 && bytes::read_u8(buf, data + 1)? == 0x01 {
                let loops = bytes::read_u16(buf, data + 2, LE)?;
                let loops = if loops == 0 {
                    "Infinite".to_string()
                } else {
                    loops.to_string()
                };
                self.out.push("LoopCount", loops, Category::Image);
            }
        } else {
            self.out.push(
                "ApplicationExtension",
                String::from_utf8_lossy(identifier).trim(),
                Category::Image,
            );
        }
        Ok(())
    }

    /// Image descriptor introduced at `offset - 1`; returns the offset after
    /// the image data.
    fn image(&mut self, buf: &[u8], offset: usize) -> ParseResult<usize> {
        let left = bytes::read_u16(buf, offset, LE)?;
        let top = bytes::read_u16(buf, offset + 2, LE)?;
        let width = bytes::read_u16(buf, offset + 4, LE)?;
        let height = bytes::read_u16(buf, offset + 6, LE)?;
        let packed = bytes::read_u8(buf, offset + 8)?;
        self.frames += 1;

        let has_local = packed & 0x80 != 0;
        if self.frames == 1 {
            let out = &mut self.out;
            if (left, top) != (0, 0) {
                out.push("FrameOffset", format!("{left},{top}"), Category::Image);
            }
            if (width, height) != self.screen {
                out.push("FrameSize", format!("{width}x{height}"), Category::Image);
            }
            out.push("Interlaced", yes_no(packed & 0x40 != 0), Category::Image);
            let local = if has_local {
                format!("Yes ({} colors)", 1u32 << ((packed & 0x07) + 1))
            } else {
                "No".to_string()
            };
            out.push("LocalColorTable", local, Category::Image);
        }

        let mut next = offset + 9;
        if has_local {
            next += color_table_len(packed);
        }
        // LZW minimum code size
        bytes::read_u8(buf, next)?;
        skip_sub_blocks(buf, next + 1)
    }

    fn finish(mut self) -> Extraction {
        if self.frames > 1 {
            let seconds = self.delay_total as f64 / 100.0;
            let out = &mut self.out;
            out.push("Animated", "Yes", Category::Image);
            out.push("FrameCount", self.frames.to_string(), Category::Image);
            if self.delay_total > 0 {
                out.push("Duration", format!("{seconds:.2}s"), Category::Image);
                out.push(
                    "AverageFrameDelay",
                    format!("{:.2}s", seconds / self.frames as f64),
                    Category::Image,
                );
            }
        }
        self.out
    }
}

/// Offset past a run of data sub-blocks ending in a zero-length block.
fn skip_sub_blocks(buf: &[u8], mut offset: usize) -> ParseResult<usize> {
    loop {
        let len = bytes::read_u8(buf, offset)? as usize;
        offset += 1;
        if len == 0 {
            return Ok(offset);
        }
        offset += len;
    }
}

/// Concatenated payload of a sub-block run, plus the offset after it.
fn sub_block_data(buf: &[u8], mut offset: usize) -> ParseResult<(Vec<u8>, usize)> {
    let mut data = Vec::new();
    loop {
        let len = bytes::read_u8(buf, offset)? as usize;
        offset += 1;
        if len == 0 {
            return Ok((data, offset));
        }
        data.extend_from_slice(bytes::slice(buf, offset, len)?);
        offset += len;
    }
}
