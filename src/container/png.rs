//! PNG chunk walker.

use crate::error::{ParseError, ParseResult};
use crate::exif::bytes::{self, ByteOrder};
use crate::exif::format_decimal;
use crate::metadata::Category;

use super::Extraction;

const SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";
// length + type + CRC
const CHUNK_OVERHEAD: usize = 12;
const BE: ByteOrder = ByteOrder::BigEndian;

pub fn is_png(buf: &[u8]) -> bool {
    buf.starts_with(SIGNATURE)
}

/// Human name of an `IHDR` color type; unknown values are reported verbatim.
pub fn color_type_name(color_type: u8) -> String {
    match color_type {
        0 => "Grayscale".to_string(),
        2 => "RGB".to_string(),
        3 => "Indexed".to_string(),
        4 => "Grayscale+Alpha".to_string(),
        6 => "RGBA".to_string(),
        other => other.to_string(),
    }
}

/// Walk chunks from offset 8 until `IEND` or the buffer runs out.
pub fn walk(buf: &[u8]) -> ParseResult<Extraction> {
    if !is_png(buf) {
        return Err(ParseError::InvalidHeader("PNG signature"));
    }

    let mut out = Extraction::default();
    let mut offset = SIGNATURE.len();

    while buf.len().saturating_sub(offset) >= CHUNK_OVERHEAD {
        let Ok(length) = bytes::read_u32(buf, offset, BE) else {
            break;
        };
        let length = length as usize;
        let Ok(kind) = bytes::slice(buf, offset + 4, 4) else {
            break;
        };
        let data_start = offset + 8;
        let Ok(data) = bytes::slice(buf, data_start, length) else {
            log::debug!(
                "PNG: {} chunk at {offset} overruns the buffer",
                String::from_utf8_lossy(kind)
            );
            break;
        };
        // CRC is read, never validated
        let crc_at = data_start + length;
        if let Err(e) = bytes::read_u32(buf, crc_at, BE) {
            log::debug!("PNG: CRC missing after chunk at {offset}: {e}");
        }

        let result = match kind {
            b"IHDR" => header(data, &mut out),
            b"tEXt" => text(data, &mut out),
            b"iTXt" => international_text(data, &mut out),
            b"zTXt" => compressed_text(data, &mut out),
            b"eXIf" => {
                out.absorb_tiff(data, 0);
                Ok(())
            }
            b"pHYs" => physical_dimensions(data, &mut out),
            b"tIME" => modification_time(data, &mut out),
            b"gAMA" => bytes::read_u32(data, 0, BE).map(|g| {
                out.push("Gamma", format_decimal(g as f64 / 100_000.0), Category::Image);
            }),
            b"sRGB" => bytes::read_u8(data, 0).map(|intent| {
                out.push("SRGBRendering", rendering_intent(intent), Category::Image);
            }),
            b"iCCP" => icc_profile(data, &mut out),
            b"acTL" => animation_control(data, &mut out),
            b"IEND" => break,
            _ => Ok(()),
        };
        if let Err(e) = result {
            log::debug!("PNG: {} chunk skipped: {e}", String::from_utf8_lossy(kind));
        }

        offset = crc_at + 4;
    }

    Ok(out)
}

fn header(data: &[u8], out: &mut Extraction) -> ParseResult<()> {
    let width = bytes::read_u32(data, 0, BE)?;
    let height = bytes::read_u32(data, 4, BE)?;
    let bit_depth = bytes::read_u8(data, 8)?;
    let color_type = bytes::read_u8(data, 9)?;
    out.push("ImageWidth", width.to_string(), Category::Image);
    out.push("ImageHeight", height.to_string(), Category::Image);
    out.push("BitDepth", bit_depth.to_string(), Category::Image);
    out.push("ColorType", color_type_name(color_type), Category::Image);
    if let Ok(interlace) = bytes::read_u8(data, 12) {
        let method = match interlace {
            0 => "None".to_string(),
            1 => "Adam7".to_string(),
            other => other.to_string(),
        };
        out.push("Interlace", method, Category::Image);
    }
    Ok(())
}

/// Split at the first NUL: `(keyword, rest)`.
fn split_keyword(data: &[u8]) -> ParseResult<(String, &[u8])> {
    let nul = data
        .iter()
        .position(|&b| b == 0)
        .ok_or(ParseError::InvalidHeader("text chunk keyword terminator"))?;
    if nul == 0 {
        return Err(ParseError::InvalidHeader("empty text chunk keyword"));
    }
    let keyword = data[..nul].iter().map(|&b| b as char).collect();
    Ok((keyword, &data[nul + 1..]))
}

/// `tEXt`: Latin-1 keyword and text.
fn text(data: &[u8], out: &mut Extraction) -> ParseResult<()> {
    let (keyword, rest) = split_keyword(data)?;
    let value: String = rest.iter().map(|&b| b as char).collect();
    out.push(&keyword, value, Category::Text);
    Ok(())
}

/// `iTXt`: keyword, compression flag and method, language tag, translated
/// keyword, then UTF-8 text.
fn international_text(data: &[u8], out: &mut Extraction) -> ParseResult<()> {
    let (keyword, rest) = split_keyword(data)?;
    let compressed = bytes::read_u8(rest, 0)? != 0;
    let rest = bytes::slice(rest, 2, rest.len().saturating_sub(2))?;
    let language_end = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or(ParseError::InvalidHeader("iTXt language tag terminator"))?;
    let rest = &rest[language_end + 1..];
    let translated_end = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or(ParseError::InvalidHeader("iTXt translated keyword terminator"))?;
    let text = &rest[translated_end + 1..];

    let value = if compressed {
        format!("(compressed, {} bytes)", text.len())
    } else {
        String::from_utf8_lossy(text).into_owned()
    };
    out.push(&keyword, value, Category::Text);
    Ok(())
}

/// `zTXt`: keyword and deflated text, reported by size.
fn compressed_text(data: &[u8], out: &mut Extraction) -> ParseResult<()> {
    let (keyword, rest) = split_keyword(data)?;
    let size = rest.len().saturating_sub(1);
    out.push(&keyword, format!("(compressed, {size} bytes)"), Category::Text);
    Ok(())
}

fn physical_dimensions(data: &[u8], out: &mut Extraction) -> ParseResult<()> {
    let x = bytes::read_u32(data, 0, BE)?;
    let y = bytes::read_u32(data, 4, BE)?;
    let unit = bytes::read_u8(data, 8)?;
    let value = if unit == 1 {
        let dpi = |ppm: u32| (ppm as f64 * 0.0254).round() as u64;
        format!("{}x{} dpi", dpi(x), dpi(y))
    } else {
        format!("{x}:{y} (aspect ratio)")
    };
    out.push("PixelDensity", value, Category::Image);
    Ok(())
}

fn modification_time(data: &[u8], out: &mut Extraction) -> ParseResult<()> {
    let year = bytes::read_u16(data, 0, BE)?;
    let fields = bytes::slice(data, 2, 5)?;
    out.push(
        "ModifyDate",
        format!(
            "{year:04}:{:02}:{:02} {:02}:{:02}:{:02}",
            fields[0], fields[1], fields[2], fields[3], fields[4]
        ),
        Category::DateTime,
    );
    Ok(())
}

fn rendering_intent(intent: u8) -> String {
    match intent {
        0 => "Perceptual".to_string(),
        1 => "Relative colorimetric".to_string(),
        2 => "Saturation".to_string(),
        3 => "Absolute colorimetric".to_string(),
        other => other.to_string(),
    }
}

fn icc_profile(data: &[u8], out: &mut Extraction) -> ParseResult<()> {
    let (name, rest) = split_keyword(data)?;
    let size = rest.len().saturating_sub(1);
    out.push(
        "ICCProfile",
        format!("{name} ({size} bytes compressed)"),
        Category::Image,
    );
    Ok(())
}

/// APNG `acTL`: frame count and number of plays (0 = infinite).
fn animation_control(data: &[u8], out: &mut Extraction) -> ParseResult<()> {
    let frames = bytes::read_u32(data, 0, BE)?;
    let plays = bytes::read_u32(data, 4, BE)?;
    out.push("Animated", "Yes", Category::Image);
    out.push("FrameCount", frames.to_string(), Category::Image);
    let loops = if plays == 0 {
        "Infinite".to_string()
    } else {
        plays.to_string()
    };
    out.push("LoopCount", loops, Category::Image);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, TiffBuilder, Value, ihdr, png_chunk};

    fn value<'a>(out: &'a Extraction, tag: &str) -> Option<&'a str> {
        out.entries.iter().find(|e| e.tag() == tag).map(|e| e.value())
    }

    #[test]
    fn header_fields() {
        let buf = test_support::png(&[ihdr(320, 200, 8, 6), png_chunk(b"IEND", &[])]);
        let out = walk(&buf).unwrap();
        assert_eq!(value(&out, "ImageWidth"), Some("320"));
        assert_eq!(value(&out, "ImageHeight"), Some("200"));
        assert_eq!(value(&out, "BitDepth"), Some("8"));
        assert_eq!(value(&out, "ColorType"), Some("RGBA"));
        assert_eq!(value(&out, "Interlace"), Some("None"));
    }

    #[test]
    fn color_type_names() {
        assert_eq!(color_type_name(0), "Grayscale");
        assert_eq!(color_type_name(2), "RGB");
        assert_eq!(color_type_name(3), "Indexed");
        assert_eq!(color_type_name(4), "Grayscale+Alpha");
        assert_eq!(color_type_name(9), "9");
    }

    #[test]
    fn text_chunks() {
        let mut itxt = b"Description\0\0\0en\0\0".to_vec();
        itxt.extend("Caf\u{e9} au lait".as_bytes());
        let buf = test_support::png(&[
            ihdr(1, 1, 8, 2),
            png_chunk(b"tEXt", b"Author\0Jane Doe"),
            png_chunk(b"tEXt", b"no terminator here"),
            png_chunk(b"iTXt", &itxt),
            png_chunk(b"zTXt", b"Comment\0\0\x78\x9c\x01"),
            png_chunk(b"IEND", &[]),
        ]);
        let out = walk(&buf).unwrap();
        let author = out.entries.iter().find(|e| e.tag() == "Author").unwrap();
        assert_eq!(author.value(), "Jane Doe");
        assert_eq!(author.category(), Category::Text);
        assert_eq!(value(&out, "Description"), Some("Caf\u{e9} au lait"));
        assert_eq!(value(&out, "Comment"), Some("(compressed, 3 bytes)"));
        // malformed tEXt skipped, walk continued
        assert_eq!(out.entries.iter().filter(|e| e.category() == Category::Text).count(), 3);
    }

    #[test]
    fn compressed_international_text_reported_by_size() {
        let mut itxt = b"XML:com.adobe.xmp\0\x01\x00de\0Beschreibung\0".to_vec();
        itxt.extend([0x78, 0x9c, 0x03, 0x00, 0x01]);
        let buf = test_support::png(&[
            ihdr(1, 1, 8, 2),
            png_chunk(b"iTXt", &itxt),
            png_chunk(b"IEND", &[]),
        ]);
        let out = walk(&buf).unwrap();
        assert_eq!(value(&out, "XML:com.adobe.xmp"), Some("(compressed, 5 bytes)"));
    }

    #[test]
    fn long_text_truncated() {
        let mut data = b"Comment\0".to_vec();
        data.extend(std::iter::repeat_n(b'a', 900));
        let buf = test_support::png(&[png_chunk(b"tEXt", &data), png_chunk(b"IEND", &[])]);
        let out = walk(&buf).unwrap();
        assert_eq!(value(&out, "Comment").unwrap().len(), 500);
    }

    #[test]
    fn exif_chunk() {
        let tiff = TiffBuilder::new(ByteOrder::LittleEndian)
            .root(0x0131, Value::Ascii("GIMP 2.10".into()))
            .build();
        let buf = test_support::png(&[
            ihdr(2, 2, 8, 2),
            png_chunk(b"eXIf", &tiff),
            png_chunk(b"IEND", &[]),
        ]);
        let out = walk(&buf).unwrap();
        assert_eq!(value(&out, "Software"), Some("GIMP 2.10"));
    }

    #[test]
    fn ancillary_chunks() {
        let mut phys = 2835u32.to_be_bytes().to_vec();
        phys.extend(2835u32.to_be_bytes());
        phys.push(1);
        let mut time = 2023u16.to_be_bytes().to_vec();
        time.extend([6, 15, 9, 30, 5]);
        let mut actl = 12u32.to_be_bytes().to_vec();
        actl.extend(0u32.to_be_bytes());
        let buf = test_support::png(&[
            ihdr(2, 2, 8, 2),
            png_chunk(b"pHYs", &phys),
            png_chunk(b"tIME", &time),
            png_chunk(b"gAMA", &45455u32.to_be_bytes()),
            png_chunk(b"sRGB", &[0]),
            png_chunk(b"acTL", &actl),
            png_chunk(b"IEND", &[]),
        ]);
        let out = walk(&buf).unwrap();
        assert_eq!(value(&out, "PixelDensity"), Some("72x72 dpi"));
        assert_eq!(value(&out, "ModifyDate"), Some("2023:06:15 09:30:05"));
        assert_eq!(value(&out, "Gamma"), Some("0.45455"));
        assert_eq!(value(&out, "SRGBRendering"), Some("Perceptual"));
        assert_eq!(value(&out, "FrameCount"), Some("12"));
        assert_eq!(value(&out, "LoopCount"), Some("Infinite"));
    }

    #[test]
    fn stops_at_iend() {
        let buf = test_support::png(&[
            png_chunk(b"IEND", &[]),
            png_chunk(b"tEXt", b"Title\0after end"),
        ]);
        let out = walk(&buf).unwrap();
        assert!(out.entries.is_empty());
    }

    #[test]
    fn truncated_chunk_stops_walk() {
        let mut buf = test_support::png(&[ihdr(5, 6, 8, 0)]);
        buf.extend(1000u32.to_be_bytes());
        buf.extend(b"tEXt");
        buf.extend(b"Title\0short");
        let out = walk(&buf).unwrap();
        assert_eq!(value(&out, "ImageWidth"), Some("5"));
        assert_eq!(value(&out, "Title"), None);
    }

    #[test]
    fn every_prefix_is_safe() {
        let buf = test_support::png(&[
            ihdr(3, 3, 16, 4),
            png_chunk(b"tEXt", b"Software\0pixmeta"),
            png_chunk(b"IEND", &[]),
        ]);
        for len in 0..buf.len() {
            let _ = walk(&buf[..len]);
        }
    }
}
