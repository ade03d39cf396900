//! Fixture builders shared by the unit and integration tests: TIFF regions
//! and minimal JPEG, PNG, WebP and GIF containers.

use crate::exif::ByteOrder;
use crate::metadata::FileAttributes;

#[derive(Debug, Clone)]
pub enum Value {
    Byte(Vec<u8>),
    Undefined(Vec<u8>),
    Ascii(String),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<(u32, u32)>),
    SLong(Vec<i32>),
    SRational(Vec<(i32, i32)>),
    Raw { field_type: u16, count: u32, bytes: Vec<u8> },
}

fn u16_bytes(v: u16, order: ByteOrder) -> [u8; 2] {
    match order {
        ByteOrder::LittleEndian => v.to_le_bytes(),
        ByteOrder::BigEndian => v.to_be_bytes(),
    }
}

fn u32_bytes(v: u32, order: ByteOrder) -> [u8; 4] {
    match order {
        ByteOrder::LittleEndian => v.to_le_bytes(),
        ByteOrder::BigEndian => v.to_be_bytes(),
    }
}

impl Value {
    fn field_type(&self) -> u16 {
        match self {
            Value::Byte(_) => 1,
            Value::Ascii(_) => 2,
            Value::Short(_) => 3,
            Value::Long(_) => 4,
            Value::Rational(_) => 5,
            Value::Undefined(_) => 7,
            Value::SLong(_) => 9,
            Value::SRational(_) => 10,
            Value::Raw { field_type, .. } => *field_type,
        }
    }

    fn count(&self) -> u32 {
        let n = match self {
            Value::Byte(v) | Value::Undefined(v) => v.len(),
            Value::Ascii(s) => s.len() + 1,
            Value::Short(v) => v.len(),
            Value::Long(v) => v.len(),
            Value::Rational(v) => v.len(),
            Value::SLong(v) => v.len(),
            Value::SRational(v) => v.len(),
            Value::Raw { count, .. } => return *count,
        };
        n as u32
    }

    fn encode(&self, order: ByteOrder) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Value::Byte(v) | Value::Undefined(v) => out.extend_from_slice(v),
            Value::Ascii(s) => {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
            }
            Value::Short(v) => v.iter().for_each(|x| out.extend(u16_bytes(*x, order))),
            Value::Long(v) => v.iter().for_each(|x| out.extend(u32_bytes(*x, order))),
            Value::Rational(v) => v.iter().for_each(|(n, d)| {
                out.extend(u32_bytes(*n, order));
                out.extend(u32_bytes(*d, order));
            }),
            Value::SLong(v) => v.iter().for_each(|x| out.extend(u32_bytes(*x as u32, order))),
            Value::SRational(v) => v.iter().for_each(|(n, d)| {
                out.extend(u32_bytes(*n as u32, order));
                out.extend(u32_bytes(*d as u32, order));
            }),
            Value::Raw { bytes, .. } => out.extend_from_slice(bytes),
        }
        out
    }
}

/// Builds a TIFF region with optional EXIF, GPS and thumbnail directories.
#[derive(Debug, Clone)]
pub struct TiffBuilder {
    order: ByteOrder,
    root: Vec<(u16, Value)>,
    exif: Vec<(u16, Value)>,
    gps: Vec<(u16, Value)>,
    thumbnail: Vec<(u16, Value)>,
}

impl TiffBuilder {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            root: Vec::new(),
            exif: Vec::new(),
            gps: Vec::new(),
            thumbnail: Vec::new(),
        }
    }

    pub fn root(mut self, tag: u16, value: Value) -> Self {
        self.root.push((tag, value));
        self
    }

    pub fn exif(mut self, tag: u16, value: Value) -> Self {
        self.exif.push((tag, value));
        self
    }

    pub fn gps(mut self, tag: u16, value: Value) -> Self {
        self.gps.push((tag, value));
        self
    }

    pub fn thumbnail(mut self, tag: u16, value: Value) -> Self {
        self.thumbnail.push((tag, value));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let ifd_len = |n: usize| 2 + n * 12 + 4;
        let mut root = self.root.clone();
        if !self.exif.is_empty() {
            root.push((0x8769, Value::Long(vec![0])));
        }
        if !self.gps.is_empty() {
            root.push((0x8825, Value::Long(vec![0])));
        }

        let mut cursor = 8 + ifd_len(root.len());
        let mut place = |fields: &[(u16, Value)]| {
            if fields.is_empty() {
                0
            } else {
                let at = cursor;
                cursor += ifd_len(fields.len());
                at
            }
        };
        let thumb_off = place(&self.thumbnail);
        let exif_off = place(&self.exif);
        let gps_off = place(&self.gps);
        let data_base = cursor;

        for (tag, value) in root.iter_mut() {
            match *tag {
                0x8769 => *value = Value::Long(vec![exif_off as u32]),
                0x8825 => *value = Value::Long(vec![gps_off as u32]),
                _ => {}
            }
        }

        let order = self.order;
        let mut out = match order {
            ByteOrder::LittleEndian => b"II".to_vec(),
            ByteOrder::BigEndian => b"MM".to_vec(),
        };
        out.extend(u16_bytes(42, order));
        out.extend(u32_bytes(8, order));

        let mut data = Vec::new();
        write_ifd(&mut out, &mut data, data_base, &root, thumb_off as u32, order);
        for fields in [&self.thumbnail, &self.exif, &self.gps] {
            if !fields.is_empty() {
                write_ifd(&mut out, &mut data, data_base, fields, 0, order);
            }
        }
        out.extend(data);
        out
    }
}

fn write_ifd(
    out: &mut Vec<u8>,
    data: &mut Vec<u8>,
    data_base: usize,
    fields: &[(u16, Value)],
    next: u32,
    order: ByteOrder,
) {
    out.extend(u16_bytes(fields.len() as u16, order));
    for (tag, value) in fields {
        out.extend(u16_bytes(*tag, order));
        out.extend(u16_bytes(value.field_type(), order));
        out.extend(u32_bytes(value.count(), order));
        let bytes = value.encode(order);
        if bytes.len() <= 4 {
            let mut inline = [0u8; 4];
            inline[..bytes.len()].copy_from_slice(&bytes);
            out.extend(inline);
        } else {
            out.extend(u32_bytes((data_base + data.len()) as u32, order));
            data.extend(bytes);
            if data.len() % 2 == 1 {
                data.push(0);
            }
        }
    }
    out.extend(u32_bytes(next, order));
}

/// Minimal JPEG: SOI, optional APP1/Exif, SOF0 (8-bit, 3 components), EOI.
pub fn jpeg(tiff: Option<&[u8]>, width: u16, height: u16) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    if let Some(tiff) = tiff {
        out.extend([0xFF, 0xE1]);
        out.extend(((tiff.len() + 8) as u16).to_be_bytes());
        out.extend(b"Exif\0\0");
        out.extend_from_slice(tiff);
    }
    out.extend([0xFF, 0xC0, 0x00, 0x11, 0x08]);
    out.extend(height.to_be_bytes());
    out.extend(width.to_be_bytes());
    out.push(3);
    for id in 1..=3u8 {
        out.extend([id, 0x11, 0x00]);
    }
    out.extend([0xFF, 0xD9]);
    out
}

/// CRC-32 (IEEE) over chunk type and data, bitwise.
fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &b in bytes {
        crc ^= b as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
        }
    }
    !crc
}

/// PNG chunk with a valid CRC, so real decoders accept it too.
pub fn png_chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = (data.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend(crc32(&out[4..]).to_be_bytes());
    out
}

pub fn png(chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = b"\x89PNG\r\n\x1a\n".to_vec();
    for chunk in chunks {
        out.extend_from_slice(chunk);
    }
    out
}

pub fn ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
    let mut data = width.to_be_bytes().to_vec();
    data.extend(height.to_be_bytes());
    data.extend([bit_depth, color_type, 0, 0, 0]);
    png_chunk(b"IHDR", &data)
}

/// RIFF/WEBP container around the given chunks, padding odd payloads.
pub fn webp(chunks: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut body = b"WEBP".to_vec();
    for (fourcc, data) in chunks {
        body.extend_from_slice(*fourcc);
        body.extend((data.len() as u32).to_le_bytes());
        body.extend_from_slice(data);
        if data.len() % 2 == 1 {
            body.push(0);
        }
    }
    let mut out = b"RIFF".to_vec();
    out.extend((body.len() as u32).to_le_bytes());
    out.extend(body);
    out
}

/// GIF89a with `frames` 1x1 images, each preceded by a graphic control
/// extension carrying `delay` hundredths of a second.
pub fn gif(frames: usize, delay: u16) -> Vec<u8> {
    let mut out = b"GIF89a\x01\x00\x01\x00\x00\x00\x00".to_vec();
    for _ in 0..frames {
        out.extend([0x21, 0xF9, 4, 0]);
        out.extend(delay.to_le_bytes());
        out.extend([0, 0]);
        out.extend([0x2C, 0, 0, 0, 0, 1, 0, 1, 0, 0]);
        out.extend([2, 2, 0x4C, 0x01, 0]);
    }
    out.push(0x3B);
    out
}

/// File attributes for an in-memory fixture, without a modification time.
pub fn attributes(name: &str, buffer: &[u8], mime_type: &str) -> FileAttributes {
    FileAttributes {
        name: name.to_string(),
        size: buffer.len() as u64,
        mime_type: mime_type.to_string(),
        modified: None,
    }
}
