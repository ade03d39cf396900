use std::io::Cursor;

use image::{ColorType, DynamicImage, ImageFormat};
use pixmeta::exif::{ByteOrder, decode_tiff, dms_to_decimal};
use pixmeta::test_support::{self, TiffBuilder, Value};
use pixmeta::{Category, analyze};

type Dms = [(u32, u32); 3];

fn ascii(s: &str) -> Value {
    Value::Ascii(s.to_string())
}

fn gps_tiff(order: ByteOrder, lat_ref: &str, lon_ref: &str, lat: Dms, lon: Dms) -> Vec<u8> {
    TiffBuilder::new(order)
        .gps(0x0001, ascii(lat_ref))
        .gps(0x0002, Value::Rational(lat.to_vec()))
        .gps(0x0003, ascii(lon_ref))
        .gps(0x0004, Value::Rational(lon.to_vec()))
        .build()
}

const LAT: Dms = [(51, 1), (30, 1), (2613, 100)];
const LON: Dms = [(0, 1), (7, 1), (3984, 100)];

#[test]
fn gps_reference_sets_sign() {
    let lat_abs = dms_to_decimal(LAT);
    let lon_abs = dms_to_decimal(LON);
    for (lat_ref, lon_ref, lat_sign, lon_sign) in [
        ("N", "E", 1.0, 1.0),
        ("S", "E", -1.0, 1.0),
        ("N", "W", 1.0, -1.0),
        ("S", "W", -1.0, -1.0),
    ] {
        for order in [ByteOrder::LittleEndian, ByteOrder::BigEndian] {
            let tiff = gps_tiff(order, lat_ref, lon_ref, LAT, LON);
            let c = decode_tiff(&tiff, 0).unwrap().gps.signed().unwrap();
            assert_eq!(c.latitude, lat_sign * lat_abs, "{lat_ref}{lon_ref}");
            assert_eq!(c.longitude, lon_sign * lon_abs, "{lat_ref}{lon_ref}");
        }
    }
}

#[test]
fn missing_reference_leaves_value_unsigned() {
    let tiff = TiffBuilder::new(ByteOrder::BigEndian)
        .gps(0x0002, Value::Rational(LAT.to_vec()))
        .gps(0x0004, Value::Rational(LON.to_vec()))
        .build();
    let c = decode_tiff(&tiff, 0).unwrap().gps.signed().unwrap();
    assert_eq!(c.latitude, dms_to_decimal(LAT));
    assert_eq!(c.longitude, dms_to_decimal(LON));
}

#[test]
fn dms_conversion_is_stable_across_reencoding() {
    let first = dms_to_decimal(LAT);
    let le = decode_tiff(&gps_tiff(ByteOrder::LittleEndian, "N", "E", LAT, LON), 0).unwrap();
    let be = decode_tiff(&gps_tiff(ByteOrder::BigEndian, "N", "E", LAT, LON), 0).unwrap();
    let again = decode_tiff(&gps_tiff(ByteOrder::LittleEndian, "N", "E", LAT, LON), 0).unwrap();

    let lat = |m: &pixmeta::exif::TiffMetadata| m.gps.signed().unwrap().latitude;
    assert!((lat(&le) - first).abs() < 1e-12);
    assert!((lat(&be) - first).abs() < 1e-12);
    assert_eq!(lat(&le), lat(&again));
}

#[test]
fn byte_order_marker_governs_every_field() {
    const WIDTH: u16 = 0x0102;
    const HEIGHT: u32 = 0x0102_0304;
    for order in [ByteOrder::LittleEndian, ByteOrder::BigEndian] {
        let tiff = TiffBuilder::new(order)
            .root(0x0100, Value::Short(vec![WIDTH]))
            .root(0x0101, Value::Long(vec![HEIGHT]))
            .build();
        let meta = decode_tiff(&tiff, 0).unwrap();
        let value = |tag: &str| {
            meta.entries
                .iter()
                .find(|e| e.tag() == tag)
                .map(|e| e.value().to_string())
        };
        let height = || value("ImageLength").or_else(|| value("ImageHeight"));
        assert_eq!(value("ImageWidth"), Some(WIDTH.to_string()));
        assert_eq!(height(), Some(HEIGHT.to_string()));

        // the same bytes read in the other order give a different number
        assert_ne!(WIDTH.swap_bytes(), WIDTH);
        assert_ne!(value("ImageWidth"), Some(WIDTH.swap_bytes().to_string()));
        assert_ne!(height(), Some(HEIGHT.swap_bytes().to_string()));
    }
}

fn encode_png(img: &DynamicImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn color_name(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 | ColorType::L16 => "Grayscale",
        ColorType::La8 | ColorType::La16 => "Grayscale+Alpha",
        ColorType::Rgb8 | ColorType::Rgb16 => "RGB",
        ColorType::Rgba8 | ColorType::Rgba16 => "RGBA",
        other => panic!("unexpected PNG color type {other:?}"),
    }
}

#[test]
fn png_header_matches_reference_decoder() {
    let images = [
        DynamicImage::new_luma8(7, 3),
        DynamicImage::new_luma_a8(1, 1),
        DynamicImage::new_rgb8(31, 17),
        DynamicImage::new_rgba8(640, 2),
        DynamicImage::new_rgb16(5, 9),
        DynamicImage::new_luma16(300, 1),
    ];
    for img in &images {
        let bytes = encode_png(img);
        let reference = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        let color = reference.color();
        let depth = color.bits_per_pixel() / color.channel_count() as u16;

        let report = analyze(&bytes, &test_support::attributes("ref.png", &bytes, "image/png"));
        assert_eq!(report.get("ImageWidth"), Some(reference.width().to_string().as_str()));
        assert_eq!(report.get("ImageHeight"), Some(reference.height().to_string().as_str()));
        assert_eq!(report.get("BitDepth"), Some(depth.to_string().as_str()));
        assert_eq!(report.get("ColorType"), Some(color_name(color)));
    }
}

fn fixtures() -> Vec<Vec<u8>> {
    let tiff = TiffBuilder::new(ByteOrder::BigEndian)
        .root(0x010F, ascii("Acme"))
        .root(0x0110, ascii("Model 1"))
        .exif(0x9003, ascii("2024:01:01 12:00:00"))
        .exif(0x829A, Value::Rational(vec![(1, 250)]))
        .gps(0x0001, ascii("S"))
        .gps(0x0002, Value::Rational(LAT.to_vec()))
        .gps(0x0003, ascii("W"))
        .gps(0x0004, Value::Rational(LON.to_vec()))
        .build();
    let png = encode_png(&DynamicImage::new_rgb8(4, 4));
    let mut vp8 = vec![0x10, 0x02, 0x00, 0x9D, 0x01, 0x2A];
    vp8.extend(4u16.to_le_bytes());
    vp8.extend(4u16.to_le_bytes());
    vec![
        test_support::jpeg(Some(&tiff), 4, 4),
        png,
        test_support::webp(&[(b"VP8 ", vp8), (b"EXIF", tiff.clone()), (b"XMP ", b"<x/>".to_vec())]),
        test_support::gif(3, 4),
    ]
}

#[test]
fn truncation_never_panics_and_keeps_file_entries() {
    for fixture in fixtures() {
        for len in 0..=fixture.len() {
            let slice = &fixture[..len];
            let report = analyze(slice, &test_support::attributes("cut", slice, "image/jpeg"));
            assert!(report.entries.len() >= 4);
            assert!(report.entries[..4].iter().all(|e| e.category() == Category::File));
        }
    }
}

#[test]
fn truncated_exif_keeps_earlier_entries() {
    let fixture = &fixtures()[0];
    let full = analyze(fixture, &test_support::attributes("full", fixture, "image/jpeg"));
    assert!(full.coordinates.is_some());
    let full_len = full.entries.len();
    // shorter prefixes never produce more entries than the whole file
    for len in 0..fixture.len() {
        let slice = &fixture[..len];
        let report = analyze(slice, &test_support::attributes("cut", slice, "image/jpeg"));
        assert!(report.entries.len() <= full_len, "prefix {len}");
    }
}
