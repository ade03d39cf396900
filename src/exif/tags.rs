//! Tag dictionary for the three TIFF directory namespaces.
//!
//! The root IFD, the EXIF sub-IFD and the GPS sub-IFD each get their own
//! table. The GPS directory reuses the numbers `0x0000..=0x001f` for unrelated
//! meanings, so lookups always name the namespace being walked.

use std::borrow::Cow;

use crate::metadata::Category;

// Sub-IFD pointer tags (root IFD)
pub const TAG_EXIF_IFD_POINTER: u16 = 0x8769;
pub const TAG_GPS_IFD_POINTER: u16 = 0x8825;

// GPS coordinate tags (GPS IFD)
pub const TAG_GPS_LATITUDE_REF: u16 = 0x0001;
pub const TAG_GPS_LATITUDE: u16 = 0x0002;
pub const TAG_GPS_LONGITUDE_REF: u16 = 0x0003;
pub const TAG_GPS_LONGITUDE: u16 = 0x0004;

/// Which directory a tag was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagNamespace {
    /// IFD0 / IFD1
    Root,
    /// EXIF sub-IFD (`0x8769`)
    Exif,
    /// GPS sub-IFD (`0x8825`)
    Gps,
}

impl TagNamespace {
    /// Category given to tags the dictionary does not know.
    pub fn default_category(self) -> Category {
        match self {
            Self::Root => Category::Image,
            Self::Exif => Category::Exif,
            Self::Gps => Category::Gps,
        }
    }
}

/// Display name and category of a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub name: Cow<'static, str>,
    pub category: Category,
}

/// Resolve a tag in the given namespace. Always succeeds.
pub fn resolve(namespace: TagNamespace, tag: u16) -> TagInfo {
    let known = match namespace {
        TagNamespace::Root => root_tag(tag),
        TagNamespace::Exif => exif_tag(tag),
        TagNamespace::Gps => gps_tag(tag).map(|name| (name, Category::Gps)),
    };

    match known {
        Some((name, category)) => TagInfo {
            name: Cow::Borrowed(name),
            category,
        },
        None => {
            let name = match namespace {
                TagNamespace::Gps => format!("GPSTag_0x{tag:04x}"),
                _ => format!("Tag_0x{tag:04x}"),
            };
            TagInfo {
                name: Cow::Owned(name),
                category: namespace.default_category(),
            }
        }
    }
}

fn root_tag(tag: u16) -> Option<(&'static str, Category)> {
    use Category::*;
    let entry = match tag {
        0x00FE => ("NewSubfileType", Image),
        0x0100 => ("ImageWidth", Image),
        0x0101 => ("ImageHeight", Image),
        0x0102 => ("BitsPerSample", Image),
        0x0103 => ("Compression", Image),
        0x0106 => ("PhotometricInterpretation", Image),
        0x010E => ("ImageDescription", Image),
        0x010F => ("Make", Camera),
        0x0110 => ("Model", Camera),
        0x0111 => ("StripOffsets", Image),
        0x0112 => ("Orientation", Image),
        0x0115 => ("SamplesPerPixel", Image),
        0x0116 => ("RowsPerStrip", Image),
        0x0117 => ("StripByteCounts", Image),
        0x011A => ("XResolution", Image),
        0x011B => ("YResolution", Image),
        0x011C => ("PlanarConfiguration", Image),
        0x0128 => ("ResolutionUnit", Image),
        0x0131 => ("Software", Camera),
        0x0132 => ("DateTime", DateTime),
        0x013B => ("Artist", Author),
        0x013E => ("WhitePoint", Image),
        0x013F => ("PrimaryChromaticities", Image),
        0x0201 => ("JPEGInterchangeFormat", Image),
        0x0202 => ("JPEGInterchangeFormatLength", Image),
        0x0211 => ("YCbCrCoefficients", Image),
        0x0213 => ("YCbCrPositioning", Image),
        0x0214 => ("ReferenceBlackWhite", Image),
        0x8298 => ("Copyright", Author),
        0x9C9B => ("XPTitle", Author),
        0x9C9C => ("XPComment", Author),
        0x9C9D => ("XPAuthor", Author),
        0x9C9E => ("XPKeywords", Author),
        0x9C9F => ("XPSubject", Author),
        _ => return None,
    };
    Some(entry)
}

fn exif_tag(tag: u16) -> Option<(&'static str, Category)> {
    use Category::*;
    let entry = match tag {
        0x829A => ("ExposureTime", Exif),
        0x829D => ("FNumber", Exif),
        0x8822 => ("ExposureProgram", Exif),
        0x8824 => ("SpectralSensitivity", Exif),
        0x8827 => ("ISOSpeedRatings", Exif),
        0x8830 => ("SensitivityType", Exif),
        0x9000 => ("ExifVersion", Exif),
        0x9003 => ("DateTimeOriginal", DateTime),
        0x9004 => ("DateTimeDigitized", DateTime),
        0x9010 => ("OffsetTime", DateTime),
        0x9011 => ("OffsetTimeOriginal", DateTime),
        0x9012 => ("OffsetTimeDigitized", DateTime),
        0x9101 => ("ComponentsConfiguration", Exif),
        0x9102 => ("CompressedBitsPerPixel", Exif),
        0x9201 => ("ShutterSpeedValue", Exif),
        0x9202 => ("ApertureValue", Exif),
        0x9203 => ("BrightnessValue", Exif),
        0x9204 => ("ExposureBiasValue", Exif),
        0x9205 => ("MaxApertureValue", Exif),
        0x9206 => ("SubjectDistance", Exif),
        0x9207 => ("MeteringMode", Exif),
        0x9208 => ("LightSource", Exif),
        0x9209 => ("Flash", Exif),
        0x920A => ("FocalLength", Exif),
        0x9214 => ("SubjectArea", Exif),
        0x927C => ("MakerNote", Exif),
        0x9286 => ("UserComment", Author),
        0x9290 => ("SubSecTime", DateTime),
        0x9291 => ("SubSecTimeOriginal", DateTime),
        0x9292 => ("SubSecTimeDigitized", DateTime),
        0xA000 => ("FlashpixVersion", Exif),
        0xA001 => ("ColorSpace", Exif),
        0xA002 => ("PixelXDimension", Image),
        0xA003 => ("PixelYDimension", Image),
        0xA004 => ("RelatedSoundFile", Exif),
        0xA005 => ("InteroperabilityOffset", Exif),
        0xA20E => ("FocalPlaneXResolution", Exif),
        0xA20F => ("FocalPlaneYResolution", Exif),
        0xA210 => ("FocalPlaneResolutionUnit", Exif),
        0xA215 => ("ExposureIndex", Exif),
        0xA217 => ("SensingMethod", Exif),
        0xA300 => ("FileSource", Exif),
        0xA301 => ("SceneType", Exif),
        0xA302 => ("CFAPattern", Exif),
        0xA401 => ("CustomRendered", Exif),
        0xA402 => ("ExposureMode", Exif),
        0xA403 => ("WhiteBalance", Exif),
        0xA404 => ("DigitalZoomRatio", Exif),
        0xA405 => ("FocalLengthIn35mmFilm", Exif),
        0xA406 => ("SceneCaptureType", Exif),
        0xA407 => ("GainControl", Exif),
        0xA408 => ("Contrast", Exif),
        0xA409 => ("Saturation", Exif),
        0xA40A => ("Sharpness", Exif),
        0xA40C => ("SubjectDistanceRange", Exif),
        0xA420 => ("ImageUniqueID", Exif),
        0xA430 => ("CameraOwnerName", Author),
        0xA431 => ("BodySerialNumber", Camera),
        0xA432 => ("LensSpecification", Camera),
        0xA433 => ("LensMake", Camera),
        0xA434 => ("LensModel", Camera),
        0xA435 => ("LensSerialNumber", Camera),
        _ => return None,
    };
    Some(entry)
}

fn gps_tag(tag: u16) -> Option<&'static str> {
    let name = match tag {
        0x0000 => "GPSVersionID",
        0x0001 => "GPSLatitudeRef",
        0x0002 => "GPSLatitude",
        0x0003 => "GPSLongitudeRef",
        0x0004 => "GPSLongitude",
        0x0005 => "GPSAltitudeRef",
        0x0006 => "GPSAltitude",
        0x0007 => "GPSTimeStamp",
        0x0008 => "GPSSatellites",
        0x0009 => "GPSStatus",
        0x000A => "GPSMeasureMode",
        0x000B => "GPSDOP",
        0x000C => "GPSSpeedRef",
        0x000D => "GPSSpeed",
        0x000E => "GPSTrackRef",
        0x000F => "GPSTrack",
        0x0010 => "GPSImgDirectionRef",
        0x0011 => "GPSImgDirection",
        0x0012 => "GPSMapDatum",
        0x0013 => "GPSDestLatitudeRef",
        0x0014 => "GPSDestLatitude",
        0x0015 => "GPSDestLongitudeRef",
        0x0016 => "GPSDestLongitude",
        0x0017 => "GPSDestBearingRef",
        0x0018 => "GPSDestBearing",
        0x0019 => "GPSDestDistanceRef",
        0x001A => "GPSDestDistance",
        0x001B => "GPSProcessingMethod",
        0x001C => "GPSAreaInformation",
        0x001D => "GPSDateStamp",
        0x001E => "GPSDifferential",
        0x001F => "GPSHPositioningError",
        _ => return None,
    };
    Some(name)
}
