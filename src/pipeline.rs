use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{ScanConfig, StripConfig};
use crate::metadata::{self, FileAttributes, Report};

/// Supported image extensions.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jpe", "jfif",
    "png",
    "webp",
    "gif",
];

/// Declared MIME type for a path, from its extension alone.
///
/// The engine never trusts this for parsing; it is only reported as the
/// `MimeType` file entry.
///
/// # Example
///
/// ```rust
/// use pixmeta::pipeline::mime_type_for;
/// use std::path::Path;
///
/// assert_eq!(mime_type_for(Path::new("photo.JPG")), "image/jpeg");
/// assert_eq!(mime_type_for(Path::new("notes.txt")), "application/octet-stream");
/// ```
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" | "jpe" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// The outcome of inspecting one file.
///
/// Serializes as `{path, format, entries, coordinates, error}`; the report
/// fields are absent when the file could not be read.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    pub path: PathBuf,
    #[serde(flatten)]
    pub report: Option<Report>,
    pub error: Option<String>,
}

/// Collect supported image files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// according to `scan` (recursion depth, symlink following), in file-name
/// order. Only files with supported image extensions are included.
///
/// # Example
///
/// ```rust,no_run
/// use pixmeta::config::ScanConfig;
/// use pixmeta::pipeline::collect_images;
/// use std::path::PathBuf;
///
/// let images = collect_images(
///     &[
///         PathBuf::from("photo.jpg"), // single file
///         PathBuf::from("./photos/"), // entire directory
///     ],
///     &ScanConfig::default(),
/// );
/// println!("Found {} images", images.len());
/// ```
pub fn collect_images(paths: &[PathBuf], scan: &ScanConfig) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported_image(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            let mut walker = WalkDir::new(path)
                .follow_links(scan.follow_links)
                .sort_by_file_name();
            if !scan.recursive {
                walker = walker.max_depth(1);
            }
            for entry in walker.into_iter().filter_map(|e| e.ok()) {
                let p = entry.path();
                if p.is_file() && is_supported_image(p) {
                    images.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Check if a file has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Stat a file into the attributes reported under `File`.
pub fn file_attributes(path: &Path) -> Result<FileAttributes> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(FileAttributes {
        name,
        size: meta.len(),
        mime_type: mime_type_for(path).to_string(),
        modified: meta.modified().ok().map(DateTime::<Local>::from),
    })
}

/// Read a file and extract its metadata report.
///
/// Only I/O can fail here; a damaged or unrecognised image still produces a
/// report holding at least the file entries.
///
/// # Example
///
/// ```rust,no_run
/// use pixmeta::pipeline::inspect_file;
///
/// let report = inspect_file("photo.jpg".as_ref()).unwrap();
/// for entry in &report.entries {
///     println!("{}: {}", entry.tag(), entry.value());
/// }
/// if let Some(c) = report.coordinates {
///     println!("Taken at {}, {}", c.latitude, c.longitude);
/// }
/// ```
pub fn inspect_file(path: &Path) -> Result<Report> {
    let attributes = file_attributes(path)?;
    let buffer =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    log::debug!("Inspecting {} ({} bytes)", path.display(), buffer.len());
    Ok(metadata::analyze(&buffer, &attributes))
}

/// Inspect a file, folding any I/O error into the result.
pub fn inspect_path(path: &Path) -> InspectResult {
    match inspect_file(path) {
        Ok(report) => InspectResult {
            path: path.to_path_buf(),
            report: Some(report),
            error: None,
        },
        Err(e) => {
            log::warn!("{}: {e:#}", path.display());
            InspectResult {
                path: path.to_path_buf(),
                report: None,
                error: Some(format!("{e:#}")),
            }
        }
    }
}

/// Output path for a stripped copy: `photo.jpg` + `_clean` -> `photo_clean.jpg`.
pub fn stripped_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    path.with_file_name(name)
}

/// Write a metadata-free copy of `input` to `output`.
///
/// The raster is decoded, copied into a fresh pixel buffer and re-encoded in
/// the format implied by `output`'s extension, so no container metadata
/// survives. JPEG output drops the alpha channel.
pub fn strip_metadata(input: &Path, output: &Path) -> Result<()> {
    let format = ImageFormat::from_path(output)
        .with_context(|| format!("Unsupported output format: {}", output.display()))?;
    let decoded =
        image::open(input).with_context(|| format!("Failed to decode {}", input.display()))?;

    let clean = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(decoded.to_rgb8()),
        _ => DynamicImage::ImageRgba8(decoded.to_rgba8()),
    };
    clean
        .save_with_format(output, format)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    log::debug!("Stripped copy written: {}", output.display());
    Ok(())
}

/// Strip `path` into its sibling output per `config`. Returns the output
/// path, or `None` when an existing output was left alone.
pub fn strip_file(path: &Path, config: &StripConfig) -> Result<Option<PathBuf>> {
    let output = stripped_path(path, &config.suffix);
    if output.exists() && !config.overwrite {
        log::warn!(
            "Skipping strip, output exists: {} (set strip.overwrite to replace)",
            output.display()
        );
        return Ok(None);
    }
    strip_metadata(path, &output)?;
    Ok(Some(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Category;
    use crate::test_support;
    use std::fs;
    use tempfile::TempDir;

    // ── mime_type_for ────────────────────────────────────────────────

    #[test]
    fn mime_types() {
        assert_eq!(mime_type_for(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("a.JPEG")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("a.png")), "image/png");
        assert_eq!(mime_type_for(Path::new("a.webp")), "image/webp");
        assert_eq!(mime_type_for(Path::new("a.gif")), "image/gif");
    }

    #[test]
    fn mime_type_fallback() {
        assert_eq!(mime_type_for(Path::new("noext")), "application/octet-stream");
        assert_eq!(mime_type_for(Path::new("a.heic")), "application/octet-stream");
    }

    // ── is_supported_image ───────────────────────────────────────────

    #[test]
    fn supported_image_extensions() {
        assert!(is_supported_image(Path::new("photo.jpg")));
        assert!(is_supported_image(Path::new("photo.JPEG")));
        assert!(is_supported_image(Path::new("photo.png")));
        assert!(is_supported_image(Path::new("photo.webp")));
        assert!(is_supported_image(Path::new("anim.gif")));
    }

    #[test]
    fn unsupported_image_extensions() {
        assert!(!is_supported_image(Path::new("doc.pdf")));
        assert!(!is_supported_image(Path::new("scan.tiff")));
        assert!(!is_supported_image(Path::new("readme.txt")));
        assert!(!is_supported_image(Path::new("noext")));
    }

    // ── collect_images ───────────────────────────────────────────────

    #[test]
    fn collect_images_single_file() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("test.jpg");
        fs::write(&jpg, b"fake").unwrap();

        let images = collect_images(&[jpg.clone()], &ScanConfig::default());
        assert_eq!(images, vec![jpg]);
    }

    #[test]
    fn collect_images_skips_unsupported() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("readme.txt");
        fs::write(&txt, b"hello").unwrap();

        assert!(collect_images(&[txt], &ScanConfig::default()).is_empty());
    }

    #[test]
    fn collect_images_directory_recursive() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        fs::write(dir.path().join("a.jpg"), b"fake").unwrap();
        fs::write(sub.join("b.png"), b"fake").unwrap();
        fs::write(sub.join("c.txt"), b"fake").unwrap();

        let images = collect_images(&[dir.path().to_path_buf()], &ScanConfig::default());
        assert_eq!(images.len(), 2);
    }

    #[test]
    fn collect_images_not_recursive() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(dir.path().join("b.gif"), b"fake").unwrap();
        fs::write(dir.path().join("a.webp"), b"fake").unwrap();
        fs::write(sub.join("deep.png"), b"fake").unwrap();

        let scan = ScanConfig {
            recursive: false,
            ..ScanConfig::default()
        };
        let images = collect_images(&[dir.path().to_path_buf()], &scan);
        assert_eq!(
            images,
            vec![dir.path().join("a.webp"), dir.path().join("b.gif")]
        );
    }

    #[test]
    fn collect_images_nonexistent_path() {
        let images = collect_images(&[PathBuf::from("/nonexistent/path")], &ScanConfig::default());
        assert!(images.is_empty());
    }

    // ── inspect ──────────────────────────────────────────────────────

    #[test]
    fn inspect_file_reports_file_entries_first() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shot.jpg");
        fs::write(&path, test_support::jpeg(None, 12, 34)).unwrap();

        let report = inspect_file(&path).unwrap();
        let tags: Vec<&str> = report.entries.iter().take(4).map(|e| e.tag()).collect();
        assert_eq!(tags, ["FileName", "FileSize", "MimeType", "LastModified"]);
        assert!(report.entries[..4].iter().all(|e| e.category() == Category::File));
        assert_eq!(report.get("FileName"), Some("shot.jpg"));
        assert_eq!(report.get("MimeType"), Some("image/jpeg"));
        assert_ne!(report.get("LastModified"), Some("Unknown"));
        assert_eq!(report.get("Format"), Some("JPEG"));
        assert_eq!(report.get("ImageWidth"), Some("12"));
    }

    #[test]
    fn inspect_file_trusts_bytes_not_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("really_a_gif.png");
        fs::write(&path, b"GIF87a\x02\x00\x03\x00\x00\x00\x00\x3b").unwrap();

        let report = inspect_file(&path).unwrap();
        assert_eq!(report.get("MimeType"), Some("image/png"));
        assert_eq!(report.get("Format"), Some("GIF"));
    }

    #[test]
    fn inspect_path_missing_file() {
        let result = inspect_path(Path::new("/nonexistent/photo.jpg"));
        assert!(result.report.is_none());
        assert!(result.error.unwrap().contains("Failed to stat"));
    }

    #[test]
    fn inspect_result_json_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.gif");
        fs::write(&path, b"GIF89a\x01\x00\x01\x00\x00\x00\x00\x3b").unwrap();

        let json = serde_json::to_value(inspect_path(&path)).unwrap();
        assert_eq!(json["format"], "Gif");
        assert!(json["entries"].is_array());
        assert!(json["coordinates"].is_null());
        assert!(json["error"].is_null());
    }

    // ── strip ────────────────────────────────────────────────────────

    #[test]
    fn stripped_path_keeps_extension() {
        assert_eq!(
            stripped_path(Path::new("/tmp/photo.jpg"), "_clean"),
            PathBuf::from("/tmp/photo_clean.jpg")
        );
        assert_eq!(
            stripped_path(Path::new("noext"), "_s"),
            PathBuf::from("noext_s")
        );
    }

    #[test]
    fn strip_png_drops_text_chunks() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.png");
        image::RgbaImage::from_pixel(5, 3, image::Rgba([10, 20, 30, 255]))
            .save(&input)
            .unwrap();

        // splice a tEXt chunk in after IHDR (8-byte signature + 25-byte chunk)
        let mut bytes = fs::read(&input).unwrap();
        let text = test_support::png_chunk(b"tEXt", b"Author\0Someone");
        bytes.splice(33..33, text);
        fs::write(&input, &bytes).unwrap();
        assert_eq!(inspect_file(&input).unwrap().get("Author"), Some("Someone"));

        let output = strip_file(&input, &StripConfig::default()).unwrap().unwrap();
        assert_eq!(output, dir.path().join("in_stripped.png"));

        let report = inspect_file(&output).unwrap();
        assert_eq!(report.get("Author"), None);
        assert_eq!(report.get("ImageWidth"), Some("5"));
        assert_eq!(report.get("ImageHeight"), Some("3"));
    }

    #[test]
    fn strip_respects_overwrite() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.png");
        image::RgbImage::new(2, 2).save(&input).unwrap();
        let existing = dir.path().join("in_stripped.png");
        fs::write(&existing, b"keep").unwrap();

        assert_eq!(strip_file(&input, &StripConfig::default()).unwrap(), None);
        assert_eq!(fs::read(&existing).unwrap(), b"keep");

        let config = StripConfig {
            overwrite: true,
            ..StripConfig::default()
        };
        assert_eq!(strip_file(&input, &config).unwrap(), Some(existing.clone()));
        assert_ne!(fs::read(&existing).unwrap(), b"keep");
    }

    #[test]
    fn strip_rejects_undecodable_input() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("bad.jpg");
        fs::write(&input, b"not an image").unwrap();
        assert!(strip_metadata(&input, &dir.path().join("out.jpg")).is_err());
    }
}
