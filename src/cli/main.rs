use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use pixmeta::metadata::{MetadataEntry, Report};
use pixmeta::{config, pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "pixmeta",
    version,
    about = "Inspect JPEG, PNG, WebP and GIF metadata: EXIF, GPS, text chunks, animation and more"
)]
struct Cli {
    /// Image files or directories to inspect
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Print entries as one list instead of grouping by category
    #[arg(long)]
    flat: bool,

    /// Write a metadata-free copy next to each image
    #[arg(long)]
    strip: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No input files or directories specified. Use --help for usage.");
    }

    let mut config = config::Config::load(cli.config.as_deref())?;
    if cli.flat {
        config.display.group_by_category = false;
    }

    let images = pipeline::collect_images(&cli.paths, &config.scan);
    if images.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }
    log::info!("Found {} image(s) to inspect", images.len());

    let style = Style::new(&config.display);
    let total = images.len();
    let mut results = Vec::with_capacity(total);
    let mut stripped = 0usize;

    for (i, image_path) in images.iter().enumerate() {
        log::debug!("[{}/{}] Inspecting: {}", i + 1, total, image_path.display());
        let result = pipeline::inspect_path(image_path);

        if !cli.json {
            match (&result.report, &result.error) {
                (Some(report), _) => style.print_report(image_path, report),
                (None, Some(err)) => log::error!("  Error: {err}"),
                (None, None) => {}
            }
        }

        if cli.strip && result.error.is_none() {
            match pipeline::strip_file(image_path, &config.strip) {
                Ok(Some(output)) => {
                    stripped += 1;
                    log::info!("  Stripped copy: {}", output.display());
                }
                Ok(None) => {}
                Err(e) => log::error!("Failed to strip {}: {e:#}", image_path.display()),
            }
        }

        results.push(result);
    }

    // JSON output
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    // Summary
    let success = results.iter().filter(|r| r.error.is_none()).count();
    let failed = total - success;
    log::info!("Done: {success} inspected, {failed} failed out of {total} images");
    if cli.strip {
        log::info!("Stripped {stripped} of {success} images");
    }

    Ok(())
}

// ANSI color codes
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Indent for continuation lines (tag column width + " : " = 25 chars + 2 leading spaces).
const INDENT: &str = "                           ";

/// Terminal styling resolved from the display config.
struct Style {
    bold: &'static str,
    dim: &'static str,
    reset: &'static str,
    grouped: bool,
    value_width: usize,
}

impl Style {
    fn new(display: &config::DisplayConfig) -> Self {
        let (bold, dim, reset) = if display.color {
            (BOLD, DIM, RESET)
        } else {
            ("", "", "")
        };
        Self {
            bold,
            dim,
            reset,
            grouped: display.group_by_category,
            value_width: display.value_width.max(8),
        }
    }

    /// Print one file's report, grouped by category or flat.
    fn print_report(&self, path: &std::path::Path, report: &Report) {
        let Self { bold, dim, reset, .. } = self;

        println!();
        println!("{bold}File:{reset} {}", path.display());
        println!("{dim}{}{reset}", "═".repeat(72));

        if report.format.is_none() {
            println!("  {dim}(unrecognised image format){reset}");
        }

        if self.grouped {
            for (category, entries) in report.grouped() {
                println!("  {bold}{category}{reset}");
                println!("  {dim}{}{reset}", "─".repeat(70));
                for entry in entries {
                    self.print_row(entry);
                }
                println!();
            }
        } else {
            for entry in &report.entries {
                self.print_row(entry);
            }
            println!();
        }

        if let Some(c) = report.coordinates {
            println!(
                "  {bold}Location{reset} : {:.6}, {:.6}",
                c.latitude, c.longitude
            );
            println!();
        }
    }

    /// Print a single row in the metadata table.
    fn print_row(&self, entry: &MetadataEntry) {
        let tag_col = format!("{:<22}", entry.tag());
        let lines = wrap_text(entry.value(), self.value_width);
        for (i, line) in lines.iter().enumerate() {
            if i == 0 {
                println!("  {tag_col} : {line}");
            } else {
                println!("  {INDENT}{line}");
            }
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_text_breaks_on_words() {
        assert_eq!(wrap_text("a bb ccc dddd", 6), ["a bb", "ccc", "dddd"]);
    }

    #[test]
    fn wrap_text_keeps_blank_values() {
        assert_eq!(wrap_text("", 10), [""]);
    }

    #[test]
    fn cli_flags_parse() {
        let cli = Cli::parse_from(["pixmeta", "--json", "--flat", "-v", "a.jpg", "dir"]);
        assert!(cli.json && cli.flat && cli.verbose);
        assert!(!cli.strip);
        assert_eq!(cli.paths, [PathBuf::from("a.jpg"), PathBuf::from("dir")]);
    }
}
