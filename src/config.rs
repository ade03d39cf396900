use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the pixmeta CLI and library helpers.
///
/// Controls how reports are printed, how directories are scanned,
/// and where stripped copies are written.
///
/// # Loading
///
/// ```rust,no_run
/// use pixmeta::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.scan.recursive = false;
/// config.display.value_width = 60;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Report layout and styling.
    pub display: DisplayConfig,
    /// Directory traversal.
    pub scan: ScanConfig,
    /// Metadata-free copies written by `--strip`.
    pub strip: StripConfig,
}

/// How reports are printed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Print entries under category headings instead of one flat list.
    pub group_by_category: bool,
    /// Column at which long values wrap.
    pub value_width: usize,
    /// ANSI styling for headings and tag names.
    pub color: bool,
}

/// Which files a directory argument expands to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    /// Follow symbolic links while walking directories.
    pub follow_links: bool,
    /// Descend into subdirectories. If `false`, only direct children are inspected.
    pub recursive: bool,
}

/// Output naming for stripped copies.
///
/// # Example
///
/// ```rust
/// use pixmeta::config::StripConfig;
///
/// let strip = StripConfig {
///     suffix: "_clean".into(), // photo.jpg -> photo_clean.jpg
///     overwrite: false,        // keep an existing photo_clean.jpg
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StripConfig {
    /// Appended to the file stem of each stripped copy.
    pub suffix: String,
    /// If `true`, replace an existing output file. If `false`, skip it.
    pub overwrite: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            group_by_category: true,
            value_width: 46,
            color: true,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_links: false,
            recursive: true,
        }
    }
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            suffix: "_stripped".to_string(),
            overwrite: false,
        }
    }
}

impl Config {
    /// Resolve the config file path: `config.json` next to the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::debug!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }
}
