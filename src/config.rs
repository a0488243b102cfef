//! Pack configuration module.
//!
//! Handles loading, validating, and merging `pack.toml`. Stock defaults are
//! serialized to a TOML table, the user's file is merged on top key by key,
//! and the result is deserialized and validated.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [grid]
//! columns = 6               # Cells across the composite
//! rows = 4                  # Cells down the composite
//! corner_radius = 0.0       # Rounded-corner mask, fraction of the shorter cell side
//!
//! [banner]
//! width = 750
//! height = 400
//!
//! [logo]
//! width = 240
//! height = 240
//!
//! [encoding]
//! format = "png"            # png | jpeg | webp | avif
//! quality = 90              # 1-100, lossy formats only
//!
//! [package]
//! archive_name = "meme_pack.zip"
//! sticker_dir = "stickers"
//! attribution = "Created with meme-pack"
//!
//! [generator]
//! endpoint = "https://generativelanguage.googleapis.com/v1beta"
//! image_model = "gemini-2.5-flash-image"
//! text_model = "gemini-2.5-flash"
//! api_key_env = "GEMINI_API_KEY"
//! timeout_secs = 120
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::rust_backend::MAX_CANVAS_SIDE;
use crate::imaging::{EncodeOptions, GridSpec, OutputFormat, Quality, SliceOptions};
use crate::naming::MAX_CELLS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pack configuration loaded from `pack.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackConfig {
    /// Composite grid layout and cosmetic corner mask.
    pub grid: GridConfig,
    /// Banner target size.
    pub banner: BannerConfig,
    /// Logo target size.
    pub logo: LogoConfig,
    /// Output format for slices, banner and logo.
    pub encoding: EncodingConfig,
    /// Archive naming and manifest text.
    pub package: PackageConfig,
    /// Generative API endpoint, models and credentials.
    pub generator: GeneratorConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl PackConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.columns == 0 || self.grid.rows == 0 {
            return Err(ConfigError::Validation(
                "grid.columns and grid.rows must be non-zero".into(),
            ));
        }
        if self.grid.columns.saturating_mul(self.grid.rows) > MAX_CELLS {
            return Err(ConfigError::Validation(format!(
                "grid must have at most {} cells",
                MAX_CELLS
            )));
        }
        if !(0.0..=0.5).contains(&self.grid.corner_radius) {
            return Err(ConfigError::Validation(
                "grid.corner_radius must be 0.0-0.5".into(),
            ));
        }
        for (name, (w, h)) in [("banner", self.banner_size()), ("logo", self.logo_size())] {
            if w == 0 || h == 0 || w > MAX_CANVAS_SIDE || h > MAX_CANVAS_SIDE {
                return Err(ConfigError::Validation(format!(
                    "{name}.width and {name}.height must be 1-{MAX_CANVAS_SIDE}"
                )));
            }
        }
        if !(1..=100).contains(&self.encoding.quality) {
            return Err(ConfigError::Validation(
                "encoding.quality must be 1-100".into(),
            ));
        }
        if self.package.archive_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "package.archive_name must not be empty".into(),
            ));
        }
        if self.generator.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "generator.timeout_secs must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn grid_spec(&self) -> GridSpec {
        GridSpec::new(self.grid.columns, self.grid.rows)
    }

    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            format: self.encoding.format,
            quality: Quality::new(self.encoding.quality),
        }
    }

    pub fn slice_options(&self) -> SliceOptions {
        SliceOptions {
            corner_radius: self.grid.corner_radius,
            encode: self.encode_options(),
        }
    }

    pub fn banner_size(&self) -> (u32, u32) {
        (self.banner.width, self.banner.height)
    }

    pub fn logo_size(&self) -> (u32, u32) {
        (self.logo.width, self.logo.height)
    }
}

/// Composite grid settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    pub columns: u32,
    pub rows: u32,
    /// Rounded-corner mask radius as a fraction of the shorter cell side.
    /// `0.0` keeps slices fully rectangular.
    pub corner_radius: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 6,
            rows: 4,
            corner_radius: 0.0,
        }
    }
}

/// Banner target size in pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BannerConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            width: 750,
            height: 400,
        }
    }
}

/// Logo target size in pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogoConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            width: 240,
            height: 240,
        }
    }
}

/// Output encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    pub format: OutputFormat,
    /// Lossy encoding quality (1 = worst, 100 = best). Ignored for PNG/WebP.
    pub quality: u32,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            quality: 90,
        }
    }
}

/// Archive settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageConfig {
    /// File name of the downloadable archive.
    pub archive_name: String,
    /// Directory inside the archive that holds the slices.
    pub sticker_dir: String,
    /// Last line of `info.txt`.
    pub attribution: String,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            archive_name: "meme_pack.zip".to_string(),
            sticker_dir: "stickers".to_string(),
            attribution: "Created with meme-pack".to_string(),
        }
    }
}

/// Generative API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Base URL of the API, without the `/models/...` suffix.
    pub endpoint: String,
    /// Model used for the composite, banner and logo.
    pub image_model: String,
    /// Model used for the title/description.
    pub text_model: String,
    /// Environment variable holding the API key, read on first use.
    pub api_key_env: String,
    /// Fallback key when the environment variable is absent.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PackConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PackConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PackConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults when it
/// does not exist.
pub fn load_config(path: &Path) -> Result<PackConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `pack.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# meme-pack Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Composite grid
# ---------------------------------------------------------------------------
[grid]
# The composite image is cut into columns x rows equal cells (at most 99).
# Cells are floor(width / columns) x floor(height / rows); leftover pixels on
# the right and bottom edges are dropped.
columns = 6
rows = 4

# Rounded-corner mask for each slice, as a fraction of the shorter cell side
# (0.05 = 5%). 0 keeps slices fully rectangular.
corner_radius = 0.0

# ---------------------------------------------------------------------------
# Banner and logo (cover fit: scaled to fill, centre-cropped, no borders)
# ---------------------------------------------------------------------------
[banner]
width = 750
height = 400

[logo]
width = 240
height = 240

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[encoding]
# png | jpeg | webp | avif  (webp is lossless)
format = "png"

# Quality for lossy formats (1 = worst, 100 = best).
quality = 90

# ---------------------------------------------------------------------------
# Archive
# ---------------------------------------------------------------------------
[package]
archive_name = "meme_pack.zip"

# Slices are stored under this directory inside the archive.
sticker_dir = "stickers"

# Last line of info.txt.
attribution = "Created with meme-pack"

# ---------------------------------------------------------------------------
# Generative API
# ---------------------------------------------------------------------------
[generator]
endpoint = "https://generativelanguage.googleapis.com/v1beta"
image_model = "gemini-2.5-flash-image"
text_model = "gemini-2.5-flash"

# The key is read from this environment variable the first time it is needed.
api_key_env = "GEMINI_API_KEY"

# Fallback key used when the environment variable is not set.
# api_key = "..."

# Per-request timeout in seconds.
timeout_secs = 120

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
