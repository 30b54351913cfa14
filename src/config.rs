//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `listing-photos.toml`. Stock
//! defaults are the base layer; a user file overrides just the keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [encoding]
//! min_kib = 100          # Lower edge of the byte window
//! max_kib = 150          # Upper edge of the byte window
//! max_dimension = 2500   # Longer-edge cap before the quality search
//! max_attempts = 7       # Encode attempts before a forced stop
//!
//! [gallery]
//! capacity = 10          # 10 = full upload flow, 5 = simplified flow
//!
//! [watermark]
//! logo = "logo.png"      # Local path or data URL; http(s) is never fetched
//! scale = 0.30           # Logo width relative to photo width
//! opacity = 0.50         # Alpha of the logo layer
//! quality = 0.95         # JPEG quality of the composite
//! entity_prefix = "SH"
//! download_prefix = "Sheltershub_Property"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [gallery]
//! capacity = 5
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::gallery::Gallery;
use crate::imaging::{DecodeError, EncodingTarget, Quality};
use crate::source::ImageSource;
use crate::watermark::WatermarkSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "listing-photos.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `listing-photos.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Byte window and search budget of the re-encoder.
    pub encoding: EncodingConfig,
    /// Gallery capacity.
    pub gallery: GalleryConfig,
    /// Logo, blend and download naming.
    pub watermark: WatermarkConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    pub min_kib: usize,
    pub max_kib: usize,
    pub max_dimension: u32,
    pub max_attempts: u32,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            min_kib: EncodingTarget::MIN_BYTES / 1024,
            max_kib: EncodingTarget::MAX_BYTES / 1024,
            max_dimension: EncodingTarget::MAX_DIMENSION,
            max_attempts: EncodingTarget::MAX_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    pub capacity: usize,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            capacity: Gallery::FULL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkConfig {
    /// Logo reference: a path (relative to the config file) or a data URL.
    pub logo: String,
    pub scale: f64,
    pub opacity: f64,
    pub quality: f64,
    pub entity_prefix: String,
    pub download_prefix: String,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        let settings = WatermarkSettings::default();
        Self {
            logo: "logo.png".to_string(),
            scale: settings.scale,
            opacity: 0.50,
            quality: 0.95,
            entity_prefix: settings.entity_prefix,
            download_prefix: settings.download_prefix,
        }
    }
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let enc = &self.encoding;
        if enc.max_kib == 0 {
            return Err(ConfigError::Validation(
                "encoding.max_kib must be non-zero".into(),
            ));
        }
        if enc.min_kib > enc.max_kib {
            return Err(ConfigError::Validation(
                "encoding.min_kib must not exceed encoding.max_kib".into(),
            ));
        }
        if enc.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "encoding.max_dimension must be non-zero".into(),
            ));
        }
        if enc.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "encoding.max_attempts must be at least 1".into(),
            ));
        }
        if self.gallery.capacity == 0 {
            return Err(ConfigError::Validation(
                "gallery.capacity must be at least 1".into(),
            ));
        }
        let wm = &self.watermark;
        if !(wm.scale > 0.0 && wm.scale <= 1.0) {
            return Err(ConfigError::Validation(
                "watermark.scale must be in (0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&wm.opacity) {
            return Err(ConfigError::Validation(
                "watermark.opacity must be 0-1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&wm.quality) {
            return Err(ConfigError::Validation(
                "watermark.quality must be 0-1".into(),
            ));
        }
        Ok(())
    }

    pub fn encoding_target(&self) -> EncodingTarget {
        EncodingTarget {
            min_bytes: self.encoding.min_kib * 1024,
            max_bytes: self.encoding.max_kib * 1024,
            max_dimension: self.encoding.max_dimension,
            max_iterations: self.encoding.max_attempts,
        }
    }

    pub fn new_gallery(&self) -> Gallery {
        Gallery::new(self.gallery.capacity)
    }

    pub fn watermark_settings(&self) -> WatermarkSettings {
        let wm = &self.watermark;
        WatermarkSettings {
            scale: wm.scale,
            opacity: wm.opacity as f32,
            quality: Quality::new(wm.quality as f32),
            entity_prefix: wm.entity_prefix.clone(),
            download_prefix: wm.download_prefix.clone(),
        }
    }

    /// Resolve the logo reference. Relative paths are taken from `base_dir`.
    pub fn logo_source(&self, base_dir: &Path) -> Result<ImageSource, DecodeError> {
        match ImageSource::from_reference(&self.watermark.logo)? {
            ImageSource::File(path) if path.is_relative() => Ok(ImageSource::File(base_dir.join(path))),
            other => Ok(other),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
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
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `listing-photos.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock defaults.
pub fn load_config(dir: &Path) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(&dir.join(CONFIG_FILE_NAME))?;
    resolve_config(base, overlay)
}

/// Load config from an explicit file. The file must exist.
pub fn load_config_file(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value(), Some(overlay))
}

/// Returns a fully-commented stock `listing-photos.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Listing Photos Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Byte-budget re-encoding
# ---------------------------------------------------------------------------
[encoding]
# Target window for encoded photos, in KiB (1 KiB = 1024 bytes).
# Photos already at or below max_kib are kept as they are.
min_kib = 100
max_kib = 150

# Photos whose longer edge exceeds this are downscaled first.
max_dimension = 2500

# Encode attempts of the quality search before it stops where it is.
max_attempts = 7

# ---------------------------------------------------------------------------
# Gallery
# ---------------------------------------------------------------------------
[gallery]
# Photos per listing. 10 for the full upload flow, 5 for the simplified one.
# Extra photos in a batch are dropped without error.
capacity = 10

# ---------------------------------------------------------------------------
# Watermark
# ---------------------------------------------------------------------------
[watermark]
# Logo image: a path relative to this file, or a data: URL.
# http(s) references are never fetched; photos are shown unmarked instead.
logo = "logo.png"

# Logo width as a fraction of the photo width (0 < scale <= 1).
scale = 0.3

# Opacity of the logo layer (0 = invisible, 1 = opaque).
opacity = 0.5

# JPEG quality of the watermarked photo (0-1).
quality = 0.95

# Listing ids render as <entity_prefix>-<id padded to 3 digits>: SH-001.
entity_prefix = "SH"

# Downloads are named <download_prefix>_<listing id>_<position>.jpg.
download_prefix = "Sheltershub_Property"
"##
}
