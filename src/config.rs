//! Configuration loading, validation and merging.
//!
//! Settings come from three layers, later layers winning key by key:
//!
//! ```text
//! stock defaults  →  bookblock.toml  →  command-line flags
//! ```
//!
//! All three are merged as raw `toml::Value`s with [`merge_toml`] (flags
//! arrive as [`ConfigOverrides`]) and validated once, after the last layer.
//! [`Settings::from_config`] then turns the strings into the typed values the
//! rest of the crate works with.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! pages = "0l"                  # Page specification, e.g. "0l,1-120lr,121l"
//! geometry = "600x800+10+20"    # Page bounding box, WIDTHxHEIGHT+LEFT+TOP
//! image_mode = "color"          # color | grayscale
//! view_mode = "scan"            # raw | scan | page
//! on_error = "abort"            # abort | continue
//!
//! [source]
//! dir = "/tmp"
//! file_format = "scan%03d.png"
//!
//! [target]
//! dir = "/tmp"
//! file_format = "page%03d.png"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::extract::{FailurePolicy, UndefinedFailurePolicy, UndefinedViewMode, ViewMode};
use crate::geometry::{Geometry, GeometryError};
use crate::imaging::{ImageMode, UndefinedImageMode};
use crate::naming::{Naming, NamingError, NamingTemplate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "bookblock.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    UndefinedImageMode(#[from] UndefinedImageMode),
    #[error(transparent)]
    UndefinedViewMode(#[from] UndefinedViewMode),
    #[error(transparent)]
    UndefinedFailurePolicy(#[from] UndefinedFailurePolicy),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Naming(#[from] NamingError),
}

/// Configuration as written in `bookblock.toml`.
///
/// Every field has a default; a config file only lists what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookblockConfig {
    /// Which scans and sides become pages.
    pub pages: String,
    /// Page bounding box relative to the scan half.
    pub geometry: String,
    /// `color` or `grayscale`.
    pub image_mode: String,
    /// `raw`, `scan` or `page`.
    pub view_mode: String,
    /// `abort` or `continue` when a page fails to store.
    pub on_error: String,
    /// Where scans are read from.
    pub source: FilesConfig,
    /// Where pages are written to.
    pub target: FilesConfig,
}

impl Default for BookblockConfig {
    fn default() -> Self {
        Self {
            pages: "0l".to_string(),
            geometry: "600x800+10+20".to_string(),
            image_mode: ImageMode::default().to_string(),
            view_mode: ViewMode::default().to_string(),
            on_error: FailurePolicy::default().to_string(),
            source: FilesConfig {
                dir: "/tmp".to_string(),
                file_format: "scan%03d.png".to_string(),
            },
            target: FilesConfig {
                dir: "/tmp".to_string(),
                file_format: "page%03d.png".to_string(),
            },
        }
    }
}

impl BookblockConfig {
    /// Check that every value can be turned into its typed setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pages.trim().is_empty() {
            return Err(ConfigError::Validation("pages must not be empty".into()));
        }
        if self.geometry.trim().is_empty() {
            return Err(ConfigError::Validation("geometry must not be empty".into()));
        }
        if self.source.file_format.is_empty() || self.target.file_format.is_empty() {
            return Err(ConfigError::Validation(
                "source.file_format and target.file_format must not be empty".into(),
            ));
        }
        self.parsed_image_mode()?;
        self.parsed_view_mode()?;
        self.parsed_failure_policy()?;
        Ok(())
    }

    fn parsed_image_mode(&self) -> Result<ImageMode, ConfigError> {
        Ok(self.image_mode.parse()?)
    }

    fn parsed_view_mode(&self) -> Result<ViewMode, ConfigError> {
        Ok(self.view_mode.parse()?)
    }

    fn parsed_failure_policy(&self) -> Result<FailurePolicy, ConfigError> {
        Ok(self.on_error.parse()?)
    }
}

/// A directory plus the file name template used inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
    pub dir: String,
    /// printf-style template with one integer conversion, e.g. `scan%03d.png`.
    pub file_format: String,
}

/// Values given on the command line, the topmost config layer.
///
/// Only the fields that are set take part in the merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub pages: Option<String>,
    pub geometry: Option<String>,
    pub image_mode: Option<String>,
    pub view_mode: Option<String>,
    pub on_error: Option<String>,
    pub source_dir: Option<String>,
    pub source_file_format: Option<String>,
    pub target_dir: Option<String>,
    pub target_file_format: Option<String>,
}

impl ConfigOverrides {
    /// The set values as a sparse TOML table shaped like `bookblock.toml`.
    pub fn to_toml(&self) -> toml::Value {
        let mut root = string_table(&[
            ("pages", &self.pages),
            ("geometry", &self.geometry),
            ("image_mode", &self.image_mode),
            ("view_mode", &self.view_mode),
            ("on_error", &self.on_error),
        ]);
        let sections = [
            (
                "source",
                string_table(&[("dir", &self.source_dir), ("file_format", &self.source_file_format)]),
            ),
            (
                "target",
                string_table(&[("dir", &self.target_dir), ("file_format", &self.target_file_format)]),
            ),
        ];
        for (name, section) in sections {
            if !section.is_empty() {
                root.insert(name.to_string(), toml::Value::Table(section));
            }
        }
        toml::Value::Table(root)
    }
}

fn string_table(entries: &[(&str, &Option<String>)]) -> toml::Table {
    entries
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .map(|v| (key.to_string(), toml::Value::String(v.clone())))
        })
        .collect()
}

/// Typed settings derived from a [`BookblockConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub pages: String,
    pub geometry: Geometry,
    pub naming: Naming,
    pub image_mode: ImageMode,
    pub view_mode: ViewMode,
    pub on_error: FailurePolicy,
}

impl Settings {
    pub fn from_config(config: &BookblockConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            pages: config.pages.clone(),
            geometry: config.geometry.parse()?,
            naming: Naming {
                source_dir: PathBuf::from(&config.source.dir),
                source_template: NamingTemplate::parse(&config.source.file_format)?,
                target_dir: PathBuf::from(&config.target.dir),
                target_template: NamingTemplate::parse(&config.target.file_format)?,
            },
            image_mode: config.parsed_image_mode()?,
            view_mode: config.parsed_view_mode()?,
            on_error: config.parsed_failure_policy()?,
        })
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BookblockConfig::default()).expect("default config must serialize")
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
/// Returns `Ok(None)` if the file does not exist and `Err` if it exists but
/// is not valid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    tracing::debug!(path = %path.display(), "reading config file");
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BookblockConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BookblockConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, merged onto the stock defaults.
///
/// A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<BookblockConfig, ConfigError> {
    load_config_with_overrides(path, &ConfigOverrides::default())
}

/// Stock defaults, then the file at `path` (if any), then `overrides`.
///
/// Validation runs once on the fully merged result, so an override can
/// replace an invalid file value.
pub fn load_config_with_overrides(
    path: &Path,
    overrides: &ConfigOverrides,
) -> Result<BookblockConfig, ConfigError> {
    let base = match load_raw_config(path)? {
        Some(file) => merge_toml(stock_defaults_value(), file),
        None => stock_defaults_value(),
    };
    resolve_config(base, Some(overrides.to_toml()))
}

/// Returns a fully-commented stock `bookblock.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Bookblock Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override them.
# Unknown keys will cause an error.

# Which scans become pages, in reading order. Comma separated tokens of
# FROM[-TO][l][r]: "l" takes the left half of each scan, "r" the right half,
# "lr" both (left first). Pages are numbered from 1 across all tokens.
#   "0l,1-120lr,121l"  -> cover, 240 facing pages, back cover
pages = "0l"

# Page bounding box as WIDTHxHEIGHT+OFFSET_LEFT+OFFSET_TOP, in pixels.
# Offsets are measured from the top-left corner of the scan half the page
# lies on, so one geometry serves both left and right pages.
geometry = "600x800+10+20"

# Pixel format scans are loaded in: "color" or "grayscale".
image_mode = "color"

# What the preview shows: "raw" (scan as is), "scan" (scan with the page
# outlined) or "page" (the cut-out page).
view_mode = "scan"

# What `extract` does when a page fails: "abort" or "continue".
on_error = "abort"

# ---------------------------------------------------------------------------
# Scans (input)
# ---------------------------------------------------------------------------
[source]
# Directory holding the scans. A leading ~ is expanded.
dir = "/tmp"

# Scan file name, printf style with one integer conversion.
file_format = "scan%03d.png"

# ---------------------------------------------------------------------------
# Pages (output)
# ---------------------------------------------------------------------------
[target]
# Directory pages are written to. Created when missing.
dir = "/tmp"

# Page file name; the extension picks the format (png, jpg, tif, webp).
file_format = "page%03d.png"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = BookblockConfig::default();
        assert_eq!(config.pages, "0l");
        assert_eq!(config.geometry, "600x800+10+20");
        assert_eq!(config.image_mode, "color");
        assert_eq!(config.view_mode, "scan");
        assert_eq!(config.on_error, "abort");
        assert_eq!(config.source.dir, "/tmp");
        assert_eq!(config.source.file_format, "scan%03d.png");
        assert_eq!(config.target.file_format, "page%03d.png");
    }

    #[test]
    fn parse_partial_config() {
        let config: BookblockConfig = toml::from_str(
            r#"
pages = "0l,1-3lr"
[target]
dir = "~/book"
file_format = "p%d.tif"
"#,
        )
        .unwrap();
        assert_eq!(config.pages, "0l,1-3lr");
        assert_eq!(config.target.dir, "~/book");
        // Defaults preserved
        assert_eq!(config.geometry, "600x800+10+20");
        assert_eq!(config.source.file_format, "scan%03d.png");
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, BookblockConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"
geometry = "100x200+1+2"
image_mode = "grayscale"

[source]
dir = "/scans"
file_format = "img%04d.jpg"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.geometry, "100x200+1+2");
        assert_eq!(config.image_mode, "grayscale");
        assert_eq!(config.source.dir, "/scans");
        assert_eq!(config.source.file_format, "img%04d.jpg");
        // Unspecified values should be defaults
        assert_eq!(config.target.dir, "/tmp");
        assert_eq!(config.pages, "0l");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "this is not valid toml [[[").unwrap();

        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "image_mode = \"sepia\"\n").unwrap();

        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::UndefinedImageMode(UndefinedImageMode(m))) if m == "sepia"));
    }

    #[test]
    fn undefined_mode_error_keeps_typed_message() {
        let config = BookblockConfig {
            image_mode: "sepia".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            UndefinedImageMode("sepia".to_string()).to_string()
        );
    }

    // =========================================================================
    // Command-line overrides
    // =========================================================================

    #[test]
    fn overrides_to_toml_is_sparse() {
        let overrides = ConfigOverrides {
            geometry: Some("10x10+0+0".to_string()),
            target_dir: Some("/out".to_string()),
            ..Default::default()
        };
        let value = overrides.to_toml();
        let table = value.as_table().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table["geometry"].as_str(), Some("10x10+0+0"));
        assert_eq!(table["target"].get("dir").unwrap().as_str(), Some("/out"));
        assert!(table["target"].get("file_format").is_none());
        assert!(!table.contains_key("source"));
    }

    #[test]
    fn empty_overrides_leave_file_values() {
        let value = ConfigOverrides::default().to_toml();
        assert!(value.as_table().unwrap().is_empty());
    }

    #[test]
    fn override_wins_over_file_and_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "pages = \"0-9l\"\n[source]\ndir = \"/scans\"\n").unwrap();

        let overrides = ConfigOverrides {
            pages: Some("3r".to_string()),
            source_file_format: Some("img%d.jpg".to_string()),
            ..Default::default()
        };
        let config = load_config_with_overrides(&path, &overrides).unwrap();
        assert_eq!(config.pages, "3r");
        assert_eq!(config.source.dir, "/scans");
        assert_eq!(config.source.file_format, "img%d.jpg");
        assert_eq!(config.target.file_format, "page%03d.png");
    }

    #[test]
    fn override_replaces_invalid_file_value() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "image_mode = \"sepia\"\n").unwrap();

        let overrides = ConfigOverrides {
            image_mode: Some("color".to_string()),
            ..Default::default()
        };
        let config = load_config_with_overrides(&path, &overrides).unwrap();
        assert_eq!(config.image_mode, "color");
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::UndefinedImageMode(_))
        ));
    }

    #[test]
    fn invalid_override_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let overrides = ConfigOverrides {
            view_mode: Some("thumbnail".to_string()),
            ..Default::default()
        };
        let result = load_config_with_overrides(&tmp.path().join(CONFIG_FILE_NAME), &overrides);
        assert!(matches!(result, Err(ConfigError::UndefinedViewMode(_))));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("pages = \"0l\"").unwrap();
        let overlay: toml::Value = toml::from_str("pages = \"1-9lr\"").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("pages").unwrap().as_str(), Some("1-9lr"));
    }

    #[test]
    fn merge_toml_table_merge_preserves_base_keys() {
        let base: toml::Value = toml::from_str(
            r#"
[source]
dir = "/tmp"
file_format = "scan%03d.png"
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str("[source]\ndir = \"/scans\"").unwrap();

        let merged = merge_toml(base, overlay);
        let source = merged.get("source").unwrap();
        assert_eq!(source.get("dir").unwrap().as_str(), Some("/scans"));
        assert_eq!(
            source.get("file_format").unwrap().as_str(),
            Some("scan%03d.png")
        );
    }

    #[test]
    fn merge_toml_non_table_replaces_table() {
        let base: toml::Value = toml::from_str("[a]\nb = 1").unwrap();
        let overlay: toml::Value = toml::from_str("a = 2").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("a").unwrap().as_integer(), Some(2));
    }

    // =========================================================================
    // Unknown key rejection
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<BookblockConfig, _> = toml::from_str("page = \"0l\"");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let result: Result<BookblockConfig, _> =
            toml::from_str("[source]\ndir = \"/x\"\nfile_format = \"a%d\"\npattern = \"y\"");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[target]\nformat = \"png\"\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(BookblockConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_undefined_view_mode() {
        let config = BookblockConfig {
            view_mode: "preview".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UndefinedViewMode(UndefinedViewMode(m))) if m == "preview"
        ));
    }

    #[test]
    fn validate_undefined_failure_policy() {
        let config = BookblockConfig {
            on_error: "retry".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UndefinedFailurePolicy(_))
        ));
    }

    #[test]
    fn validate_empty_pages() {
        let config = BookblockConfig {
            pages: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // resolve_config / load_raw_config
    // =========================================================================

    #[test]
    fn load_raw_config_returns_none_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let result = load_raw_config(&tmp.path().join("missing.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn resolve_config_with_overlay() {
        let overlay: toml::Value = toml::from_str("view_mode = \"page\"").unwrap();
        let config = resolve_config(stock_defaults_value(), Some(overlay)).unwrap();
        assert_eq!(config.view_mode, "page");
        assert_eq!(config.image_mode, "color");
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let overlay: toml::Value = toml::from_str("on_error = \"ignore\"").unwrap();
        let result = resolve_config(stock_defaults_value(), Some(overlay));
        assert!(matches!(result, Err(ConfigError::UndefinedFailurePolicy(_))));
    }

    // =========================================================================
    // Settings
    // =========================================================================

    #[test]
    fn settings_from_default_config() {
        let settings = Settings::from_config(&BookblockConfig::default()).unwrap();
        assert_eq!(settings.pages, "0l");
        assert_eq!(
            settings.geometry,
            Geometry {
                width: 600,
                height: 800,
                offset_left: 10,
                offset_top: 20
            }
        );
        assert_eq!(settings.image_mode, ImageMode::Color);
        assert_eq!(settings.view_mode, ViewMode::Scan);
        assert_eq!(settings.on_error, FailurePolicy::Abort);
        assert_eq!(
            settings.naming.scan_path(3),
            PathBuf::from("/tmp/scan003.png")
        );
        assert_eq!(
            settings.naming.page_path(12),
            PathBuf::from("/tmp/page012.png")
        );
    }

    #[test]
    fn settings_malformed_geometry() {
        let config = BookblockConfig {
            geometry: "600x800".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Settings::from_config(&config),
            Err(ConfigError::Geometry(GeometryError::Malformed(_)))
        ));
    }

    #[test]
    fn settings_invalid_template() {
        let mut config = BookblockConfig::default();
        config.target.file_format = "page.png".to_string();
        assert!(matches!(
            Settings::from_config(&config),
            Err(ConfigError::Naming(_))
        ));
    }

    // =========================================================================
    // Stock config
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: BookblockConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, BookblockConfig::default());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let value = stock_defaults_value();
        let table = value.as_table().unwrap();
        for key in ["pages", "geometry", "image_mode", "view_mode", "on_error", "source", "target"] {
            assert!(table.contains_key(key), "missing {key}");
        }
    }
}
