//! Build configuration.
//!
//! Handles loading, validating, and merging `cachebust.toml`. The file is
//! optional: stock defaults describe the conventional site layout, and a user
//! file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source = "src_site"       # Rendered site to fingerprint (never modified)
//! output = "dist"           # Cleared and rebuilt on every run
//! print_tree = true         # Print the output tree with sizes when done
//!
//! [fingerprint]
//! algorithm = "md5"         # "md5" or "sha256"
//! length = 8                # Hex characters kept in the filename
//!
//! [references]
//! html = ["html"]           # Extensions scanned with the attribute pattern
//! css = ["css"]             # Extensions scanned with the url() pattern
//!
//! [[categories]]
//! name = "images"
//! dir = "assets/images"
//! extensions = ["jpg", "jpeg", "png", "gif", "svg", "webp"]
//!
//! [[categories]]
//! name = "styles"
//! dir = "assets/css"
//! extensions = ["css"]
//!
//! [[categories]]
//! name = "scripts"
//! dir = "assets/js"
//! extensions = ["js"]
//! ```
//!
//! ## Merging
//!
//! Tables merge key-by-key; arrays and scalars replace. Declaring any
//! `[[categories]]` entry therefore replaces the whole default list.
//!
//! Unknown keys are rejected to catch typos early.

use crate::hashing::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "cachebust.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration loaded from `cachebust.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Rendered site produced by the generator. Read-only for this tool.
    pub source: PathBuf,
    /// Deployable output. Cleared at the start of every build.
    pub output: PathBuf,
    /// Print a directory listing of the output after the build.
    pub print_tree: bool,
    /// Digest settings.
    pub fingerprint: FingerprintConfig,
    /// Which files are scanned for references, and how.
    pub references: ReferenceConfig,
    /// Asset categories, processed in order.
    pub categories: Vec<AssetCategory>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("src_site"),
            output: PathBuf::from("dist"),
            print_tree: true,
            fingerprint: FingerprintConfig::default(),
            references: ReferenceConfig::default(),
            categories: default_categories(),
        }
    }
}

/// Digest algorithm and how much of it ends up in filenames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FingerprintConfig {
    pub algorithm: HashAlgorithm,
    /// Number of leading hex characters embedded in the filename.
    pub length: usize,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Md5,
            length: 8,
        }
    }
}

/// Extensions of files that may reference assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReferenceConfig {
    /// Markup files: references inside quoted or parenthesized contexts.
    pub html: Vec<String>,
    /// Stylesheets: references inside `url(...)`.
    pub css: Vec<String>,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            html: vec!["html".to_string()],
            css: vec!["css".to_string()],
        }
    }
}

/// A directory of assets sharing a set of extensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetCategory {
    /// Label used in reports (`"images"`, `"styles"`).
    pub name: String,
    /// Directory relative to the tree root. Only its immediate files count.
    pub dir: PathBuf,
    /// Extensions without the leading dot, matched case-insensitively.
    pub extensions: Vec<String>,
}

impl AssetCategory {
    pub fn new(name: &str, dir: &str, extensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            dir: PathBuf::from(dir),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Whether `ext` (no dot) belongs to this category.
    pub fn accepts(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Images first: stylesheets embed image URLs, so their fingerprints must be
/// computed after those URLs have been rewritten.
pub fn default_categories() -> Vec<AssetCategory> {
    vec![
        AssetCategory::new(
            "images",
            "assets/images",
            &["jpg", "jpeg", "png", "gif", "svg", "webp"],
        ),
        AssetCategory::new("styles", "assets/css", &["css"]),
        AssetCategory::new("scripts", "assets/js", &["js"]),
    ]
}

impl BuildConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max = self.fingerprint.algorithm.hex_len();
        if self.fingerprint.length == 0 || self.fingerprint.length > max {
            return Err(ConfigError::Validation(format!(
                "fingerprint.length must be 1-{max} for {}",
                self.fingerprint.algorithm
            )));
        }
        if self.source == self.output {
            return Err(ConfigError::Validation(
                "source and output must be different directories".into(),
            ));
        }

        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.name.is_empty() {
                return Err(ConfigError::Validation(
                    "categories.name must not be empty".into(),
                ));
            }
            if !seen.insert(category.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate category name: {}",
                    category.name
                )));
            }
            if category.dir.as_os_str().is_empty() || category.dir.is_absolute() {
                return Err(ConfigError::Validation(format!(
                    "categories.dir for '{}' must be a non-empty relative path",
                    category.name
                )));
            }
            if category.extensions.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "categories.extensions for '{}' must not be empty",
                    category.name
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BuildConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
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
) -> Result<BuildConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BuildConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when it is absent.
pub fn load_config(path: &Path) -> Result<BuildConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(path)?)
}

/// Returns a fully-commented stock `cachebust.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# cachebust configuration
# ======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Rendered site to fingerprint. Never modified.
source = "src_site"

# Deployable output. Cleared and rebuilt from `source` on every run.
output = "dist"

# Print the output directory tree with file sizes when the build finishes.
print_tree = true

# ---------------------------------------------------------------------------
# Fingerprints
# ---------------------------------------------------------------------------
[fingerprint]
# Content digest: "md5" or "sha256". Not a security boundary.
algorithm = "md5"

# Leading hex characters of the digest embedded in the filename:
# style.css -> style.a1b2c3d4.css
length = 8

# ---------------------------------------------------------------------------
# Reference rewriting
# ---------------------------------------------------------------------------
[references]
# Files scanned for references in quoted/parenthesized contexts
# (href="...", src='...', srcset lists, inline url()).
html = ["html"]

# Files scanned for references inside url(...).
css = ["css"]

# ---------------------------------------------------------------------------
# Asset categories
# ---------------------------------------------------------------------------
# Processed top to bottom. Only files directly inside `dir` are renamed.
# Missing directories are skipped. Declaring any [[categories]] entry
# replaces this whole list.

[[categories]]
name = "images"
dir = "assets/images"
extensions = ["jpg", "jpeg", "png", "gif", "svg", "webp"]

[[categories]]
name = "styles"
dir = "assets/css"
extensions = ["css"]

[[categories]]
name = "scripts"
dir = "assets/js"
extensions = ["js"]
"##
}
