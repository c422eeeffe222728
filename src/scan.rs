//! Filesystem discovery.
//!
//! Two questions are answered here, both without reading file contents:
//!
//! - Which files in a category directory are eligible for fingerprinting
//!   ([`discover_assets`]). Only immediate children count.
//! - Which files anywhere in the tree may reference an asset
//!   ([`reference_files`]). This one walks recursively.
//!
//! ```text
//! dist/
//! ├── index.html                   # reference file (html)
//! ├── blog/first-post/index.html   # reference file (html)
//! └── assets/
//!     ├── css/style.css            # asset (styles) and reference file (css)
//!     ├── js/slideshow.js          # asset (scripts)
//!     └── images/
//!         ├── logo.png             # asset (images)
//!         └── gallery/a.png        # nested: not an asset
//! ```

use crate::config::{AssetCategory, ReferenceConfig};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// How a reference file is scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Quoted or parenthesized contexts (attributes, inline styles).
    Html,
    /// `url(...)` only.
    Css,
}

/// A file that may mention asset filenames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceFile {
    pub path: PathBuf,
    pub kind: ReferenceKind,
}

/// Extension of `path`, if it is valid UTF-8.
fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// List the eligible assets directly inside `root/category.dir`.
///
/// Returns `Ok(None)` when the directory does not exist (or is not a
/// directory): a site without images simply has no image category. Files
/// whose names are not valid UTF-8 are ignored since they cannot be matched
/// textually. Results are sorted by filename.
pub fn discover_assets(
    root: &Path,
    category: &AssetCategory,
) -> std::io::Result<Option<Vec<PathBuf>>> {
    let dir = root.join(&category.dir);
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut assets = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() && !path.is_file() {
            continue;
        }
        if entry.file_name().to_str().is_none() {
            continue;
        }
        if extension(&path).is_some_and(|ext| category.accepts(ext)) {
            assets.push(path);
        }
    }
    assets.sort();
    Ok(Some(assets))
}

/// Classify `path` against the configured reference extensions.
pub fn reference_kind(path: &Path, config: &ReferenceConfig) -> Option<ReferenceKind> {
    let ext = extension(path)?;
    if config.html.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
        Some(ReferenceKind::Html)
    } else if config.css.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
        Some(ReferenceKind::Css)
    } else {
        None
    }
}

/// Recursively collect every HTML and CSS file under `root`, in a stable
/// depth-first order.
pub fn reference_files(
    root: &Path,
    config: &ReferenceConfig,
) -> Result<Vec<ReferenceFile>, walkdir::Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(kind) = reference_kind(entry.path(), config) {
            files.push(ReferenceFile {
                path: entry.into_path(),
                kind,
            });
        }
    }
    Ok(files)
}
