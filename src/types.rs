//! Results shared between the fingerprint pass, the build pipeline, and the
//! CLI output formatters.
//!
//! Nothing here is persisted: every build recomputes fingerprints from the
//! freshly copied tree.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// One asset renamed by the fingerprint pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenamedAsset {
    /// Category label from config (`"images"`, `"styles"`, ...).
    pub category: String,
    /// Directory holding the asset, relative to the tree root.
    pub dir: PathBuf,
    /// Filename before the pass; the key references were matched on.
    pub original: String,
    /// Filename after the pass: `{stem}.{fingerprint}{.ext}`.
    pub renamed: String,
    pub fingerprint: String,
    /// Reference files rewritten for this asset, relative to the tree root.
    pub rewritten: Vec<PathBuf>,
}

impl RenamedAsset {
    /// Relative path of the asset after renaming.
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.renamed)
    }
}

/// Outcome of a fingerprint pass over a whole tree.
#[derive(Debug, Clone, Default)]
pub struct FingerprintReport {
    /// Renamed assets in processing order.
    pub assets: Vec<RenamedAsset>,
    /// Categories whose directory does not exist in the tree.
    pub skipped: Vec<String>,
}

impl FingerprintReport {
    /// Look up a renamed asset by its original filename.
    pub fn find(&self, original: &str) -> Option<&RenamedAsset> {
        self.assets.iter().find(|a| a.original == original)
    }

    /// Number of distinct reference files rewritten at least once.
    pub fn rewritten_file_count(&self) -> usize {
        self.assets
            .iter()
            .flat_map(|a| a.rewritten.iter().map(PathBuf::as_path))
            .collect::<BTreeSet<&Path>>()
            .len()
    }

    /// Total number of (asset, file) rewrites.
    pub fn rewrite_count(&self) -> usize {
        self.assets.iter().map(|a| a.rewritten.len()).sum()
    }
}

/// Dry-run view of one category, as reported by `check`.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySurvey {
    pub name: String,
    pub dir: PathBuf,
    /// `None` when the directory is missing and the category will be skipped.
    pub assets: Option<Vec<AssetSurvey>>,
}

/// Dry-run view of one eligible asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetSurvey {
    pub filename: String,
    pub size: u64,
    /// Path-like references found across all reference files.
    pub references: usize,
    /// Reference files containing at least one of them.
    pub files: usize,
}
