//! The fingerprinting pass.
//!
//! Runs over a tree that is about to be deployed and, for every eligible
//! asset:
//!
//! 1. reads its bytes and computes a short content fingerprint,
//! 2. renames it in place to `{stem}.{fingerprint}{.ext}`,
//! 3. rewrites every path-like reference to the old filename in every HTML
//!    and CSS file of the tree.
//!
//! Step 3 happens right after each rename, before the next asset is looked
//! at, and re-walks the whole tree each time. That is `assets × reference
//! files` reads, which is fine for a personal site and keeps the pass free
//! of any index that could go stale while files are being renamed (a
//! stylesheet may itself have been renamed a moment ago).
//!
//! Categories run in configured order. The default runs images before
//! styles, so a stylesheet is hashed after its `url()` references have
//! been rewritten and its fingerprint covers them.
//!
//! Any I/O failure aborts the pass. Reference files are not decoded, so a
//! page that is not UTF-8 is rewritten like any other. Truncated-hash
//! collisions between two different assets are not detected.

use crate::config::{AssetCategory, BuildConfig, FingerprintConfig, ReferenceConfig};
use crate::hashing::fingerprinted_name;
use crate::rewrite::ReferencePatterns;
use crate::scan::{self, ReferenceKind};
use crate::types::{AssetSurvey, CategorySurvey, FingerprintReport, RenamedAsset};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid reference pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Fingerprint every eligible asset under `root` and repair references.
pub fn fingerprint_tree(
    root: &Path,
    config: &BuildConfig,
) -> Result<FingerprintReport, FingerprintError> {
    let mut report = FingerprintReport::default();

    for category in &config.categories {
        let Some(assets) = scan::discover_assets(root, category)? else {
            report.skipped.push(category.name.clone());
            continue;
        };
        for asset in assets {
            let renamed = fingerprint_asset(
                root,
                category,
                &asset,
                &config.fingerprint,
                &config.references,
            )?;
            report.assets.push(renamed);
        }
    }

    Ok(report)
}

/// Hash, rename, and repair references for a single asset.
fn fingerprint_asset(
    root: &Path,
    category: &AssetCategory,
    asset: &Path,
    fingerprint: &FingerprintConfig,
    references: &ReferenceConfig,
) -> Result<RenamedAsset, FingerprintError> {
    // discover_assets only yields UTF-8 file names
    let original = asset
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let hash = fingerprint
        .algorithm
        .fingerprint_file(asset, fingerprint.length)?;
    let renamed = fingerprinted_name(&original, &hash);
    fs::rename(asset, asset.with_file_name(&renamed))?;

    let patterns = ReferencePatterns::new(&original)?;
    let rewritten = rewrite_references(root, references, &patterns, &renamed)?;

    Ok(RenamedAsset {
        category: category.name.clone(),
        dir: category.dir.clone(),
        original,
        renamed,
        fingerprint: hash,
        rewritten: rewritten
            .into_iter()
            .map(|p| relative_to(root, &p))
            .collect(),
    })
}

/// Rewrite references matched by `patterns` in every reference file under
/// `root`. Returns the files that were actually changed.
///
/// Each file is read once as raw bytes and written back once, and only when
/// at least one reference was replaced. Bytes outside the replaced filenames
/// are kept as they are, whatever the file's encoding.
pub fn rewrite_references(
    root: &Path,
    references: &ReferenceConfig,
    patterns: &ReferencePatterns,
    new_name: &str,
) -> Result<Vec<PathBuf>, FingerprintError> {
    let mut changed = Vec::new();
    for file in scan::reference_files(root, references)? {
        let text = fs::read(&file.path)?;
        if let Cow::Owned(rewritten) = patterns.rewrite(file.kind, &text, new_name) {
            fs::write(&file.path, rewritten)?;
            changed.push(file.path);
        }
    }
    Ok(changed)
}

/// Describe what [`fingerprint_tree`] would touch, without modifying
/// anything. Fingerprints are not computed: they depend on rewrites that
/// only happen during the real pass.
pub fn survey_tree(
    root: &Path,
    config: &BuildConfig,
) -> Result<Vec<CategorySurvey>, FingerprintError> {
    let files = scan::reference_files(root, &config.references)?;
    let mut contents: Vec<(ReferenceKind, Vec<u8>)> = Vec::with_capacity(files.len());
    for file in &files {
        contents.push((file.kind, fs::read(&file.path)?));
    }

    let mut surveys = Vec::new();
    for category in &config.categories {
        let Some(assets) = scan::discover_assets(root, category)? else {
            surveys.push(CategorySurvey {
                name: category.name.clone(),
                dir: category.dir.clone(),
                assets: None,
            });
            continue;
        };

        let mut found = Vec::new();
        for asset in assets {
            let filename = asset
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            let patterns = ReferencePatterns::new(&filename)?;

            let mut references = 0;
            let mut files_referencing = 0;
            for (kind, text) in &contents {
                let n = patterns.count(*kind, text);
                if n > 0 {
                    references += n;
                    files_referencing += 1;
                }
            }
            found.push(AssetSurvey {
                filename,
                size: fs::metadata(&asset)?.len(),
                references,
                files: files_referencing,
            });
        }

        surveys.push(CategorySurvey {
            name: category.name.clone(),
            dir: category.dir.clone(),
            assets: Some(found),
        });
    }
    Ok(surveys)
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
