//! The build pipeline.
//!
//! ```text
//! 1. Clear    dist/                      (remove everything, keep the dir)
//! 2. Copy     src_site/  →  dist/        (full recursive copy)
//! 3. Hash     dist/assets/**             (rename + rewrite references)
//! ```
//!
//! The output is rebuilt from the pristine source on every run, so there is
//! no fingerprint index to keep in sync: unchanged content hashes to the
//! same names every time.

use crate::config::BuildConfig;
use crate::fingerprint::{self, FingerprintError};
use crate::types::FingerprintReport;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Fingerprinting failed: {0}")]
    Fingerprint(#[from] FingerprintError),
    #[error("Source directory not found: {0}")]
    SourceMissing(PathBuf),
    #[error("Source {source_dir} and output {output_dir} must not contain each other")]
    Overlapping {
        source_dir: PathBuf,
        output_dir: PathBuf,
    },
}

/// What a build did, for the completion summary.
#[derive(Debug)]
pub struct BuildSummary {
    /// Regular files copied from source to output.
    pub copied: usize,
    pub report: FingerprintReport,
}

/// Run the full pipeline described by `config`.
pub fn build(config: &BuildConfig) -> Result<BuildSummary, BuildError> {
    let copied = prepare_output(&config.source, &config.output)?;
    let report = fingerprint::fingerprint_tree(&config.output, config)?;
    Ok(BuildSummary { copied, report })
}

/// Clear `output` and repopulate it with a full copy of `source`.
///
/// Returns the number of files copied.
pub fn prepare_output(source: &Path, output: &Path) -> Result<usize, BuildError> {
    check_directories(source, output)?;
    empty_dir(output)?;
    copy_tree(source, output)
}

/// Reject a missing source and source/output pairs that nest, which would
/// make the copy recurse into itself or the clear delete the source.
pub fn check_directories(source: &Path, output: &Path) -> Result<(), BuildError> {
    if !source.is_dir() {
        return Err(BuildError::SourceMissing(source.to_path_buf()));
    }
    let source_abs = std::path::absolute(source)?;
    let output_abs = std::path::absolute(output)?;
    if source_abs.starts_with(&output_abs) || output_abs.starts_with(&source_abs) {
        return Err(BuildError::Overlapping {
            source_dir: source.to_path_buf(),
            output_dir: output.to_path_buf(),
        });
    }
    Ok(())
}

/// Remove everything inside `dir`, creating it if it does not exist.
pub fn empty_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.exists() {
        return fs::create_dir_all(dir);
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Recursively copy `src` into `dst`, following symlinks.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<usize, BuildError> {
    let mut copied = 0;
    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}
