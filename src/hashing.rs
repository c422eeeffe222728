//! Content fingerprints.
//!
//! A fingerprint is the leading hex characters of a digest of the file's
//! bytes. It only has to tell two versions of the same asset apart, so the
//! default is a truncated MD5: short enough to keep filenames readable, and
//! this is not a security boundary.

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io;
use std::path::Path;

/// Digest used to fingerprint asset contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha256,
}

impl HashAlgorithm {
    /// Length of the full hex-encoded digest.
    pub fn hex_len(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 32,
            HashAlgorithm::Sha256 => 64,
        }
    }

    /// Full lowercase hex digest of `bytes`.
    pub fn hex_digest(self, bytes: &[u8]) -> String {
        match self {
            HashAlgorithm::Md5 => format!("{:x}", Md5::digest(bytes)),
            HashAlgorithm::Sha256 => format!("{:x}", Sha256::digest(bytes)),
        }
    }

    /// First `length` hex characters of the digest of `bytes`.
    ///
    /// `length` is clamped to the digest length; config validation rejects
    /// larger values before they get here.
    pub fn fingerprint(self, bytes: &[u8], length: usize) -> String {
        let mut hex = self.hex_digest(bytes);
        hex.truncate(length.min(self.hex_len()));
        hex
    }

    /// Read a file fully and fingerprint its contents.
    pub fn fingerprint_file(self, path: &Path, length: usize) -> io::Result<String> {
        let bytes = std::fs::read(path)?;
        Ok(self.fingerprint(&bytes, length))
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Md5 => write!(f, "md5"),
            HashAlgorithm::Sha256 => write!(f, "sha256"),
        }
    }
}

/// Embed `fingerprint` before the final extension.
///
/// `style.css` + `a1b2c3d4` → `style.a1b2c3d4.css`. The extension keeps its
/// original case. Names without an extension get the fingerprint appended.
pub fn fingerprinted_name(filename: &str, fingerprint: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}.{fingerprint}.{ext}"),
        _ => format!("{filename}.{fingerprint}"),
    }
}
