//! CLI output formatting for the build, check and tree reports.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Copied 12 files
//! images
//!     logo.png → logo.9f8e7d6c.png (2 files)
//!     photo.webp → photo.41c0aa7e.webp (unreferenced)
//! styles
//!     style.css → style.a1b2c3d4.css (3 files)
//! scripts: skipped (directory not found)
//! Fingerprinted 3 assets, rewrote 3 files
//! ```
//!
//! ## Check
//!
//! ```text
//! images (assets/images)
//!     logo.png  11 B  2 references in 2 files
//!     photo.webp  14 B  unreferenced
//! scripts (assets/js): skipped (directory not found)
//! Found 2 assets, 1 referenced
//! ```
//!
//! ## Tree
//!
//! ```text
//! ├── assets/
//! │   └── css/
//! │       └── style.a1b2c3d4.css (120 B)
//! └── index.html (1.2 KB)
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::pipeline::BuildSummary;
use crate::types::{CategorySurvey, FingerprintReport};
use std::path::Path;
use walkdir::WalkDir;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 file`, `3 files`.
fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Human-readable byte size with one decimal above a kilobyte.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format the fingerprint report, grouped by category in processing order.
pub fn format_fingerprint_report(report: &FingerprintReport) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<&str> = None;

    for asset in &report.assets {
        if current != Some(asset.category.as_str()) {
            lines.push(asset.category.clone());
            current = Some(asset.category.as_str());
        }
        let files = if asset.rewritten.is_empty() {
            "unreferenced".to_string()
        } else {
            plural(asset.rewritten.len(), "file")
        };
        lines.push(format!(
            "{}{} \u{2192} {} ({})",
            indent(1),
            asset.original,
            asset.renamed,
            files
        ));
    }

    for name in &report.skipped {
        lines.push(format!("{name}: skipped (directory not found)"));
    }

    lines.push(format!(
        "Fingerprinted {}, rewrote {}",
        plural(report.assets.len(), "asset"),
        plural(report.rewritten_file_count(), "file")
    ));
    lines
}

/// Format the completion summary of a full build.
pub fn format_build_output(summary: &BuildSummary) -> Vec<String> {
    let mut lines = vec![format!("Copied {}", plural(summary.copied, "file"))];
    lines.extend(format_fingerprint_report(&summary.report));
    lines
}

/// Print build output to stdout.
pub fn print_build_output(summary: &BuildSummary) {
    for line in format_build_output(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the dry-run survey of a source tree.
pub fn format_survey(surveys: &[CategorySurvey]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut total = 0;
    let mut referenced = 0;

    for survey in surveys {
        let header = format!("{} ({})", survey.name, survey.dir.display());
        let Some(assets) = &survey.assets else {
            lines.push(format!("{header}: skipped (directory not found)"));
            continue;
        };
        lines.push(header);
        for asset in assets {
            total += 1;
            let refs = if asset.references == 0 {
                "unreferenced".to_string()
            } else {
                referenced += 1;
                format!(
                    "{} in {}",
                    plural(asset.references, "reference"),
                    plural(asset.files, "file")
                )
            };
            lines.push(format!(
                "{}{}  {}  {}",
                indent(1),
                asset.filename,
                format_size(asset.size),
                refs
            ));
        }
    }

    lines.push(format!(
        "Found {}, {} referenced",
        plural(total, "asset"),
        referenced
    ));
    lines
}

/// Print check output to stdout.
pub fn print_survey(surveys: &[CategorySurvey]) {
    for line in format_survey(surveys) {
        println!("{}", line);
    }
}

// ============================================================================
// Tree
// ============================================================================

/// One entry of a directory listing, flattened depth-first.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEntry {
    /// 0 for direct children of the listed root.
    pub depth: usize,
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

/// Walk `root` into a sorted, depth-first list of entries.
pub fn collect_tree(root: &Path) -> Result<Vec<TreeEntry>, walkdir::Error> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let is_dir = entry.file_type().is_dir();
        let size = if is_dir { 0 } else { entry.metadata()?.len() };
        entries.push(TreeEntry {
            depth: entry.depth() - 1,
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            size,
        });
    }
    Ok(entries)
}

/// Whether no later sibling follows `entries[i]` under the same parent.
fn is_last_sibling(entries: &[TreeEntry], i: usize) -> bool {
    let depth = entries[i].depth;
    entries[i + 1..]
        .iter()
        .take_while(|e| e.depth >= depth)
        .all(|e| e.depth > depth)
}

/// Render entries with box-drawing connectors.
pub fn format_tree(entries: &[TreeEntry]) -> Vec<String> {
    let mut lines = Vec::with_capacity(entries.len());
    // For each open ancestor level: does it have siblings still to come?
    let mut continues: Vec<bool> = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        let last = is_last_sibling(entries, i);
        continues.truncate(entry.depth);

        let mut line: String = continues
            .iter()
            .map(|&more| if more { "\u{2502}   " } else { "    " })
            .collect();
        let connector = if last {
            "\u{2514}\u{2500}\u{2500} "
        } else {
            "\u{251c}\u{2500}\u{2500} "
        };
        line.push_str(connector);
        line.push_str(&entry.name);
        if entry.is_dir {
            line.push('/');
        } else {
            line.push_str(&format!(" ({})", format_size(entry.size)));
        }

        lines.push(line);
        continues.push(!last);
    }
    lines
}

/// Print the tree of `root` to stdout.
pub fn print_tree(root: &Path) -> Result<(), walkdir::Error> {
    println!("{}/", root.display());
    for line in format_tree(&collect_tree(root)?) {
        println!("{}", line);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_tree;
    use crate::types::{AssetSurvey, RenamedAsset};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn renamed(category: &str, original: &str, renamed: &str, files: &[&str]) -> RenamedAsset {
        RenamedAsset {
            category: category.into(),
            dir: PathBuf::from("assets"),
            original: original.into(),
            renamed: renamed.into(),
            fingerprint: "00000000".into(),
            rewritten: files.iter().map(PathBuf::from).collect(),
        }
    }

    fn entry(depth: usize, name: &str, is_dir: bool, size: u64) -> TreeEntry {
        TreeEntry {
            depth,
            name: name.into(),
            is_dir,
            size,
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_size_bytes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
    }

    #[test]
    fn format_size_kilobytes() {
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
    }

    #[test]
    fn format_size_megabytes() {
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "file"), "1 file");
        assert_eq!(plural(0, "file"), "0 files");
        assert_eq!(plural(2, "asset"), "2 assets");
    }

    // =========================================================================
    // Build
    // =========================================================================

    #[test]
    fn fingerprint_report_groups_by_category() {
        let report = FingerprintReport {
            assets: vec![
                renamed("images", "logo.png", "logo.1.png", &["index.html", "a.css"]),
                renamed("images", "bg.jpg", "bg.2.jpg", &[]),
                renamed("styles", "a.css", "a.3.css", &["index.html"]),
            ],
            skipped: vec!["scripts".into()],
        };
        assert_eq!(
            format_fingerprint_report(&report),
            vec![
                "images",
                "    logo.png \u{2192} logo.1.png (2 files)",
                "    bg.jpg \u{2192} bg.2.jpg (unreferenced)",
                "styles",
                "    a.css \u{2192} a.3.css (1 file)",
                "scripts: skipped (directory not found)",
                "Fingerprinted 3 assets, rewrote 2 files",
            ]
        );
    }

    #[test]
    fn build_output_leads_with_copy_count() {
        let summary = BuildSummary {
            copied: 1,
            report: FingerprintReport::default(),
        };
        assert_eq!(
            format_build_output(&summary),
            vec!["Copied 1 file", "Fingerprinted 0 assets, rewrote 0 files"]
        );
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn survey_lists_assets_and_skipped_categories() {
        let surveys = vec![
            CategorySurvey {
                name: "images".into(),
                dir: PathBuf::from("assets/images"),
                assets: Some(vec![
                    AssetSurvey {
                        filename: "logo.png".into(),
                        size: 11,
                        references: 3,
                        files: 2,
                    },
                    AssetSurvey {
                        filename: "unused.png".into(),
                        size: 2048,
                        references: 0,
                        files: 0,
                    },
                ]),
            },
            CategorySurvey {
                name: "scripts".into(),
                dir: PathBuf::from("assets/js"),
                assets: None,
            },
        ];
        assert_eq!(
            format_survey(&surveys),
            vec![
                "images (assets/images)",
                "    logo.png  11 B  3 references in 2 files",
                "    unused.png  2.0 KB  unreferenced",
                "scripts (assets/js): skipped (directory not found)",
                "Found 2 assets, 1 referenced",
            ]
        );
    }

    // =========================================================================
    // Tree
    // =========================================================================

    #[test]
    fn format_tree_connectors() {
        let entries = vec![
            entry(0, "assets", true, 0),
            entry(1, "css", true, 0),
            entry(2, "style.css", false, 120),
            entry(1, "js", true, 0),
            entry(2, "app.js", false, 10),
            entry(0, "index.html", false, 1229),
        ];
        assert_eq!(
            format_tree(&entries),
            vec![
                "\u{251c}\u{2500}\u{2500} assets/",
                "\u{2502}   \u{251c}\u{2500}\u{2500} css/",
                "\u{2502}   \u{2502}   \u{2514}\u{2500}\u{2500} style.css (120 B)",
                "\u{2502}   \u{2514}\u{2500}\u{2500} js/",
                "\u{2502}       \u{2514}\u{2500}\u{2500} app.js (10 B)",
                "\u{2514}\u{2500}\u{2500} index.html (1.2 KB)",
            ]
        );
    }

    #[test]
    fn format_tree_last_directory_has_blank_gutter() {
        let entries = vec![
            entry(0, "a.txt", false, 1),
            entry(0, "blog", true, 0),
            entry(1, "index.html", false, 2),
        ];
        assert_eq!(
            format_tree(&entries),
            vec![
                "\u{251c}\u{2500}\u{2500} a.txt (1 B)",
                "\u{2514}\u{2500}\u{2500} blog/",
                "    \u{2514}\u{2500}\u{2500} index.html (2 B)",
            ]
        );
    }

    #[test]
    fn format_tree_empty() {
        assert!(format_tree(&[]).is_empty());
    }

    #[test]
    fn collect_tree_is_sorted_depth_first() {
        let tmp = TempDir::new().unwrap();
        write_tree(
            tmp.path(),
            &[("z.html", "zz"), ("assets/css/s.css", "abc"), ("b.txt", "")],
        );

        let entries = collect_tree(tmp.path()).unwrap();
        assert_eq!(
            entries,
            vec![
                entry(0, "assets", true, 0),
                entry(1, "css", true, 0),
                entry(2, "s.css", false, 3),
                entry(0, "b.txt", false, 0),
                entry(0, "z.html", false, 2),
            ]
        );
    }
}
