//! End-to-end builds of the fixture site through the public API.
//!
//! The fixture tree is used directly as the build source: the pipeline only
//! reads it, and every run writes into a fresh temp output directory.

use cachebust::config::{BuildConfig, ReferenceConfig};
use cachebust::hashing::HashAlgorithm;
use cachebust::pipeline::{self, BuildError};
use cachebust::rewrite::ReferencePatterns;
use cachebust::scan;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture_site() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site")
}

fn config_into(output: &Path) -> BuildConfig {
    BuildConfig {
        source: fixture_site(),
        output: output.to_path_buf(),
        ..BuildConfig::default()
    }
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

fn renamed<'a>(summary: &'a pipeline::BuildSummary, original: &str) -> &'a str {
    &summary
        .report
        .find(original)
        .unwrap_or_else(|| panic!("{original} was not fingerprinted"))
        .renamed
}

#[test]
fn builds_fixture_site() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("dist");
    let summary = pipeline::build(&config_into(&out)).unwrap();

    assert_eq!(summary.copied, 12);
    assert!(summary.report.skipped.is_empty());
    assert_eq!(summary.report.assets.len(), 9);

    // images, then styles, then scripts, each sorted by filename
    let order: Vec<&str> = summary
        .report
        .assets
        .iter()
        .map(|a| a.original.as_str())
        .collect();
    assert_eq!(
        order,
        vec![
            "logo-old.png",
            "logo.png",
            "photo-300w.jpeg",
            "photo-300w.webp",
            "photo-600w.webp",
            "print.css",
            "style.css",
            "analytics.js",
            "slideshow.js",
        ]
    );

    // untouched files are copied verbatim
    assert_eq!(read(&out, "robots.txt"), read(&fixture_site(), "robots.txt"));
}

#[test]
fn renamed_files_carry_content_hash() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("dist");
    let summary = pipeline::build(&config_into(&out)).unwrap();

    let logo = summary.report.find("logo.png").unwrap();
    let expected = HashAlgorithm::Md5.fingerprint(b"PNG logo v2", 8);
    assert_eq!(logo.fingerprint, expected);
    assert_eq!(logo.renamed, format!("logo.{expected}.png"));
    assert!(out.join("assets/images").join(&logo.renamed).exists());
    assert!(!out.join("assets/images/logo.png").exists());

    // distinct content, distinct names; the old logo is its own asset
    let old = summary.report.find("logo-old.png").unwrap();
    assert_ne!(old.fingerprint, logo.fingerprint);
}

#[test]
fn references_point_at_renamed_assets() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("dist");
    let summary = pipeline::build(&config_into(&out)).unwrap();

    let index = read(&out, "index.html");
    let style = renamed(&summary, "style.css");
    let logo = renamed(&summary, "logo.png");
    let old = renamed(&summary, "logo-old.png");
    let slideshow = renamed(&summary, "slideshow.js");
    let w300 = renamed(&summary, "photo-300w.webp");
    let w600 = renamed(&summary, "photo-600w.webp");

    assert!(index.contains(&format!(r#"<link rel="stylesheet" href="/assets/css/{style}">"#)));
    assert!(index.contains(&format!(r#"<img src="/assets/images/{logo}" alt="Site logo">"#)));
    assert!(index.contains(&format!(r#"<a href="/assets/images/{old}">logo-old.png</a>"#)));
    assert!(index.contains(&format!(r#"src="/assets/js/{slideshow}?v=1""#)));
    assert!(index.contains(&format!(
        r#"srcset="/assets/images/{w300} 300w, /assets/images/{w600} 600w""#
    )));

    let post = read(&out, "blog/first-post/index.html");
    assert!(post.contains(&format!(r#"href="../../assets/css/{style}""#)));
    assert!(post.contains(&format!("url('/assets/images/{w600}')")));
    assert!(post.contains(&format!("src='/assets/js/{slideshow}'")));
    // prose mentions are not path references
    assert!(post.contains("<p>logo.png and style.css are mentioned here in prose only.</p>"));
}

#[test]
fn stylesheet_is_rewritten_before_it_is_hashed() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("dist");
    let summary = pipeline::build(&config_into(&out)).unwrap();

    let style = summary.report.find("style.css").unwrap();
    let css = read(&out, &format!("assets/css/{}", style.renamed));
    let logo = renamed(&summary, "logo.png");
    let print = renamed(&summary, "print.css");

    assert!(css.contains(&format!("url('/assets/images/{logo}') no-repeat")));
    assert!(css.contains(&format!(r#"@import url("{print}") print;"#)));
    assert_eq!(
        style.fingerprint,
        HashAlgorithm::Md5.fingerprint(css.as_bytes(), 8)
    );
}

#[test]
fn no_path_reference_to_an_original_name_survives() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("dist");
    let summary = pipeline::build(&config_into(&out)).unwrap();

    let files = scan::reference_files(&out, &ReferenceConfig::default()).unwrap();
    for asset in &summary.report.assets {
        let patterns = ReferencePatterns::new(&asset.original).unwrap();
        for file in &files {
            let text = fs::read(&file.path).unwrap();
            assert_eq!(
                patterns.count(file.kind, &text),
                0,
                "{} still references {}",
                file.path.display(),
                asset.original
            );
        }
    }
}

#[test]
fn rebuild_is_stable() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("dist");
    let config = config_into(&out);

    let first = pipeline::build(&config).unwrap();
    let first_index = read(&out, "index.html");
    let second = pipeline::build(&config).unwrap();

    let names = |s: &pipeline::BuildSummary| -> Vec<String> {
        s.report.assets.iter().map(|a| a.renamed.clone()).collect()
    };
    assert_eq!(names(&first), names(&second));
    assert_eq!(read(&out, "index.html"), first_index);
    // no leftovers from the first run
    assert_eq!(fs::read_dir(out.join("assets/images")).unwrap().count(), 5);
}

#[test]
fn missing_category_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("site");
    fs::create_dir_all(source.join("assets/css")).unwrap();
    fs::write(source.join("assets/css/style.css"), "body { color: red }").unwrap();
    fs::write(
        source.join("index.html"),
        r#"<link href="/assets/css/style.css">"#,
    )
    .unwrap();
    let config = BuildConfig {
        source,
        output: tmp.path().join("dist"),
        ..BuildConfig::default()
    };

    let summary = pipeline::build(&config).unwrap();

    assert_eq!(summary.report.skipped, vec!["images", "scripts"]);
    let style = HashAlgorithm::Md5.fingerprint(b"body { color: red }", 8);
    assert_eq!(
        read(&config.output, "index.html"),
        format!(r#"<link href="/assets/css/style.{style}.css">"#)
    );
}

#[test]
fn output_inside_source_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("site");
    fs::create_dir_all(&source).unwrap();
    let config = BuildConfig {
        output: source.join("dist"),
        source,
        ..BuildConfig::default()
    };

    let err = pipeline::build(&config).unwrap_err();
    assert!(matches!(err, BuildError::Overlapping { .. }));
}
