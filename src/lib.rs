//! # cachebust
//!
//! Content-hash fingerprinting for a rendered static site. Every stylesheet,
//! script and image in the configured asset directories is renamed to
//! include a short digest of its bytes, and every reference to it in the
//! site's HTML and CSS is rewritten to match, so the result can be served
//! with far-future cache headers.
//!
//! # Architecture: Copy, Then Fingerprint In Place
//!
//! ```text
//! 1. Clear     dist/                    (output is disposable)
//! 2. Copy      src_site/  →  dist/      (source is never modified)
//! 3. Hash      dist/assets/*            (rename + rewrite references)
//! ```
//!
//! The fingerprint pass works on the copy. Because the copy is always made
//! from the pristine source, reruns produce identical names for identical
//! content and there is no state to carry between builds.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Clear → copy → fingerprint, with directory sanity checks |
//! | [`fingerprint`] | The per-asset hash/rename/rewrite pass and its dry-run survey |
//! | [`rewrite`] | Path-context regexes that find and replace one filename in HTML or CSS |
//! | [`scan`] | Asset discovery per category and reference-file discovery |
//! | [`hashing`] | Digest algorithms and the `{stem}.{hash}{.ext}` naming rule |
//! | [`feed`] | Absolutizes URLs and collapses `<picture>` in feed content |
//! | [`config`] | Optional `cachebust.toml` loading, merging over stock defaults, validation |
//! | [`types`] | Reports shared between the passes and the CLI |
//! | [`output`] | CLI output formatting: build summary, check survey, output tree |
//!
//! # Design Decisions
//!
//! ## Text Matching, Not Parsing
//!
//! References are found by matching the literal old filename in a path-like
//! context rather than by parsing HTML or CSS. This reaches attributes,
//! inline styles, `srcset` lists and `url()` alike, in any file the site
//! generator produced, at the cost of being a heuristic. The contexts are
//! strict enough that `logo.png` does not match `mylogo.png` or
//! `logo-old.png`, and that a filename mentioned in prose is left alone.
//!
//! ## Images Before Stylesheets
//!
//! Categories run in configured order, and the default puts images first.
//! A stylesheet that points at `logo.png` is therefore rewritten before it
//! is itself hashed, so its fingerprint changes whenever the logo does.

pub mod config;
pub mod feed;
pub mod fingerprint;
pub mod hashing;
pub mod output;
pub mod pipeline;
pub mod rewrite;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
