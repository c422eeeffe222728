//! Textual reference rewriting.
//!
//! References are found by scanning for the literal old filename, not by
//! parsing markup. Files are matched as bytes, so pages in any encoding whose
//! ASCII bytes are literal (UTF-8, Latin-1, ...) are rewritten without
//! touching anything but the filename. Two rules constrain a match to
//! something that looks like a path:
//!
//! - **HTML**: the filename sits inside a quoted or parenthesized context.
//!   Walking back from the filename, the first `"`, `'`, `(`, `)`, `<`, `>`
//!   or newline must be one of the openers `"`, `'` or `(`. The byte right
//!   before the filename must be that opener, `/`, whitespace or `,`, so
//!   `logo.png` never matches inside `mylogo.png`. The filename must be
//!   followed by `?`, `#`, `&` (as in `&quot;`), `,`, a closing quote or
//!   paren, whitespace, or the end of the text. Neither boundary is
//!   consumed, so several references in one attribute value (a `srcset`
//!   list naming the same image twice) are all found.
//! - **CSS**: the filename sits inside `url(...)`, quoted or not, optionally
//!   after a path ending in `/` and before a query or fragment.
//!
//! Only the filename bytes are replaced; quotes, path prefixes and query
//! strings survive untouched.
//!
//! ```text
//! <link href="/assets/css/style.css?v=2">   →  <link href="/assets/css/style.a1b2c3d4.css?v=2">
//! background: url('../images/logo.png');    →  background: url('../images/logo.9f8e7d6c.png');
//! <p>logo.png is our logo</p>                   (unchanged: no path context)
//! ```

use crate::scan::ReferenceKind;
use regex::bytes::{Captures, Regex};
use std::borrow::Cow;
use std::ops::Range;

/// Compiled matchers for one asset filename.
#[derive(Debug, Clone)]
pub struct ReferencePatterns {
    filename: String,
    literal: Regex,
    css: Regex,
}

impl ReferencePatterns {
    pub fn new(filename: &str) -> Result<Self, regex::Error> {
        let name = regex::escape(filename);
        let literal = Regex::new(&name)?;
        let css = Regex::new(&format!(
            r#"(url\(\s*['"]?)((?:(?-u:[^'"()\n])*?/)?){name}((?:[?#](?-u:[^'"()\n])*)?\s*['"]?\s*\))"#
        ))?;
        Ok(Self {
            filename: filename.to_string(),
            literal,
            css,
        })
    }

    /// The filename these patterns look for.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Byte ranges of the filename in every path-like HTML context.
    fn html_spans(&self, text: &[u8]) -> Vec<Range<usize>> {
        self.literal
            .find_iter(text)
            .filter(|m| opens_path(text, m.start()) && closes_path(text, m.end()))
            .map(|m| m.range())
            .collect()
    }

    /// Replace every path-like reference in `text` with `new_name`.
    ///
    /// Borrows `text` unchanged when nothing matched, which is how callers
    /// decide whether a file needs writing back.
    pub fn rewrite<'t>(
        &self,
        kind: ReferenceKind,
        text: &'t [u8],
        new_name: &str,
    ) -> Cow<'t, [u8]> {
        match kind {
            ReferenceKind::Html => splice(text, &self.html_spans(text), new_name.as_bytes()),
            ReferenceKind::Css => self.css.replace_all(text, |caps: &Captures| {
                let suffix = caps.get(3).map_or(&b""[..], |m| m.as_bytes());
                [&caps[1], &caps[2], new_name.as_bytes(), suffix].concat()
            }),
        }
    }

    /// Number of path-like references in `text`.
    pub fn count(&self, kind: ReferenceKind, text: &[u8]) -> usize {
        match kind {
            ReferenceKind::Html => self.html_spans(text).len(),
            ReferenceKind::Css => self.css.find_iter(text).count(),
        }
    }
}

/// Whether a filename starting at `start` sits in a quoted or parenthesized
/// path context.
fn opens_path(text: &[u8], start: usize) -> bool {
    let Some(&before) = start.checked_sub(1).and_then(|i| text.get(i)) else {
        return false;
    };
    if !matches!(before, b'"' | b'\'' | b'(' | b'/' | b',') && !before.is_ascii_whitespace() {
        return false;
    }
    text[..start]
        .iter()
        .rev()
        .find(|b| matches!(b, b'"' | b'\'' | b'(' | b')' | b'<' | b'>' | b'\n'))
        .is_some_and(|b| matches!(b, b'"' | b'\'' | b'('))
}

/// Whether a filename ending at `end` is followed by a path terminator.
fn closes_path(text: &[u8], end: usize) -> bool {
    match text.get(end) {
        None => true,
        Some(b) => {
            matches!(b, b'?' | b'#' | b'&' | b',' | b'"' | b'\'' | b')') || b.is_ascii_whitespace()
        }
    }
}

fn splice<'t>(text: &'t [u8], spans: &[Range<usize>], replacement: &[u8]) -> Cow<'t, [u8]> {
    if spans.is_empty() {
        return Cow::Borrowed(text);
    }
    let mut out = Vec::with_capacity(text.len() + spans.len() * replacement.len());
    let mut last = 0;
    for span in spans {
        out.extend_from_slice(&text[last..span.start]);
        out.extend_from_slice(replacement);
        last = span.end;
    }
    out.extend_from_slice(&text[last..]);
    Cow::Owned(out)
}
