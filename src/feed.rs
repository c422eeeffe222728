//! Feed content preparation.
//!
//! Post bodies embedded in the Atom feed are read outside the site, so
//! site-relative URLs must become absolute and responsive `<picture>`
//! elements are collapsed into a single `<img>` that feed readers understand.
//!
//! Two tiers, tried in order on the same input:
//!
//! 1. **Structured**: stream the fragment through `quick-xml`, rewriting
//!    `a[href]` and `img[src]` and replacing each `<picture>` with its inner
//!    image. HTML void elements (`<img>`, `<br>`, ...) are accepted without a
//!    closing slash and end tags are not cross-checked, but attributes on the
//!    elements being rewritten must parse, and every `<picture>` must close.
//! 2. **Fallback**: three regex substitutions that need no well-formedness
//!    at all. Less precise (attribute order matters for `<picture>`), but it
//!    always produces output.
//!
//! Only URLs starting with a single `/` are prefixed. Protocol-relative
//! `//host/path` URLs already name their host and are left alone in both
//! tiers, unlike a plain "starts with `/`" test, which would turn them into
//! `https://example.com//host/path`.
//!
//! ```text
//! <picture><source srcset="/i/a.webp"><img src="/i/a.png" alt="A" class="r"></picture>
//!   → <img alt="A" class="r" src="https://example.com/i/a.png"/>
//! <a href="/blog/">blog</a>
//!   → <a href="https://example.com/blog/">blog</a>
//! ```

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use regex::{Captures, Regex};
use std::io::Write;
use std::sync::LazyLock;
use thiserror::Error;

/// Element wrapped around the fragment so it parses as a single document.
const WRAPPER: &str = "cachebust-feed";

/// Elements that never have content or an end tag in HTML.
const VOID_ELEMENTS: &[&[u8]] = &[
    b"area", b"base", b"br", b"col", b"embed", b"hr", b"img", b"input", b"link", b"meta",
    b"source", b"track", b"wbr",
];

static PICTURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<picture>.*?<img[^>]*src="([^"]*)"[^>]*alt="([^"]*)"[^>]*>.*?</picture>"#)
        .unwrap()
});

static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="/((?:[^"/][^"]*)?)""#).unwrap());

static SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src="/((?:[^"/][^"]*)?)""#).unwrap());

/// Why the structured tier gave up on a fragment.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("XML attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("unclosed <{0}>")]
    Unclosed(String),
}

/// Which tier produced the prepared content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tier {
    Structured,
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedFeed {
    pub html: String,
    pub tier: Tier,
}

/// Make `content` self-contained for a feed served from `base_url`.
///
/// Empty content yields an empty string; an empty base URL leaves the
/// content untouched. A trailing `/` on the base URL is ignored.
pub fn prepare_feed_content(content: &str, base_url: &str) -> PreparedFeed {
    if content.is_empty() || base_url.is_empty() {
        return PreparedFeed {
            html: content.to_string(),
            tier: Tier::Structured,
        };
    }
    let base = base_url.strip_suffix('/').unwrap_or(base_url);

    match absolutize_structured(content, base) {
        Ok(html) => PreparedFeed {
            html,
            tier: Tier::Structured,
        },
        Err(e) => PreparedFeed {
            html: absolutize_fallback(content, base),
            tier: Tier::Fallback {
                reason: e.to_string(),
            },
        },
    }
}

/// `/path` but not `//host/path`.
fn is_site_relative(value: &[u8]) -> bool {
    value.starts_with(b"/") && !value.starts_with(b"//")
}

fn absolutize(value: &[u8], base: &str) -> Vec<u8> {
    if is_site_relative(value) {
        [base.as_bytes(), value].concat()
    } else {
        value.to_vec()
    }
}

fn is_tag(e: &BytesStart<'_>, tag: &[u8]) -> bool {
    e.name().as_ref().eq_ignore_ascii_case(tag)
}

fn is_void_name(name: &[u8]) -> bool {
    VOID_ELEMENTS.iter().any(|tag| name.eq_ignore_ascii_case(tag))
}

// ============================================================================
// Structured tier
// ============================================================================

fn absolutize_structured(content: &str, base: &str) -> Result<String, FeedError> {
    let wrapped = format!("<{WRAPPER}>{content}</{WRAPPER}>");
    let mut reader = Reader::from_str(&wrapped);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = false;
    reader.config_mut().allow_unmatched_ends = true;

    let mut writer = Writer::new(Vec::new());
    let mut picture: Option<Picture> = None;

    loop {
        let event = reader.read_event()?;
        if matches!(event, Event::Eof) {
            break;
        }

        if let Some(mut open) = picture.take() {
            if open.push(event.into_owned())? {
                open.finish(&mut writer, base)?;
            } else {
                picture = Some(open);
            }
            continue;
        }

        match event {
            Event::Start(e) if is_tag(&e, b"picture") => {
                picture = Some(Picture::open(e.into_owned()));
            }
            other => write_absolutized(&mut writer, other, base)?,
        }
    }

    if picture.is_some() {
        return Err(FeedError::Unclosed("picture".to_string()));
    }

    let html = String::from_utf8(writer.into_inner())?;
    html.strip_prefix(&format!("<{WRAPPER}>"))
        .and_then(|rest| rest.strip_suffix(&format!("</{WRAPPER}>")))
        .map(str::to_string)
        .ok_or_else(|| FeedError::Unclosed(WRAPPER.to_string()))
}

fn write_absolutized<W: Write>(
    writer: &mut Writer<W>,
    event: Event<'_>,
    base: &str,
) -> Result<(), FeedError> {
    match event {
        Event::Start(e) if is_void_name(e.name().as_ref()) => {
            writer.write_event(Event::Empty(absolutize_element(&e, base)?))?
        }
        Event::Start(e) => writer.write_event(Event::Start(absolutize_element(&e, base)?))?,
        Event::Empty(e) => writer.write_event(Event::Empty(absolutize_element(&e, base)?))?,
        Event::End(e) if is_void_name(e.name().as_ref()) => {}
        other => writer.write_event(other)?,
    }
    Ok(())
}

/// Copy an element, prefixing `a[href]` / `img[src]` with the base URL.
fn absolutize_element(e: &BytesStart<'_>, base: &str) -> Result<BytesStart<'static>, FeedError> {
    let target: &[u8] = if is_tag(e, b"a") {
        b"href"
    } else if is_tag(e, b"img") {
        b"src"
    } else {
        return Ok(e.clone().into_owned());
    };

    let name = String::from_utf8(e.name().as_ref().to_vec())?;
    let mut out = BytesStart::new(name);
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref().eq_ignore_ascii_case(target) && is_site_relative(&attr.value) {
            let value = absolutize(&attr.value, base);
            out.push_attribute((attr.key.as_ref(), value.as_slice()));
        } else {
            out.push_attribute(attr);
        }
    }
    Ok(out)
}

/// Events of a `<picture>` element buffered until it closes.
struct Picture {
    events: Vec<Event<'static>>,
    depth: usize,
    img: Option<PictureImage>,
}

impl Picture {
    fn open(start: BytesStart<'static>) -> Self {
        Self {
            events: vec![Event::Start(start)],
            depth: 1,
            img: None,
        }
    }

    /// Buffer an event. Returns `true` once the outermost `</picture>` is seen.
    fn push(&mut self, event: Event<'static>) -> Result<bool, FeedError> {
        match &event {
            Event::Start(e) if is_tag(e, b"picture") => self.depth += 1,
            Event::End(e) if e.name().as_ref().eq_ignore_ascii_case(b"picture") => {
                self.depth -= 1
            }
            Event::Start(e) | Event::Empty(e) if self.img.is_none() && is_tag(e, b"img") => {
                self.img = Some(PictureImage::read(e)?);
            }
            _ => {}
        }
        self.events.push(event);
        Ok(self.depth == 0)
    }

    /// Emit the replacement `<img>`, or the untouched picture when it had none.
    fn finish<W: Write>(self, writer: &mut Writer<W>, base: &str) -> Result<(), FeedError> {
        match self.img {
            Some(img) => writer.write_event(Event::Empty(img.to_element(base)))?,
            None => {
                for event in self.events {
                    write_absolutized(writer, event, base)?;
                }
            }
        }
        Ok(())
    }
}

/// The attributes of a picture's `<img>` that survive the collapse.
#[derive(Default)]
struct PictureImage {
    src: Vec<u8>,
    alt: Vec<u8>,
    class: Vec<u8>,
}

impl PictureImage {
    fn read(e: &BytesStart<'_>) -> Result<Self, FeedError> {
        let mut img = Self::default();
        for attr in e.attributes() {
            let attr = attr?;
            let key = attr.key.as_ref().to_ascii_lowercase();
            match key.as_slice() {
                b"src" => img.src = attr.value.into_owned(),
                b"alt" => img.alt = attr.value.into_owned(),
                b"class" => img.class = attr.value.into_owned(),
                _ => {}
            }
        }
        Ok(img)
    }

    fn to_element(&self, base: &str) -> BytesStart<'static> {
        let mut el = BytesStart::new("img");
        el.push_attribute((&b"alt"[..], self.alt.as_slice()));
        if !self.class.is_empty() {
            el.push_attribute((&b"class"[..], self.class.as_slice()));
        }
        let src = absolutize(&self.src, base);
        el.push_attribute((&b"src"[..], src.as_slice()));
        el
    }
}

// ============================================================================
// Fallback tier
// ============================================================================

fn absolutize_fallback(content: &str, base: &str) -> String {
    let collapsed = PICTURE_RE.replace_all(content, |caps: &Captures| {
        let src = &caps[1];
        let src = if is_site_relative(src.as_bytes()) {
            format!("{base}{src}")
        } else {
            src.to_string()
        };
        format!(r#"<img src="{src}" alt="{}" />"#, &caps[2])
    });
    let linked = HREF_RE.replace_all(&collapsed, |caps: &Captures| {
        format!(r#"href="{base}/{}""#, &caps[1])
    });
    SRC_RE
        .replace_all(&linked, |caps: &Captures| {
            format!(r#"src="{base}/{}""#, &caps[1])
        })
        .into_owned()
}
