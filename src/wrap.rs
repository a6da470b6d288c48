//! String-level wrapping of math spans.
//!
//! The wrapper works on serialized HTML and never re-parses it, so bytes
//! outside the inserted markers come out exactly as they went in. The
//! flip side is that a span crossing a tag boundary gets wrapped anyway and
//! produces broken markup; that case is not detected.
use crate::matcher::find_math_spans;
use regex::Regex;
use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

pub const WRAPPER_OPEN: &str = r#"<span class="latex">"#;
pub const WRAPPER_CLOSE: &str = "</span>";

static WRAPPER_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<span class="latex"(?:\s[^>]*)?>"#)
        .expect("wrapper pattern is valid")
});

static SPAN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<span\b[^>]*>|</span\s*>").expect("span tag pattern is valid")
});

/// An existing wrapper element found in a piece of HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperRegion {
    /// The whole element, tags included
    pub range: Range<usize>,
    /// Between the opening and the closing tag
    pub content: Range<usize>,
    /// Whether the typesetter has already replaced the source
    pub typeset: bool,
}

/// Locate wrapper elements, balancing nested `<span>`s inside them.
///
/// An unclosed wrapper swallows the rest of the input.
pub fn wrapper_regions(html: &str) -> Vec<WrapperRegion> {
    let mut regions = Vec::new();
    let mut pos = 0;

    while let Some(open) = WRAPPER_START.find_at(html, pos) {
        let mut depth = 1usize;
        let mut close = None;
        for tag in SPAN_TAG.find_iter(&html[open.end()..]) {
            if tag.as_str().starts_with("</") {
                depth -= 1;
                if depth == 0 {
                    close = Some((
                        open.end() + tag.start(),
                        open.end() + tag.end(),
                    ));
                    break;
                }
            } else {
                depth += 1;
            }
        }
        let (content_end, end) = close.unwrap_or((html.len(), html.len()));
        regions.push(WrapperRegion {
            range: open.start()..end,
            content: open.end()..content_end,
            typeset: open.as_str().contains("data-typeset"),
        });
        pos = end;
    }

    regions
}

/// Enclose every math span outside existing wrappers in a wrapper element.
///
/// Content already inside a wrapper is left alone, so wrapping twice gives
/// the same result as wrapping once.
pub fn wrap(html: &str) -> Cow<'_, str> {
    let mut out = String::new();
    let mut copied = 0;

    for segment in unwrapped_segments(html) {
        let text = &html[segment.clone()];
        for span in find_math_spans(text) {
            let start = segment.start + span.start;
            out.push_str(&html[copied..start]);
            out.push_str(WRAPPER_OPEN);
            out.push_str(span.text);
            out.push_str(WRAPPER_CLOSE);
            copied = segment.start + span.end;
        }
    }

    if copied == 0 {
        return Cow::Borrowed(html);
    }
    out.push_str(&html[copied..]);
    Cow::Owned(out)
}

/// The parts of `html` not covered by any wrapper region
fn unwrapped_segments(html: &str) -> Vec<Range<usize>> {
    let mut segments = Vec::new();
    let mut pos = 0;
    for region in wrapper_regions(html) {
        if region.range.start > pos {
            segments.push(pos..region.range.start);
        }
        pos = region.range.end;
    }
    if pos < html.len() {
        segments.push(pos..html.len());
    }
    segments
}
