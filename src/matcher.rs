//! Delimiter matching over serialized HTML.
//!
//! Four forms are recognised: `$...$`, `$$...$$`, `\(...\)` and `\[...\]`.
//! The scan knows nothing about tags. A pair stops at its first closer, so
//! nested structures end the match early.
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

// Alternation order matters: an escaped backslash is consumed first so it
// cannot escape what follows, an escaped dollar is consumed before it can
// open a span, and `$$` is tried before `$`.
static MATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\\\\",
        r"|\\\$",
        r"|\$\$(?:[^$\\]|\\[\s\S])+?\$\$",
        r"|\$(?:[^$\\\n]|\\[^\n])+\$",
        r"|\\\([\s\S]+?\\\)",
        r"|\\\[[\s\S]+?\\\]",
    ))
    .expect("math delimiter pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Delimiter {
    /// `$...$`
    Dollar,
    /// `$$...$$`
    DoubleDollar,
    /// `\(...\)`
    Paren,
    /// `\[...\]`
    Bracket,
}

impl Delimiter {
    fn classify(matched: &str) -> Option<Self> {
        if matched == "\\\\" || matched.starts_with("\\$") {
            None
        } else if matched.starts_with("$$") {
            Some(Self::DoubleDollar)
        } else if matched.starts_with('$') {
            Some(Self::Dollar)
        } else if matched.starts_with("\\(") {
            Some(Self::Paren)
        } else {
            Some(Self::Bracket)
        }
    }

    pub fn open(&self) -> &'static str {
        match self {
            Self::Dollar => "$",
            Self::DoubleDollar => "$$",
            Self::Paren => "\\(",
            Self::Bracket => "\\[",
        }
    }

    pub fn close(&self) -> &'static str {
        match self {
            Self::Dollar => "$",
            Self::DoubleDollar => "$$",
            Self::Paren => "\\)",
            Self::Bracket => "\\]",
        }
    }

    pub fn is_display(&self) -> bool {
        matches!(self, Self::DoubleDollar | Self::Bracket)
    }
}

/// A run of math markup, delimiters included, located by byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MathSpan<'h> {
    pub start: usize,
    pub end: usize,
    pub text: &'h str,
    pub delimiter: Delimiter,
}

impl<'h> MathSpan<'h> {
    /// The TeX source between the delimiters
    pub fn tex(&self) -> &'h str {
        let open = self.delimiter.open().len();
        let close = self.delimiter.close().len();
        &self.text[open..self.text.len() - close]
    }
}

/// Lazy iterator over the math spans of a string, in source order.
///
/// A clone is an independent cursor at the same position, so a fresh clone of
/// an unstarted scan replays it from the beginning.
#[derive(Debug, Clone)]
pub struct MathSpans<'h> {
    haystack: &'h str,
    pos: usize,
}

impl<'h> Iterator for MathSpans<'h> {
    type Item = MathSpan<'h>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let m = MATH_PATTERN.find_at(self.haystack, self.pos)?;
            self.pos = m.end();
            if let Some(delimiter) = Delimiter::classify(m.as_str()) {
                return Some(MathSpan {
                    start: m.start(),
                    end: m.end(),
                    text: m.as_str(),
                    delimiter,
                });
            }
        }
    }
}

pub fn find_math_spans(html: &str) -> MathSpans<'_> {
    MathSpans {
        haystack: html,
        pos: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use rstest::rstest;

    fn texts(html: &str) -> Vec<&str> {
        find_math_spans(html).map(|s| s.text).collect()
    }

    #[rstest]
    #[case("Compute $x^2+1$ now.", vec!["$x^2+1$"])]
    #[case("$$\\sum_i i$$", vec!["$$\\sum_i i$$"])]
    #[case("inline \\(a+b\\) here", vec!["\\(a+b\\)"])]
    #[case("display \\[a=b\\] here", vec!["\\[a=b\\]"])]
    #[case("$a$ and $b$", vec!["$a$", "$b$"])]
    #[case("$a$$b$", vec!["$a$", "$b$"])]
    #[case("<p>$x$</p><p>\\(y\\)</p>", vec!["$x$", "\\(y\\)"])]
    #[case("$$a$$ then $b$ then \\[c\\]", vec!["$$a$$", "$b$", "\\[c\\]"])]
    #[case(r"a\\$x$", vec!["$x$"])]
    #[case(r"line one\\$x$ after", vec!["$x$"])]
    #[case(r"\\\$5 and $y$", vec!["$y$"])]
    fn test_find_spans(#[case] html: &str, #[case] expected: Vec<&str>) {
        assert_eq!(texts(html), expected);
    }

    #[rstest]
    #[case("no math here")]
    #[case("costs $5")]
    #[case("costs $5\nand $6")]
    #[case("$$")]
    #[case("escaped \\$5 and \\$6")]
    #[case("<span data-x=\"1\">plain</span>")]
    fn test_no_spans(#[case] html: &str) {
        assert!(texts(html).is_empty());
    }

    #[test]
    fn test_spans_cover_their_text() {
        let html = "a $x$ b \\(y\\) c $$z$$";
        for span in find_math_spans(html) {
            assert_eq!(&html[span.start..span.end], span.text);
        }
    }

    #[test]
    fn test_first_closer_wins() {
        // Not nesting-aware: the inner `\)` closes the outer `\(`.
        assert_eq!(texts(r"\(f\(x\) + 1\)"), vec![r"\(f\(x\)"]);
    }

    #[test]
    fn test_escaped_dollar_inside_math() {
        assert_eq!(texts(r"$a \$ b$"), vec![r"$a \$ b$"]);
    }

    #[test]
    fn test_display_spans_lines() {
        let html = "$$\na = b\n$$";
        let spans: Vec<_> = find_math_spans(html).collect();
        assert_eq!(spans.len(), 1);
        assert!(spans[0].delimiter.is_display());
    }

    #[test]
    fn test_tex_strips_delimiters() {
        let html = r"$a$ $$b$$ \(c\) \[d\]";
        let tex: Vec<_> = find_math_spans(html).map(|s| s.tex()).collect();
        assert_eq!(tex, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_sequence_is_restartable() {
        let spans = find_math_spans("$a$ $b$");
        let first: Vec<_> = spans.clone().collect();
        let second: Vec<_> = spans.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_span_serialization() {
        let span = find_math_spans("x $y$").next().unwrap();
        assert_snapshot!(
            serde_json::to_string(&span).unwrap(),
            @r#"{"start":2,"end":5,"text":"$y$","delimiter":"dollar"}"#
        );
    }
}
