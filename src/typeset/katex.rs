use super::{TypesetConfig, TypesetFuture, Typesetter};
use crate::error::LatexError;
use crate::host::Document;
use crate::wrap::{WRAPPER_CLOSE, wrapper_regions};
use ego_tree::NodeId;
use regex::Regex;
use std::sync::LazyLock;

/// How often a pass is redone because the node changed while rendering
const MAX_TYPESET_ATTEMPTS: usize = 8;

static ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\\\|\\\$").expect("escape pattern is valid")
});

static ENVIRONMENT_BEGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\begin\{([A-Za-z]+\*?)\}")
        .expect("environment pattern is valid")
});

/// Packages whose commands KaTeX provides out of the box
const KATEX_BUILTIN_PACKAGES: &[&str] =
    &["base", "ams", "newcommand", "noundefined", "require"];

pub const TYPESET_MARKER: &str = r#"<span class="latex" data-typeset="katex">"#;

/// Render a TeX snippet with KaTeX.
pub fn render_latex(latex: &str, display_mode: bool) -> Result<String, String> {
    let opts = katex::Opts::builder()
        .display_mode(display_mode)
        .throw_on_error(true)
        .build()
        .map_err(|e| e.to_string())?;

    katex::render_with_opts(latex, opts).map_err(|e| e.to_string())
}

/// Typesets the pending wrappers of a node with KaTeX, in place.
#[derive(Debug, Clone)]
pub struct KatexTypesetter {
    document: Document,
    config: TypesetConfig,
}

impl KatexTypesetter {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            config: TypesetConfig::default(),
        }
    }
}

impl Typesetter for KatexTypesetter {
    fn configure(&mut self, config: TypesetConfig) {
        for package in &config.packages {
            if !KATEX_BUILTIN_PACKAGES.contains(&package.as_str()) {
                tracing::warn!(
                    package = %package,
                    "package not available in KaTeX, ignored"
                );
            }
        }
        self.config = config;
    }

    /// Typeset the node's current content and write the result back.
    ///
    /// The write only happens if the node is unchanged since it was read;
    /// content streamed in meanwhile triggers a fresh pass over the new
    /// content instead of being overwritten.
    fn typeset(&self, node: NodeId) -> TypesetFuture {
        let document = self.document.clone();
        let config = self.config.clone();
        Box::pin(async move {
            for _ in 0..MAX_TYPESET_ATTEMPTS {
                let html = document
                    .inner_html(node)
                    .ok_or(LatexError::Detached(node))?;
                let source = html.clone();
                let config = config.clone();
                let typeset = tokio::task::spawn_blocking(move || {
                    typeset_html(&source, &config)
                })
                .await
                .map_err(|e| LatexError::Typeset {
                    node,
                    message: e.to_string(),
                })?;

                if typeset.html != html
                    && !document.replace_inner_html(node, &html, &typeset.html)
                {
                    tracing::debug!(?node, "node changed while typesetting");
                    continue;
                }
                return if typeset.failures.is_empty() {
                    Ok(())
                } else {
                    Err(LatexError::Typeset {
                        node,
                        message: typeset.failures.join("; "),
                    })
                };
            }
            Err(LatexError::Typeset {
                node,
                message: "content kept changing, left untouched".to_string(),
            })
        })
    }
}

/// Outcome of one typesetting pass over a piece of HTML
#[derive(Debug)]
pub struct TypesetHtml {
    pub html: String,
    /// One message per span left untypeset
    pub failures: Vec<String>,
}

/// Replace every pending wrapper with its KaTeX rendering.
///
/// Wrappers that fail keep their source, so the raw delimiters stay visible.
/// Bare environments outside wrappers are typeset in display mode when
/// `process_environments` is set.
pub fn typeset_html(html: &str, config: &TypesetConfig) -> TypesetHtml {
    let mut out = String::with_capacity(html.len());
    let mut failures = Vec::new();
    let mut pos = 0;

    for region in wrapper_regions(html) {
        let text = &html[pos..region.range.start];
        push_text(&mut out, &mut failures, text, config);
        pos = region.range.end;

        let source = &html[region.content.clone()];
        if region.typeset || source.contains('<') {
            out.push_str(&html[region.range.clone()]);
            continue;
        }

        let tex = htmlize::unescape(source);
        let rendered = match config.strip_delimiters(&tex) {
            Some((body, display)) => render_latex(body, display),
            None => Err(format!("no configured delimiters around `{}`", tex)),
        };
        match rendered {
            Ok(rendered) => {
                out.push_str(TYPESET_MARKER);
                out.push_str(&rendered);
                out.push_str(WRAPPER_CLOSE);
            }
            Err(e) => {
                failures.push(e);
                out.push_str(&html[region.range.clone()]);
            }
        }
    }
    push_text(&mut out, &mut failures, &html[pos..], config);

    TypesetHtml { html: out, failures }
}

/// Copy text outside wrappers, typesetting bare `\begin{..}..\end{..}`
/// environments on the way when enabled.
fn push_text(
    out: &mut String,
    failures: &mut Vec<String>,
    text: &str,
    config: &TypesetConfig,
) {
    let mut pos = 0;
    if config.process_environments {
        while let Some(caps) = ENVIRONMENT_BEGIN.captures_at(text, pos) {
            let begin = caps.get(0).map_or(pos..pos, |m| m.range());
            let end_tag = format!("\\end{{{}}}", &caps[1]);
            let Some(offset) = text[begin.end..].find(&end_tag) else {
                break;
            };
            let end = begin.end + offset + end_tag.len();
            let source = &text[begin.start..end];

            push_escaped(out, &text[pos..begin.start], config);
            pos = end;
            if source.contains('<') {
                out.push_str(source);
                continue;
            }
            match render_latex(&htmlize::unescape(source), true) {
                Ok(rendered) => {
                    out.push_str(TYPESET_MARKER);
                    out.push_str(&rendered);
                    out.push_str(WRAPPER_CLOSE);
                }
                Err(e) => {
                    failures.push(e);
                    out.push_str(source);
                }
            }
        }
    }
    push_escaped(out, &text[pos..], config);
}

/// With escapes enabled, `\$` becomes an entity so it shows as a dollar sign
/// without pairing up on the next pass. `\\` is an escaped backslash and
/// does not escape a following `$`.
fn push_escaped(out: &mut String, text: &str, config: &TypesetConfig) {
    if config.process_escapes {
        let escaped = ESCAPE.replace_all(text, |caps: &regex::Captures| {
            if &caps[0] == "\\$" { "&#36;" } else { "\\\\" }
        });
        out.push_str(&escaped);
    } else {
        out.push_str(text);
    }
}
