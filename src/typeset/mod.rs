//! The typesetting service the pipeline hands wrapped nodes to.
pub mod katex;

use crate::error::LatexError;
use ego_tree::NodeId;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

pub use self::katex::KatexTypesetter;

pub type TypesetFuture =
    Pin<Box<dyn Future<Output = Result<(), LatexError>> + Send + 'static>>;

/// An engine that turns wrapped math in a node into rendered notation.
pub trait Typesetter: Send + Sync {
    fn configure(&mut self, config: TypesetConfig);

    /// Typeset the wrappers inside `node` only. The returned future is
    /// detached by the caller and never awaited in the pipeline.
    fn typeset(&self, node: NodeId) -> TypesetFuture;
}

/// Delimiter pairs and options handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TypesetConfig {
    pub inline_math: Vec<[String; 2]>,
    pub display_math: Vec<[String; 2]>,
    /// `\$` outside math stands for a literal dollar sign
    pub process_escapes: bool,
    /// Bare `\begin{..}..\end{..}` outside delimiters is math too
    pub process_environments: bool,
    pub packages: Vec<String>,
}

impl Default for TypesetConfig {
    fn default() -> Self {
        let pair = |open: &str, close: &str| [open.to_string(), close.to_string()];
        Self {
            inline_math: vec![pair("$", "$"), pair("\\(", "\\)")],
            display_math: vec![pair("$$", "$$"), pair("\\[", "\\]")],
            process_escapes: true,
            process_environments: true,
            packages: vec!["ams".to_string()],
        }
    }
}

impl TypesetConfig {
    /// Split wrapped source into its TeX body and display mode, trying the
    /// longest opening delimiter first.
    pub fn strip_delimiters<'s>(&self, source: &'s str) -> Option<(&'s str, bool)> {
        let mut pairs: Vec<(&[String; 2], bool)> = self
            .inline_math
            .iter()
            .map(|p| (p, false))
            .chain(self.display_math.iter().map(|p| (p, true)))
            .collect();
        pairs.sort_by_key(|(p, _)| std::cmp::Reverse(p[0].len()));

        pairs.into_iter().find_map(|([open, close], display)| {
            let body = source.strip_prefix(open.as_str())?;
            let body = body.strip_suffix(close.as_str())?;
            (!body.is_empty()).then_some((body, display))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("$x$", Some(("x", false)))]
    #[case("$$x$$", Some(("x", true)))]
    #[case("\\(x\\)", Some(("x", false)))]
    #[case("\\[x\\]", Some(("x", true)))]
    #[case("x", None)]
    #[case("$$", None)]
    fn test_strip_delimiters(
        #[case] source: &str,
        #[case] expected: Option<(&str, bool)>,
    ) {
        assert_eq!(TypesetConfig::default().strip_delimiters(source), expected);
    }
}
