use super::document::ElementData;
use crate::error::LatexError;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static ATTRIBUTE_SELECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\[\s*([A-Za-z_:][-A-Za-z0-9_:.]*)\s*(?:=\s*(?:"([^"]*)"|'([^']*)'|([^\]\s"']+))\s*)?\]$"#,
    )
    .expect("attribute selector pattern is valid")
});

/// A structural attribute selector: `[name]` or `[name="value"]`.
///
/// This is the only coupling to the host page, so nothing richer is supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    name: String,
    value: Option<String>,
}

impl AttributeSelector {
    pub fn parse(selector: &str) -> Result<Self, LatexError> {
        let caps = ATTRIBUTE_SELECTOR
            .captures(selector.trim())
            .ok_or_else(|| LatexError::InvalidSelector(selector.to_string()))?;
        let name = caps[1].to_string();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().to_string());
        Ok(Self { name, value })
    }

    pub fn matches(&self, element: &ElementData) -> bool {
        match (element.attr(&self.name), &self.value) {
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual == expected,
            (None, _) => false,
        }
    }

    /// Markup for a `tag` element this selector matches, around `inner_html`.
    pub fn element_markup(&self, tag: &str, inner_html: &str) -> String {
        let mut value = String::new();
        if let Some(v) = &self.value {
            // Writing to a String cannot fail
            let _ = pulldown_cmark_escape::escape_html(&mut value, v);
        }
        format!(r#"<{tag} {}="{value}">{inner_html}</{tag}>"#, self.name)
    }
}

impl fmt::Display for AttributeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "[{}=\"{}\"]", self.name, value),
            None => write!(f, "[{}]", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use rstest::rstest;

    fn element(attrs: &[(&str, &str)]) -> ElementData {
        ElementData {
            tag: "div".to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[rstest]
    #[case(r#"[data-element-id="ai-response"]"#)]
    #[case(r#"[data-element-id='ai-response']"#)]
    #[case(r#"[data-element-id=ai-response]"#)]
    #[case(r#"[ data-element-id = "ai-response" ]"#)]
    fn test_parse_quoting(#[case] selector: &str) {
        let parsed = AttributeSelector::parse(selector).unwrap();
        insta::allow_duplicates! {
            assert_snapshot!(parsed, @r#"[data-element-id="ai-response"]"#);
        }
    }

    #[rstest]
    #[case("div")]
    #[case("[data-x=\"a\"] p")]
    #[case("[=\"a\"]")]
    #[case("")]
    fn test_parse_rejects(#[case] selector: &str) {
        assert!(matches!(
            AttributeSelector::parse(selector),
            Err(LatexError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_matches() {
        let sel = AttributeSelector::parse(r#"[role="message"]"#).unwrap();
        assert!(sel.matches(&element(&[("role", "message")])));
        assert!(!sel.matches(&element(&[("role", "button")])));
        assert!(!sel.matches(&element(&[])));

        let presence = AttributeSelector::parse("[hidden]").unwrap();
        assert!(presence.matches(&element(&[("hidden", "")])));
        assert!(!presence.matches(&element(&[("id", "x")])));
    }

    #[test]
    fn test_element_markup_matches_selector() {
        let sel = AttributeSelector::parse(r#"[data-element-id="ai-response"]"#)
            .unwrap();
        assert_snapshot!(
            sel.element_markup("div", "x"),
            @r#"<div data-element-id="ai-response">x</div>"#
        );
    }
}
