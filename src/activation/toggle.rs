//! The on/off control. Its label and style depend only on the flag.
use maud::html;

pub fn label(active: bool) -> &'static str {
    if active { "Disable LaTeX" } else { "Enable LaTeX" }
}

pub fn class(active: bool) -> &'static str {
    if active {
        "latex-toggle latex-toggle-active"
    } else {
        "latex-toggle"
    }
}

pub fn render_toggle(active: bool) -> String {
    html! {
        button type="button" class=(class(active)) { (label(active)) }
    }
    .into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn test_render_toggle() {
        assert_snapshot!(
            render_toggle(false),
            @r#"<button type="button" class="latex-toggle">Enable LaTeX</button>"#
        );
        assert_snapshot!(
            render_toggle(true),
            @r#"<button type="button" class="latex-toggle latex-toggle-active">Disable LaTeX</button>"#
        );
    }
}
