//! Render command implementation.
//!
//! Replays a chat session: messages are appended to the container one by one
//! while the controller observes it, then the settled page is written out.
use super::write_output;
use crate::cli::args::SessionArgs;
use chatex::activation::Controller;
use chatex::error::{ErrorReporter, HostElement, LatexError};
use chatex::host::{AttributeSelector, Document, Locator, SelectorLocator};
use chatex::typeset::KatexTypesetter;
use maud::{DOCTYPE, PreEscaped, html};
use std::path::PathBuf;
use std::time::Duration;

pub fn run(
    session: SessionArgs,
    page: PathBuf,
    messages: Vec<PathBuf>,
    interval_ms: u64,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = session.load_config()?;
    let document = Document::parse(&std::fs::read_to_string(&page)?);
    let message = AttributeSelector::parse(&config.selectors.message)?;
    let bodies = messages
        .iter()
        .map(std::fs::read_to_string)
        .collect::<Result<Vec<_>, _>>()?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut controller = Controller::from_config(
            document.clone(),
            &config,
            KatexTypesetter::new(document.clone()),
            session.store(),
            ErrorReporter::log_only(),
        )?;
        controller.init();
        if !controller.is_observing() {
            tracing::warn!("not observing, messages are appended unchanged");
        }

        let locator = SelectorLocator::new(document.clone(), &config.selectors)?;
        for body in &bodies {
            let container = locator
                .container()
                .ok_or(LatexError::MissingElement(HostElement::Container))?;
            document.append_html(container, &message.element_markup("div", body));
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        }
        controller.settle().await;
        Ok::<_, LatexError>(())
    })?;

    let out = html! {
        (DOCTYPE)
        (PreEscaped(document.html()))
    };
    write_output(output, &out.into_string())
}
