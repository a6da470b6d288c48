#![allow(dead_code)]

use chatex::activation::{ActivationFlag, Controller, MemoryStore};
use chatex::config::Config;
use chatex::error::{ErrorReporter, LatexError};
use chatex::host::{Document, Locator, SelectorLocator};
use chatex::typeset::{TypesetConfig, TypesetFuture, Typesetter};
use ego_tree::NodeId;
use maud::{DOCTYPE, html};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub const FLAG_KEY: &str = "latexExtensionActive";

/// Records the nodes it is asked to typeset; rejects them all when `fail`.
#[derive(Clone, Default)]
pub struct RecordingTypesetter {
    pub calls: Arc<Mutex<Vec<NodeId>>>,
    pub fail: bool,
}

impl Typesetter for RecordingTypesetter {
    fn configure(&mut self, _config: TypesetConfig) {}

    fn typeset(&self, node: NodeId) -> TypesetFuture {
        self.calls.lock().unwrap().push(node);
        let fail = self.fail;
        Box::pin(async move {
            tokio::task::yield_now().await;
            if fail {
                Err(LatexError::Typeset {
                    node,
                    message: "engine rejected the input".to_string(),
                })
            } else {
                Ok(())
            }
        })
    }
}

/// A chat page with a toggle mount and, optionally, the message container.
pub fn chat_page(with_container: bool) -> String {
    html! {
        (DOCTYPE)
        html {
            body {
                @if with_container {
                    div data-element-id="chat-space-end-part" {}
                }
                div data-element-id="message-input" {}
            }
        }
    }
    .into_string()
}

pub fn message(body: &str) -> String {
    format!(r#"<div data-element-id="ai-response">{body}</div>"#)
}

pub struct Session {
    pub document: Document,
    pub locator: SelectorLocator,
    pub store: Arc<MemoryStore>,
    pub controller: Controller,
    pub typesetter: RecordingTypesetter,
    pub errors: mpsc::UnboundedReceiver<LatexError>,
}

impl Session {
    pub fn new(page: &str, flag: Option<&str>) -> Self {
        Self::with_typesetter(page, flag, RecordingTypesetter::default())
    }

    pub fn with_typesetter(
        page: &str,
        flag: Option<&str>,
        typesetter: RecordingTypesetter,
    ) -> Self {
        let store = Arc::new(match flag {
            Some(value) => MemoryStore::with_entry(FLAG_KEY, value),
            None => MemoryStore::new(),
        });
        Self::with_store(page, store, typesetter)
    }

    pub fn with_store(
        page: &str,
        store: Arc<MemoryStore>,
        typesetter: RecordingTypesetter,
    ) -> Self {
        let config = Config::default();
        let document = Document::parse(page);
        let locator =
            SelectorLocator::new(document.clone(), &config.selectors).unwrap();
        let (reporter, errors) = ErrorReporter::channel();
        let controller = Controller::new(
            document.clone(),
            Arc::new(locator.clone()),
            Arc::new(typesetter.clone()),
            ActivationFlag::new(store.clone(), FLAG_KEY),
            config.quiet_period(),
            reporter,
        );
        Self {
            document,
            locator,
            store,
            controller,
            typesetter,
            errors,
        }
    }

    pub fn container(&self) -> NodeId {
        self.locator.container().expect("page has a container")
    }

    /// Append one message to the container, returning its node.
    pub fn post(&self, body: &str) -> NodeId {
        self.document.append_html(self.container(), &message(body))[0]
    }

    pub fn calls(&self) -> Vec<NodeId> {
        self.typesetter.calls.lock().unwrap().clone()
    }
}
