use super::document::Document;
use super::selector::AttributeSelector;
use crate::config::SelectorConfig;
use crate::error::LatexError;
use ego_tree::NodeId;

/// The three lookups the pipeline makes against the host page.
pub trait Locator: Send + Sync {
    /// The element new messages are appended under
    fn container(&self) -> Option<NodeId>;

    /// Where the on/off toggle is mounted
    fn toggle_mount(&self) -> Option<NodeId>;

    /// Whether `node` is a message element
    fn is_message(&self, node: NodeId) -> bool;
}

/// Resolves the lookups with attribute selectors against a [`Document`].
///
/// Lookups are done on every call, so elements that appear later are found.
#[derive(Debug, Clone)]
pub struct SelectorLocator {
    document: Document,
    container: AttributeSelector,
    message: AttributeSelector,
    toggle_mount: AttributeSelector,
}

impl SelectorLocator {
    pub fn new(
        document: Document,
        selectors: &SelectorConfig,
    ) -> Result<Self, LatexError> {
        Ok(Self {
            document,
            container: AttributeSelector::parse(&selectors.container)?,
            message: AttributeSelector::parse(&selectors.message)?,
            toggle_mount: AttributeSelector::parse(&selectors.toggle_mount)?,
        })
    }
}

impl Locator for SelectorLocator {
    fn container(&self) -> Option<NodeId> {
        self.document.find_first(|e| self.container.matches(e))
    }

    fn toggle_mount(&self) -> Option<NodeId> {
        self.document.find_first(|e| self.toggle_mount.matches(e))
    }

    fn is_message(&self, node: NodeId) -> bool {
        self.document
            .element(node)
            .is_some_and(|e| self.message.matches(&e))
    }
}
