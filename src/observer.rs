//! Subtree observer: watches the message container and routes every newly
//! attached message to the dispatcher.
use crate::debounce::Dispatcher;
use crate::error::{HostElement, LatexError};
use crate::host::{Document, Locator, MutationRecord, Registration};
use ego_tree::NodeId;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A live observation. Dropping it disconnects.
#[derive(Debug)]
pub struct ObserverHandle {
    document: Document,
    registration: Registration,
    container: NodeId,
    task: JoinHandle<()>,
}

impl ObserverHandle {
    pub fn container(&self) -> NodeId {
        self.container
    }

    fn disconnect(&self) {
        self.document.disconnect(self.registration);
        self.task.abort();
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.disconnect();
    }
}

pub struct SubtreeObserver {
    document: Document,
    locator: Arc<dyn Locator>,
    dispatcher: Arc<Dispatcher>,
    handle: Option<ObserverHandle>,
}

impl SubtreeObserver {
    pub fn new(
        document: Document,
        locator: Arc<dyn Locator>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            document,
            locator,
            dispatcher,
            handle: None,
        }
    }

    /// Start watching the container. Replaces a running observation.
    ///
    /// Fails without creating a handle when the container is not in the
    /// document; calling again once it is there succeeds.
    pub fn start(&mut self) -> Result<(), LatexError> {
        self.stop();

        let Some(container) = self.locator.container() else {
            let err = LatexError::MissingElement(HostElement::Container);
            tracing::error!(error = %err, "cannot observe messages");
            return Err(err);
        };

        let (registration, mut records) = self.document.observe(container);
        let document = self.document.clone();
        let locator = Arc::clone(&self.locator);
        let dispatcher = Arc::clone(&self.dispatcher);
        let task = tokio::spawn(async move {
            while let Some(record) = records.recv().await {
                for message in added_messages(&document, &*locator, &record) {
                    tracing::debug!(?message, "message added");
                    dispatcher.schedule(message);
                }
            }
        });

        tracing::info!(?container, "observing chat container");
        self.handle = Some(ObserverHandle {
            document: self.document.clone(),
            registration,
            container,
            task,
        });
        Ok(())
    }

    /// Stop watching. Renders already scheduled or running are left alone.
    pub fn stop(&mut self) {
        if self.handle.take().is_some() {
            tracing::info!("stopped observing chat container");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<&ObserverHandle> {
        self.handle.as_ref()
    }
}

/// Messages among the added nodes of a record: each added node that is a
/// message, or the outermost messages inside it.
fn added_messages(
    document: &Document,
    locator: &dyn Locator,
    record: &MutationRecord,
) -> Vec<NodeId> {
    record
        .added_nodes
        .iter()
        .flat_map(|&node| outermost_messages(document, locator, node))
        .collect()
}

fn outermost_messages(
    document: &Document,
    locator: &dyn Locator,
    node: NodeId,
) -> Vec<NodeId> {
    // Pre-order, so an enclosing message is always seen before its content.
    let mut found: Vec<NodeId> = Vec::new();
    for candidate in document.subtree_elements(node) {
        let nested = found
            .iter()
            .any(|&outer| document.is_ancestor(outer, candidate));
        if !nested && locator.is_message(candidate) {
            found.push(candidate);
        }
    }
    found
}
