//! Render invoker: wrap a node's math, write it back, hand the node to the
//! typesetter without waiting for it.
use crate::error::{ErrorReporter, LatexError};
use crate::host::Document;
use crate::typeset::Typesetter;
use crate::wrap::wrap;
use ego_tree::NodeId;
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::watch;

pub struct Renderer {
    document: Document,
    typesetter: Arc<dyn Typesetter>,
    reporter: ErrorReporter,
    /// Number of typeset tasks still running
    in_flight: Arc<watch::Sender<usize>>,
}

impl Renderer {
    pub fn new(
        document: Document,
        typesetter: Arc<dyn Typesetter>,
        reporter: ErrorReporter,
    ) -> Self {
        Self {
            document,
            typesetter,
            reporter,
            in_flight: Arc::new(watch::channel(0).0),
        }
    }

    /// Wrap and typeset one node.
    ///
    /// Returns as soon as the wrapped markup is written; typesetting runs on
    /// its own task and a failure there only gets reported.
    pub fn render(&self, node: NodeId) {
        // Retried when the host changes the node between read and write
        loop {
            let Some(html) = self.document.inner_html(node) else {
                self.reporter.report(LatexError::Detached(node));
                return;
            };
            match wrap(&html) {
                Cow::Owned(wrapped) => {
                    if self.document.replace_inner_html(node, &html, &wrapped) {
                        break;
                    }
                }
                Cow::Borrowed(_) => break,
            }
        }
        tracing::debug!(?node, "typesetting message");

        let typesetting = self.typesetter.typeset(node);
        let reporter = self.reporter.clone();
        let in_flight = Arc::clone(&self.in_flight);
        in_flight.send_modify(|n| *n += 1);
        tokio::spawn(async move {
            if let Err(err) = typesetting.await {
                reporter.report(err);
            }
            in_flight.send_modify(|n| *n -= 1);
        });
    }

    /// Resolves once no typeset task is running.
    pub async fn idle(&self) {
        let mut rx = self.in_flight.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}
