//! Error type shared by the pipeline, and the channel detached failures are
//! reported on.

use ego_tree::NodeId;
use std::fmt;
use tokio::sync::mpsc;

/// Host elements the pipeline needs to locate before it can do anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostElement {
    Container,
    ToggleMount,
}

impl fmt::Display for HostElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostElement::Container => write!(f, "chat container"),
            HostElement::ToggleMount => write!(f, "toggle mount point"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LatexError {
    #[error("{0} not found")]
    MissingElement(HostElement),

    #[error("typesetting failed for node {node:?}: {message}")]
    Typeset { node: NodeId, message: String },

    #[error("node {0:?} has no content to render")]
    Detached(NodeId),

    #[error("invalid selector `{0}`, expected `[attribute=\"value\"]`")]
    InvalidSelector(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Where failures of fire-and-forget work end up.
///
/// Every report is logged; if the reporter was built with [`ErrorReporter::channel`]
/// the error is also forwarded to the receiver.
#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    tx: Option<mpsc::UnboundedSender<LatexError>>,
}

impl ErrorReporter {
    /// A reporter that only logs.
    pub fn log_only() -> Self {
        Self::default()
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LatexError>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn report(&self, err: LatexError) {
        tracing::error!(error = %err, "latex pipeline failure");
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody is listening any more; logging is enough.
            let _ = tx.send(err);
        }
    }
}
