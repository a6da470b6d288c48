//! Debounced dispatch.
//!
//! One timer is shared by every request: a new request cancels the armed
//! timer, and only the latest value reaches the action once the quiet
//! period passes without further requests. Earlier values in the same
//! window are dropped.
use crate::render::Renderer;
use ego_tree::NodeId;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

type Action<T> = Arc<dyn Fn(T) + Send + Sync>;

pub struct Debouncer<T> {
    quiet: Duration,
    action: Action<T>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

/// The render dispatcher: debounced calls to [`Renderer::render`].
pub type Dispatcher = Debouncer<NodeId>;

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(
        quiet: Duration,
        action: impl Fn(T) + Send + Sync + 'static,
    ) -> Self {
        Self {
            quiet,
            action: Arc::new(action),
            pending: Mutex::new(None),
        }
    }

    /// Re-arm the timer with `value` as the one to deliver.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, value: T) {
        let mut pending =
            self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        let action = Arc::clone(&self.action);
        let quiet = self.quiet;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            action(value);
        }));
    }

    /// Whether a timer is armed and has not fired yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }
}

impl Dispatcher {
    pub fn for_renderer(renderer: Arc<Renderer>, quiet: Duration) -> Self {
        Debouncer::new(quiet, move |node: NodeId| {
            tracing::debug!(?node, "quiet period elapsed, rendering");
            renderer.render(node)
        })
    }
}
