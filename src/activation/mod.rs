//! Activation controller: ties the persisted on/off flag to the observer and
//! keeps the toggle control in step with it.
pub mod store;
pub mod toggle;

use crate::config::Config;
use crate::debounce::Dispatcher;
use crate::error::{ErrorReporter, HostElement, LatexError};
use crate::host::{Document, Locator, SelectorLocator};
use crate::observer::SubtreeObserver;
use crate::render::Renderer;
use crate::typeset::Typesetter;
use ego_tree::NodeId;
use std::sync::Arc;
use std::time::Duration;

pub use store::{ActivationFlag, JsonFileStore, MemoryStore, PreferenceStore};

pub struct Controller {
    document: Document,
    locator: Arc<dyn Locator>,
    flag: ActivationFlag,
    renderer: Arc<Renderer>,
    dispatcher: Arc<Dispatcher>,
    observer: SubtreeObserver,
    toggle: Option<NodeId>,
}

impl Controller {
    pub fn new(
        document: Document,
        locator: Arc<dyn Locator>,
        typesetter: Arc<dyn Typesetter>,
        flag: ActivationFlag,
        quiet: Duration,
        reporter: ErrorReporter,
    ) -> Self {
        let renderer =
            Arc::new(Renderer::new(document.clone(), typesetter, reporter));
        let dispatcher =
            Arc::new(Dispatcher::for_renderer(Arc::clone(&renderer), quiet));
        let observer = SubtreeObserver::new(
            document.clone(),
            Arc::clone(&locator),
            Arc::clone(&dispatcher),
        );
        Self {
            document,
            locator,
            flag,
            renderer,
            dispatcher,
            observer,
            toggle: None,
        }
    }

    /// Wire the pipeline the way `config` describes, locating host elements
    /// with its selectors.
    pub fn from_config(
        document: Document,
        config: &Config,
        mut typesetter: impl Typesetter + 'static,
        store: Arc<dyn PreferenceStore>,
        reporter: ErrorReporter,
    ) -> Result<Self, LatexError> {
        let locator = SelectorLocator::new(document.clone(), &config.selectors)?;
        typesetter.configure(config.typeset.clone());
        Ok(Self::new(
            document,
            Arc::new(locator),
            Arc::new(typesetter),
            ActivationFlag::new(store, config.preference_key.clone()),
            config.quiet_period(),
            reporter,
        ))
    }

    /// Mount the toggle and, if the flag was left on, start observing right
    /// away.
    pub fn init(&mut self) {
        if self.toggle.is_none() {
            self.mount_toggle();
        }
        if self.currently_active() {
            self.start_observer();
        }
    }

    /// Flip the flag and start or stop observing to match. Returns the new
    /// state; failures are logged, see [`Controller::try_toggle`].
    pub fn toggle(&mut self) -> bool {
        if let Err(err) = self.try_toggle() {
            tracing::error!(error = %err, "toggle incomplete");
        }
        self.currently_active()
    }

    /// [`Controller::toggle`] that reports why it could not take effect.
    ///
    /// When persisting fails nothing changes. When the flag is turned on but
    /// the container is missing, the flag and the control still flip and the
    /// missing container is returned; [`Controller::resume`] retries.
    pub fn try_toggle(&mut self) -> Result<bool, LatexError> {
        let active = !self.currently_active();
        self.flag.set(active)?;
        tracing::info!(active, "LaTeX rendering toggled");

        let started = if active {
            self.observer.start()
        } else {
            self.observer.stop();
            Ok(())
        };
        self.sync_toggle();
        started.map(|()| active)
    }

    pub fn currently_active(&self) -> bool {
        self.flag.is_active()
    }

    /// Retry starting the observer when the flag is on but nothing is
    /// observing, e.g. because the container was missing earlier.
    pub fn resume(&mut self) -> Result<(), LatexError> {
        if self.currently_active() && !self.observer.is_running() {
            self.observer.start()?;
        }
        Ok(())
    }

    /// Bring the observer and the toggle in line with the stored flag, which
    /// another toggle may have changed.
    pub fn refresh(&mut self) {
        let active = self.currently_active();
        if active && !self.observer.is_running() {
            self.start_observer();
        } else if !active && self.observer.is_running() {
            self.observer.stop();
        }
        self.sync_toggle();
    }

    pub fn is_observing(&self) -> bool {
        self.observer.is_running()
    }

    pub fn toggle_node(&self) -> Option<NodeId> {
        self.toggle
    }

    /// Wait until no render is scheduled and no typesetting is running.
    pub async fn settle(&self) {
        tokio::task::yield_now().await;
        while self.dispatcher.is_pending() {
            tokio::time::sleep(self.dispatcher.quiet_period()).await;
        }
        self.renderer.idle().await;
    }

    fn start_observer(&mut self) {
        if self.observer.start().is_err() {
            tracing::warn!("LaTeX rendering is on but idle until resumed");
        }
    }

    fn mount_toggle(&mut self) {
        let Some(mount) = self.locator.toggle_mount() else {
            let err = LatexError::MissingElement(HostElement::ToggleMount);
            tracing::error!(error = %err, "toggle not mounted");
            return;
        };
        let markup = toggle::render_toggle(self.currently_active());
        self.toggle = self.document.append_html(mount, &markup).first().copied();
    }

    fn sync_toggle(&self) {
        let Some(button) = self.toggle else {
            return;
        };
        let active = self.currently_active();
        self.document
            .set_attribute(button, "class", toggle::class(active));
        self.document.set_inner_html(button, toggle::label(active));
    }
}
