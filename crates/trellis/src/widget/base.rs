//! Base widget state and lifecycle bookkeeping.

use trellis_core::{ConnectionGuard, Element, Signal, StateClass};

use crate::error::{WidgetError, WidgetResult};

/// Where a widget is in its lifecycle.
///
/// Derived from the base's flags: a destroyed widget reports `Destroyed` even
/// if it had failed, and a failed widget reports `Failed` regardless of which
/// phase it was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Constructed, `pre_init` has not run.
    Uninitialized,
    /// `pre_init` ran; waiting for `post_init`.
    PreInitializing,
    /// `post_init` started but has not completed.
    PostInitializing,
    /// `post_init` completed.
    Initialized,
    /// The widget recorded a failure.
    Failed,
    /// The widget was destroyed.
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Constructed,
    PreInitializing,
    PostInitializing,
    Initialized,
}

type PendingHandler = Box<dyn FnOnce() -> ConnectionGuard + Send + Sync>;

/// The base implementation for all widgets.
///
/// `WidgetBase` holds the lifecycle flags, the bound node, and the widget's
/// event handler connections. Custom widgets embed it and expose it through
/// [`Widget::widget_base`](super::Widget::widget_base).
///
/// # Example
///
/// ```
/// use trellis::widget::{Widget, WidgetBase};
///
/// #[derive(Default)]
/// struct Banner {
///     base: WidgetBase,
/// }
///
/// impl Widget for Banner {
///     fn widget_base(&self) -> &WidgetBase {
///         &self.base
///     }
///
///     fn widget_base_mut(&mut self) -> &mut WidgetBase {
///         &mut self.base
///     }
/// }
/// ```
pub struct WidgetBase {
    phase: Phase,
    is_being_initialized: bool,
    has_failed: bool,
    is_destroyed: bool,

    /// The node this widget is bound to, set by `pre_init`.
    target: Option<Element>,

    /// Message of the most recent failure.
    last_error: Option<String>,

    /// Live handler connections, dropped on destroy.
    handlers: Vec<ConnectionGuard>,

    /// Handlers registered before `pre_init`, connected when it runs.
    pending_handlers: Vec<PendingHandler>,

    /// Signal emitted whenever the derived lifecycle state changes.
    pub lifecycle_changed: Signal<LifecycleState>,
}

impl Default for WidgetBase {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetBase {
    /// Create a fresh, unbound widget base.
    pub fn new() -> Self {
        Self {
            phase: Phase::Constructed,
            is_being_initialized: false,
            has_failed: false,
            is_destroyed: false,
            target: None,
            last_error: None,
            handlers: Vec::new(),
            pending_handlers: Vec::new(),
            lifecycle_changed: Signal::new(),
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn lifecycle_state(&self) -> LifecycleState {
        if self.is_destroyed {
            LifecycleState::Destroyed
        } else if self.has_failed {
            LifecycleState::Failed
        } else {
            match self.phase {
                Phase::Constructed => LifecycleState::Uninitialized,
                Phase::PreInitializing => LifecycleState::PreInitializing,
                Phase::PostInitializing => LifecycleState::PostInitializing,
                Phase::Initialized => LifecycleState::Initialized,
            }
        }
    }

    /// True between the start of `pre_init` and the end of `post_init`.
    pub fn is_being_initialized(&self) -> bool {
        self.is_being_initialized
    }

    pub fn has_failed(&self) -> bool {
        self.has_failed
    }

    pub fn is_destroyed(&self) -> bool {
        self.is_destroyed
    }

    /// The node bound by `pre_init`, if any.
    pub fn target(&self) -> Option<&Element> {
        self.target.as_ref()
    }

    /// Message of the most recent failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of connected handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    fn is_inert(&self) -> bool {
        self.has_failed || self.is_destroyed
    }

    fn transition(&mut self, phase: Phase) {
        let before = self.lifecycle_state();
        self.phase = phase;
        self.notify_if_changed(before);
    }

    fn notify_if_changed(&self, before: LifecycleState) {
        let after = self.lifecycle_state();
        if after != before {
            tracing::trace!(target: "trellis::widget", ?before, ?after, "lifecycle transition");
            self.lifecycle_changed.emit(after);
        }
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    /// Connect a handler to `signal` for the lifetime of this widget.
    ///
    /// Handlers registered before `pre_init` are connected when it runs;
    /// afterwards they connect immediately. All of them are disconnected
    /// when the widget is destroyed. Ignored once destroyed.
    pub fn connect<Args, F>(&mut self, signal: &Signal<Args>, slot: F)
    where
        Args: Send + 'static,
        F: Fn(&Args) + Send + Sync + 'static,
    {
        if self.is_destroyed {
            return;
        }
        if self.target.is_some() {
            self.handlers.push(signal.connect_scoped(slot));
        } else {
            let signal = signal.clone();
            self.pending_handlers
                .push(Box::new(move || signal.connect_scoped(slot)));
        }
    }

    fn bind_pending_handlers(&mut self) {
        let pending = std::mem::take(&mut self.pending_handlers);
        if !pending.is_empty() {
            tracing::trace!(target: "trellis::widget", count = pending.len(), "binding event handlers");
        }
        self.handlers.extend(pending.into_iter().map(|bind| bind()));
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Bind `target`, connect handlers, and mark the node pre-initialized.
    ///
    /// Does nothing if the widget has failed or been destroyed.
    pub fn pre_init(&mut self, target: &Element) -> WidgetResult<()> {
        if self.is_inert() {
            return Ok(());
        }

        self.is_being_initialized = true;
        self.target = Some(target.clone());
        self.bind_pending_handlers();

        self.transition(Phase::PreInitializing);
        target.add_state(StateClass::PreInitialized)?;
        target.remove_state(StateClass::Finished)?;
        Ok(())
    }

    /// Mark the bound node initialized.
    ///
    /// Does nothing if the widget has failed or been destroyed. Fails with
    /// [`WidgetError::Unbound`] if `pre_init` never ran.
    pub fn post_init(&mut self) -> WidgetResult<()> {
        if self.is_inert() {
            return Ok(());
        }

        let target = self.target.clone().ok_or(WidgetError::Unbound)?;
        self.transition(Phase::PostInitializing);
        target.add_state(StateClass::Initialized)?;
        target.remove_state(StateClass::PreInitialized)?;

        self.is_being_initialized = false;
        self.transition(Phase::Initialized);
        Ok(())
    }

    /// Record a failure and mark the bound node failed.
    ///
    /// Ignored once destroyed.
    pub fn fail(&mut self, error: &WidgetError) {
        if self.is_destroyed {
            tracing::trace!(target: "trellis::widget", %error, "ignoring failure after destroy");
            return;
        }

        let before = self.lifecycle_state();
        self.has_failed = true;
        self.last_error = Some(error.to_string());

        if let Some(target) = &self.target {
            if let Err(err) = target.add_state(StateClass::Failed) {
                tracing::warn!(target: "trellis::widget", %err, "could not mark node failed");
            }
        }
        tracing::error!(target: "trellis::widget", "Widget failed to initialize: {error}");
        self.notify_if_changed(before);
    }

    /// Destroy the widget: disconnect handlers and clear all state classes.
    ///
    /// Returns `false` if the widget was already destroyed.
    pub fn destroy(&mut self) -> bool {
        if self.is_destroyed {
            tracing::info!(target: "trellis::widget", "Widget already destroyed.");
            return false;
        }

        let before = self.lifecycle_state();
        self.is_destroyed = true;
        self.is_being_initialized = false;
        self.handlers.clear();
        self.pending_handlers.clear();
        self.reset_state();

        tracing::info!(target: "trellis::widget", "Widget destroyed and state reset.");
        self.notify_if_changed(before);
        true
    }

    fn reset_state(&self) {
        let Some(target) = &self.target else {
            return;
        };
        for state in StateClass::ALL {
            if let Err(err) = target.remove_state(state) {
                // The node may already be gone; nothing left to clear.
                tracing::debug!(target: "trellis::widget", %err, %state, "could not clear state class");
                return;
            }
        }
    }

    /// Mark the bound node finished.
    ///
    /// Does nothing once destroyed.
    pub fn finish(&mut self) -> WidgetResult<()> {
        if self.is_destroyed {
            return Ok(());
        }
        let target = self.target.as_ref().ok_or(WidgetError::Unbound)?;
        target.add_state(StateClass::Finished)?;
        tracing::info!(target: "trellis::widget", "Widget marked as finished.");
        Ok(())
    }
}

impl std::fmt::Debug for WidgetBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetBase")
            .field("state", &self.lifecycle_state())
            .field("is_being_initialized", &self.is_being_initialized)
            .field("target", &self.target)
            .field("last_error", &self.last_error)
            .field("handlers", &self.handlers.len())
            .field("pending_handlers", &self.pending_handlers.len())
            .finish()
    }
}
