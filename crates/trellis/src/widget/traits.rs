//! The core widget trait.

use async_trait::async_trait;
use trellis_core::Element;

use super::base::{LifecycleState, WidgetBase};
use crate::error::{WidgetError, WidgetResult};

/// The lifecycle contract every widget implements.
///
/// Only [`widget_base`](Widget::widget_base) and
/// [`widget_base_mut`](Widget::widget_base_mut) are required; every lifecycle
/// method defaults to the [`WidgetBase`] behavior.
///
/// # Lifecycle
///
/// 1. The orchestrator constructs the widget and awaits
///    [`pre_init`](Widget::pre_init) with the host node.
/// 2. Once every widget in the batch has been pre-initialized, it awaits
///    [`post_init`](Widget::post_init).
/// 3. [`destroy`](Widget::destroy) runs at teardown.
///
/// Widgets may either return an error from a phase, in which case the
/// orchestrator records it, or catch it themselves and call
/// [`fail`](Widget::fail). Both paths leave the node marked `failed`.
///
/// # Overriding phases
///
/// Overrides normally call the base first and then do their own work:
///
/// ```
/// use async_trait::async_trait;
/// use trellis::widget::{Widget, WidgetBase};
/// use trellis::{Element, WidgetError};
///
/// #[derive(Default)]
/// struct Clock {
///     base: WidgetBase,
/// }
///
/// #[async_trait]
/// impl Widget for Clock {
///     fn widget_base(&self) -> &WidgetBase {
///         &self.base
///     }
///
///     fn widget_base_mut(&mut self) -> &mut WidgetBase {
///         &mut self.base
///     }
///
///     async fn post_init(&mut self, target: &Element) -> Result<(), WidgetError> {
///         self.base.post_init()?;
///         target.set_text("12:00")?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Widget: Send + Sync {
    /// Get a reference to the widget's base.
    fn widget_base(&self) -> &WidgetBase;

    /// Get a mutable reference to the widget's base.
    fn widget_base_mut(&mut self) -> &mut WidgetBase;

    /// First phase: bind to `target` and mark it pre-initialized.
    async fn pre_init(&mut self, target: &Element) -> WidgetResult<()> {
        self.widget_base_mut().pre_init(target)
    }

    /// Second phase: mark the bound node initialized.
    async fn post_init(&mut self, _target: &Element) -> WidgetResult<()> {
        self.widget_base_mut().post_init()
    }

    /// Record a failure and mark the node failed.
    fn fail(&mut self, error: &WidgetError) {
        self.widget_base_mut().fail(error);
    }

    /// Tear the widget down.
    ///
    /// Return [`WidgetError::DestroyedDuringInit`] to have teardown log the
    /// problem and carry on; any other error stops teardown.
    fn destroy(&mut self) -> WidgetResult<()> {
        self.widget_base_mut().destroy();
        Ok(())
    }

    /// Mark the node finished.
    fn finish(&mut self) -> WidgetResult<()> {
        self.widget_base_mut().finish()
    }

    fn lifecycle_state(&self) -> LifecycleState {
        self.widget_base().lifecycle_state()
    }

    fn has_failed(&self) -> bool {
        self.widget_base().has_failed()
    }

    fn is_destroyed(&self) -> bool {
        self.widget_base().is_destroyed()
    }

    fn is_being_initialized(&self) -> bool {
        self.widget_base().is_being_initialized()
    }

    /// The node bound by `pre_init`.
    fn target(&self) -> Option<&Element> {
        self.widget_base().target()
    }
}
