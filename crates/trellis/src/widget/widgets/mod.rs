//! Built-in widgets.
//!
//! These are small reference widgets registered by
//! [`ModuleRegistry::builtin`](crate::ModuleRegistry::builtin) under
//! `widgets/a`, `widgets/b` and `widgets/c`. Each one catches errors from the
//! base lifecycle and records them through [`Widget::fail`] rather than
//! returning them.

mod a;
mod b;
mod c;

pub use a::WidgetA;
pub use b::WidgetB;
pub use c::WidgetC;

use super::Widget;
use crate::error::WidgetResult;

/// Route a phase error into [`Widget::fail`]. Returns whether the phase succeeded.
fn absorb<W: Widget + ?Sized>(widget: &mut W, name: &str, phase: &str, result: WidgetResult<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(target: "trellis::widget", "Error during {name} {phase}: {err}");
            widget.fail(&err);
            false
        }
    }
}
