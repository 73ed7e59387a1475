//! Trellis - lifecycle orchestration for widgets declared in markup.
//!
//! This is the main crate. It re-exports everything from `trellis-core` and
//! adds the widget system, resolvers and the orchestrator.
//!
//! Mark nodes with a `widget` attribute naming a widget path, then let an
//! [`Orchestrator`] discover, initialize and eventually tear them down.
//!
//! # Example
//!
//! ```
//! use trellis::{Document, Orchestrator};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let doc = Document::new();
//! let page = doc.body().append_element("main").unwrap();
//! for path in ["widgets/a", "widgets/b"] {
//!     page.append_element("div").unwrap().set_attribute("widget", path).unwrap();
//! }
//!
//! let mut orchestrator = Orchestrator::new();
//! orchestrator
//!     .initialize(&page, |errors| {
//!         if let Some(errors) = errors {
//!             for err in errors {
//!                 eprintln!("{err}");
//!             }
//!         }
//!     })
//!     .await;
//! assert_eq!(orchestrator.len(), 2);
//! # });
//! ```

pub use trellis_core::*;

mod error;
pub mod feedback;
pub mod orchestrator;
pub mod resolver;
pub mod widget;

pub use error::{InitError, ResolveError, TeardownError, WidgetError, WidgetResult};
pub use feedback::FeedbackSink;
pub use orchestrator::{Orchestrator, OrchestratorBuilder, OrchestratorConfig};
pub use resolver::{
    class_name_with_prefix, widget_class_name, FnResolver, ModuleRegistry, Resolver,
    WidgetConstructor, WidgetModule,
};
pub use widget::widgets::{WidgetA, WidgetB, WidgetC};
pub use widget::{LifecycleState, Widget, WidgetBase};
