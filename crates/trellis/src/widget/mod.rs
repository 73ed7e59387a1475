//! Widget system for Trellis.
//!
//! This module provides the widget lifecycle:
//!
//! - [`Widget`] trait: The contract every widget implements
//! - [`WidgetBase`]: Common lifecycle state, node binding and handlers
//! - [`LifecycleState`]: Where a widget is in its lifecycle
//! - Built-in widgets in [`widgets`]
//!
//! # Creating a Widget
//!
//! 1. Define a struct with a `WidgetBase` field
//! 2. Implement the `Widget` trait, overriding phases as needed
//! 3. Export it from a [`WidgetModule`](crate::WidgetModule) under
//!    `Widget` + the upper-cased last path segment
//!
//! ```
//! use async_trait::async_trait;
//! use trellis::widget::{Widget, WidgetBase};
//! use trellis::{Element, Signal, WidgetError, WidgetModule};
//!
//! struct Counter {
//!     base: WidgetBase,
//! }
//!
//! impl Counter {
//!     fn new(clicked: &Signal<()>) -> Self {
//!         let mut base = WidgetBase::new();
//!         base.connect(clicked, |_| println!("clicked"));
//!         Self { base }
//!     }
//! }
//!
//! #[async_trait]
//! impl Widget for Counter {
//!     fn widget_base(&self) -> &WidgetBase {
//!         &self.base
//!     }
//!
//!     fn widget_base_mut(&mut self) -> &mut WidgetBase {
//!         &mut self.base
//!     }
//!
//!     async fn post_init(&mut self, target: &Element) -> Result<(), WidgetError> {
//!         self.base.post_init()?;
//!         target.set_text("0")?;
//!         Ok(())
//!     }
//! }
//!
//! let clicked = Signal::new();
//! let module = WidgetModule::new()
//!     .with_export("WidgetCOUNTER", move || Box::new(Counter::new(&clicked)));
//! assert!(module.export("WidgetCOUNTER").is_some());
//! ```

mod base;
mod traits;
pub mod widgets;

pub use base::{LifecycleState, WidgetBase};
pub use traits::Widget;
