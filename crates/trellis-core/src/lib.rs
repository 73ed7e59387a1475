//! Core systems for Trellis.
//!
//! This crate provides the foundations the widget orchestrator builds on:
//!
//! - **Markup Tree**: Arena-backed documents, elements, attributes and class lists
//! - **State Classes**: The lifecycle annotations applied to widget nodes
//! - **Signal/Slot System**: Synchronous notifications for widget handlers and feedback
//! - **Environment**: The lazily provisioned, process-wide document
//! - **Logging**: `tracing` targets and tree visualization
//!
//! # Example
//!
//! ```
//! use trellis_core::{Document, StateClass};
//!
//! let doc = Document::new();
//! let root = doc.body().append_element("div").unwrap();
//! let node = root.append_element("div").unwrap();
//! node.set_attribute("widget", "widgets/a").unwrap();
//!
//! let found = root.query_attribute_all("widget").unwrap();
//! assert_eq!(found, vec![node.clone()]);
//!
//! node.add_state(StateClass::PreInitialized).unwrap();
//! assert!(node.has_state(StateClass::PreInitialized));
//! ```

pub mod environment;
mod error;
pub mod logging;
pub mod signal;
pub mod tree;

pub use environment::{Environment, EnvironmentKind};
pub use error::{EnvironmentError, TreeError, TreeResult};
pub use logging::{MarkupTreeDebug, TreeFormatOptions, TreeStyle};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use tree::{Document, Element, MarkupTree, NodeId, StateClass};
