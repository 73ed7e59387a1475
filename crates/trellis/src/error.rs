//! Error types for widget lifecycles, resolution, and orchestration.
//!
//! Per-node failures during initialization are collected as [`InitError`]
//! values and handed to the completion callback; they never abort a batch.
//! Teardown is deliberately asymmetric: a widget that reports
//! [`WidgetError::DestroyedDuringInit`] is logged and skipped past, while any
//! other destroy error is returned as [`TeardownError::Destroy`] and stops
//! the remaining teardown for that call.

use trellis_core::{Element, TreeError};

/// Result type alias for widget lifecycle operations.
pub type WidgetResult<T> = std::result::Result<T, WidgetError>;

/// Errors raised by a widget's own lifecycle methods.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidgetError {
    /// Annotating or reading the bound node failed.
    #[error("Markup error: {0}")]
    Tree(#[from] TreeError),

    /// A lifecycle step that needs the bound node ran before `pre_init`.
    #[error("Widget is not bound to a node")]
    Unbound,

    /// The widget was torn down while it was still initializing.
    #[error("Widget {identifier} (Path: {path}) was destroyed during initialization.")]
    DestroyedDuringInit { identifier: String, path: String },

    /// Widget-specific failure.
    #[error("{0}")]
    Failed(String),
}

impl WidgetError {
    /// Create a widget-specific failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Create a destroyed-during-initialization error for `node`.
    pub fn destroyed_during_init(node: &Element, path: impl Into<String>) -> Self {
        Self::DestroyedDuringInit {
            identifier: node.identifier(),
            path: path.into(),
        }
    }

    /// Whether teardown should tolerate this error.
    pub fn is_destroyed_during_init(&self) -> bool {
        matches!(self, Self::DestroyedDuringInit { .. })
    }
}

/// Errors raised while resolving a widget path to a constructor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No module is registered under the path.
    #[error("No widget module registered for {path}")]
    ModuleNotFound { path: String },

    /// The module exists but lacks the expected export.
    #[error("Widget class {class_name} not found in {path}")]
    ClassNotFound { class_name: String, path: String },

    /// The resolver itself failed.
    #[error("{message}")]
    Load { path: String, message: String },
}

impl ResolveError {
    /// Create a loader failure.
    pub fn load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A per-node failure recorded during [`Orchestrator::initialize`].
///
/// [`Orchestrator::initialize`]: crate::Orchestrator::initialize
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    /// Resolution failed or the module lacked the widget export.
    #[error("Error in {path}: {source}")]
    Resolve {
        path: String,
        #[source]
        source: ResolveError,
    },

    /// `pre_init` returned an error.
    #[error("Error in {path}: {source}")]
    PreInit {
        path: String,
        #[source]
        source: WidgetError,
    },

    /// `pre_init` completed but the widget flagged itself as failed.
    #[error("Widget {path} failed during pre-initialization.")]
    PreInitFailed { path: String },

    /// `post_init` returned an error.
    #[error("Error in {path} during post-init: {source}")]
    PostInit {
        path: String,
        #[source]
        source: WidgetError,
    },

    /// `post_init` completed but the widget flagged itself as failed.
    #[error("Widget {path} failed during post-initialization.")]
    PostInitFailed { path: String },

    /// Discovering widget nodes under the root failed.
    #[error("Failed to query widget nodes: {0}")]
    Query(#[source] TreeError),
}

impl InitError {
    /// The widget path this error belongs to, if it is tied to a node.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Resolve { path, .. }
            | Self::PreInit { path, .. }
            | Self::PreInitFailed { path }
            | Self::PostInit { path, .. }
            | Self::PostInitFailed { path } => Some(path),
            Self::Query(_) => None,
        }
    }

    /// Whether the failure happened in the post-init pass.
    pub fn is_post_init(&self) -> bool {
        matches!(self, Self::PostInit { .. } | Self::PostInitFailed { .. })
    }
}

/// Errors that abort [`Orchestrator::teardown`].
///
/// When this is returned, widgets later in document order may already have
/// been destroyed while earlier ones were not reached.
///
/// [`Orchestrator::teardown`]: crate::Orchestrator::teardown
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TeardownError {
    /// Discovering widget nodes under the root failed.
    #[error("Failed to query widget nodes: {0}")]
    Query(#[from] TreeError),

    /// A widget's `destroy` failed with an unrecognized error.
    #[error("Failed to destroy {path}: {source}")]
    Destroy {
        path: String,
        #[source]
        source: WidgetError,
    },
}
