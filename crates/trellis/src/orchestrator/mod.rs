//! Widget discovery, initialization and teardown.
//!
//! The [`Orchestrator`] owns the registry of live widgets. Given a root node
//! it finds every descendant carrying the widget attribute and drives each one
//! through two passes:
//!
//! 1. **Pre-init**, in document order: resolve the path, construct the widget
//!    and await [`Widget::pre_init`]. Successful widgets are registered.
//! 2. **Post-init**, in document order, for the widgets registered by this
//!    call: await [`Widget::post_init`].
//!
//! A failure affects only its own node. Every failure is collected and handed
//! to the completion callback once the batch has finished.
//!
//! Teardown walks the same nodes in reverse document order so that nested
//! widgets are destroyed before the widgets that contain them.
//!
//! # Example
//!
//! ```
//! use trellis::{Document, ModuleRegistry, Orchestrator, StateClass};
//!
//! # tokio_test_block(async {
//! let doc = Document::new();
//! let root = doc.body().append_element("main").unwrap();
//! let node = root.append_element("div").unwrap();
//! node.set_attribute("widget", "widgets/a").unwrap();
//!
//! let mut orchestrator = Orchestrator::builder()
//!     .resolver(ModuleRegistry::builtin())
//!     .build();
//!
//! orchestrator.initialize(&root, |errors| assert!(errors.is_none())).await;
//! assert!(node.has_state(StateClass::Initialized));
//!
//! orchestrator.teardown(&root).unwrap();
//! assert!(orchestrator.is_empty());
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod config;

pub use config::{OrchestratorConfig, DEFAULT_EXPORT_PREFIX, DEFAULT_WIDGET_ATTRIBUTE};

use std::collections::HashMap;
use std::sync::Arc;

use trellis_core::{environment, Element, StateClass, TreeError};

use crate::error::{InitError, ResolveError, TeardownError, WidgetError};
use crate::feedback::FeedbackSink;
use crate::resolver::{ModuleRegistry, Resolver};
use crate::widget::Widget;

/// Drives widgets through their lifecycle and owns the live registry.
pub struct Orchestrator {
    config: OrchestratorConfig,
    resolver: Arc<dyn Resolver>,
    feedback: Option<Box<dyn FeedbackSink>>,
    widgets: HashMap<Element, Box<dyn Widget>>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    /// Create an orchestrator with the default configuration and the built-in
    /// module registry.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Replace the resolver used for subsequent initializations.
    pub fn set_resolver(&mut self, resolver: impl Resolver + 'static) {
        self.resolver = Arc::new(resolver);
    }

    /// Replace (or remove) the feedback sink.
    pub fn set_feedback(&mut self, sink: Option<Box<dyn FeedbackSink>>) {
        self.feedback = sink;
    }

    // =========================================================================
    // Registry inspection
    // =========================================================================

    /// Number of registered widgets.
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Whether `node` has a registered widget.
    pub fn contains(&self, node: &Element) -> bool {
        self.widgets.contains_key(node)
    }

    /// The widget registered for `node`.
    pub fn widget(&self, node: &Element) -> Option<&dyn Widget> {
        self.widgets.get(node).map(|widget| &**widget)
    }

    /// Nodes with a registered widget, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &Element> {
        self.widgets.keys()
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize every widget under `root` and report the outcome.
    ///
    /// `on_complete` is called exactly once: with `None` if every widget
    /// initialized, otherwise with the errors in the order they occurred.
    /// Each error is also logged and written to the feedback sink.
    #[tracing::instrument(skip_all, target = "trellis::orchestrator", fields(root = ?root))]
    pub async fn initialize<F>(&mut self, root: &Element, on_complete: F)
    where
        F: FnOnce(Option<Vec<InitError>>),
    {
        match self.try_initialize(root).await {
            Ok(()) => on_complete(None),
            Err(errors) => {
                for err in &errors {
                    tracing::error!(target: "trellis::orchestrator", "{err}");
                    self.report(&err.to_string());
                }
                on_complete(Some(errors));
            }
        }
    }

    /// Initialize every widget under `root`, returning the collected errors.
    ///
    /// Unlike [`initialize`](Self::initialize) this neither logs the summary
    /// nor writes to the feedback sink.
    pub async fn try_initialize(&mut self, root: &Element) -> Result<(), Vec<InitError>> {
        let errors = match self.run_passes(root).await {
            Ok(errors) => errors,
            Err(err) => vec![InitError::Query(err)],
        };
        if errors.is_empty() {
            tracing::debug!(target: "trellis::orchestrator", registered = self.widgets.len(), "initialization complete");
            Ok(())
        } else {
            tracing::debug!(target: "trellis::orchestrator", failed = errors.len(), "initialization completed with errors");
            Err(errors)
        }
    }

    async fn run_passes(&mut self, root: &Element) -> Result<Vec<InitError>, TreeError> {
        let nodes = root.query_attribute_all(&self.config.widget_attribute)?;
        tracing::trace!(target: "trellis::orchestrator", count = nodes.len(), "discovered widget nodes");

        let mut errors = Vec::new();
        let mut fresh = Vec::new();

        for node in nodes {
            if self.widgets.contains_key(&node) {
                tracing::trace!(target: "trellis::orchestrator", ?node, "already registered, skipping");
                continue;
            }
            let path = self.widget_path(&node);
            let outcome = self.pre_init_node(&node, &path).await;
            match outcome {
                Ok(widget) => {
                    self.widgets.insert(node.clone(), widget);
                    fresh.push((node, path));
                }
                Err(err) => {
                    if !matches!(err, InitError::PreInitFailed { .. }) {
                        mark_failed(&node);
                    }
                    tracing::warn!(target: "trellis::orchestrator", %path, %err, "pre-init failed");
                    errors.push(err);
                }
            }
        }

        for (node, path) in fresh {
            let Some(widget) = self.widgets.get_mut(&node) else {
                continue;
            };
            if widget.has_failed() {
                continue;
            }
            if let Err(err) = post_init_widget(&mut **widget, &node, &path).await {
                tracing::warn!(target: "trellis::orchestrator", %path, %err, "post-init failed");
                errors.push(err);
            }
        }

        Ok(errors)
    }

    async fn pre_init_node(&self, node: &Element, path: &str) -> Result<Box<dyn Widget>, InitError> {
        let resolve_error = |source: ResolveError| InitError::Resolve {
            path: path.to_string(),
            source,
        };

        let module = self.resolver.resolve(path).await.map_err(resolve_error)?;
        let class_name = self.config.export_name(path);
        let constructor = module.export(&class_name).ok_or_else(|| {
            resolve_error(ResolveError::ClassNotFound {
                class_name: class_name.clone(),
                path: path.to_string(),
            })
        })?;

        let mut widget = constructor();
        widget.pre_init(node).await.map_err(|source| InitError::PreInit {
            path: path.to_string(),
            source,
        })?;

        if widget.has_failed() {
            return Err(InitError::PreInitFailed {
                path: path.to_string(),
            });
        }
        tracing::trace!(target: "trellis::orchestrator", path, %class_name, "pre-initialized");
        Ok(widget)
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Destroy every registered widget under `root`, deepest and last first.
    ///
    /// A widget that reports [`WidgetError::DestroyedDuringInit`] is logged,
    /// reported and dropped from the registry, and teardown continues. Any
    /// other destroy error is returned immediately; widgets not yet reached
    /// stay registered. A widget that had already destroyed itself is dropped
    /// from the registry without being destroyed again.
    #[tracing::instrument(skip_all, target = "trellis::orchestrator", fields(root = ?root))]
    pub fn teardown(&mut self, root: &Element) -> Result<(), TeardownError> {
        let nodes = root.query_attribute_all(&self.config.widget_attribute)?;

        for node in nodes.iter().rev() {
            let path = self.widget_path(node);
            let Some(widget) = self.widgets.get_mut(node) else {
                tracing::trace!(target: "trellis::orchestrator", "No instance found or already destroyed for {path}");
                continue;
            };
            if widget.is_destroyed() {
                // Left behind by an earlier destroy that failed after marking itself.
                self.widgets.remove(node);
                tracing::trace!(target: "trellis::orchestrator", "No instance found or already destroyed for {path}");
                continue;
            }

            match widget.destroy() {
                Ok(()) => {
                    self.widgets.remove(node);
                    let line = format!("Widget {path} destroyed.");
                    tracing::info!(target: "trellis::orchestrator", "{line}");
                    if self.config.report_destroyed {
                        self.report(&line);
                    }
                }
                Err(err) if err.is_destroyed_during_init() => {
                    self.widgets.remove(node);
                    tracing::error!(target: "trellis::orchestrator", "{err}");
                    self.report(&err.to_string());
                }
                Err(source) => {
                    tracing::error!(target: "trellis::orchestrator", %path, %source, "teardown aborted");
                    return Err(TeardownError::Destroy { path, source });
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn widget_path(&self, node: &Element) -> String {
        node.attribute(&self.config.widget_attribute)
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    fn report(&self, line: &str) {
        if let Some(sink) = &self.feedback {
            sink.report(line);
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("widgets", &self.widgets.len())
            .field("has_feedback", &self.feedback.is_some())
            .finish()
    }
}

async fn post_init_widget(widget: &mut dyn Widget, node: &Element, path: &str) -> Result<(), InitError> {
    let result = widget.post_init(node).await;
    let outcome = match result {
        Ok(()) if widget.has_failed() => {
            return Err(InitError::PostInitFailed {
                path: path.to_string(),
            });
        }
        Ok(()) => node.add_state(StateClass::Initialized).map(drop).map_err(WidgetError::from),
        Err(err) => Err(err),
    };

    outcome.map_err(|source| {
        mark_failed(node);
        InitError::PostInit {
            path: path.to_string(),
            source,
        }
    })
}

fn mark_failed(node: &Element) {
    if let Err(err) = node.add_state(StateClass::Failed) {
        tracing::debug!(target: "trellis::orchestrator", %err, "could not mark node failed");
    }
}

/// Builder for [`Orchestrator`].
#[derive(Default)]
pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    resolver: Option<Arc<dyn Resolver>>,
    feedback: Option<Box<dyn FeedbackSink>>,
}

impl OrchestratorBuilder {
    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `resolver` instead of the built-in module registry.
    pub fn resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Share a resolver with other orchestrators.
    pub fn shared_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Write errors and destroy notices to `sink`.
    pub fn feedback(mut self, sink: impl FeedbackSink + 'static) -> Self {
        self.feedback = Some(Box::new(sink));
        self
    }

    /// Build the orchestrator, provisioning the process environment if needed.
    pub fn build(self) -> Orchestrator {
        let env = environment::ensure();
        tracing::debug!(target: "trellis::orchestrator", headless = env.is_headless(), "orchestrator created");

        Orchestrator {
            config: self.config,
            resolver: self
                .resolver
                .unwrap_or_else(|| Arc::new(ModuleRegistry::builtin())),
            feedback: self.feedback,
            widgets: HashMap::new(),
        }
    }
}
