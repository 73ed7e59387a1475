//! Resolving widget paths to widget constructors.
//!
//! A node's widget attribute holds a path such as `widgets/b`. The
//! orchestrator hands that path to a [`Resolver`], which produces a
//! [`WidgetModule`]: a set of named constructors. The widget is then looked up
//! under the export `Widget` + the upper-cased last path segment
//! (`widgets/b` → `WidgetB`).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ResolveError;
use crate::orchestrator::DEFAULT_EXPORT_PREFIX;
use crate::widget::widgets::{WidgetA, WidgetB, WidgetC};
use crate::widget::Widget;

/// A constructor producing a fresh widget instance.
pub type WidgetConstructor = Arc<dyn Fn() -> Box<dyn Widget> + Send + Sync>;

/// The export name expected for `path` with the default prefix.
///
/// ```
/// assert_eq!(trellis::widget_class_name("widgets/b"), "WidgetB");
/// assert_eq!(trellis::widget_class_name("nav"), "WidgetNAV");
/// ```
pub fn widget_class_name(path: &str) -> String {
    class_name_with_prefix(DEFAULT_EXPORT_PREFIX, path)
}

/// The export name expected for `path` with a custom prefix.
pub fn class_name_with_prefix(prefix: &str, path: &str) -> String {
    let last = path.rsplit('/').next().unwrap_or(path);
    format!("{prefix}{}", last.to_uppercase())
}

/// A named set of widget constructors.
#[derive(Clone, Default)]
pub struct WidgetModule {
    exports: HashMap<String, WidgetConstructor>,
}

impl WidgetModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an export.
    pub fn with_export<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn Widget> + Send + Sync + 'static,
    {
        self.exports.insert(name.into(), Arc::new(constructor));
        self
    }

    /// Add an export that constructs `W::default()`.
    pub fn with_widget<W>(self, name: impl Into<String>) -> Self
    where
        W: Widget + Default + 'static,
    {
        self.with_export(name, || Box::new(W::default()))
    }

    pub fn export(&self, name: &str) -> Option<&WidgetConstructor> {
        self.exports.get(name)
    }

    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }
}

impl fmt::Debug for WidgetModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.export_names().collect();
        names.sort_unstable();
        f.debug_struct("WidgetModule").field("exports", &names).finish()
    }
}

/// Maps a widget path to its module.
///
/// Implementations may do asynchronous work such as loading code on demand.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, path: &str) -> Result<WidgetModule, ResolveError>;
}

/// The default resolver: a static table of modules keyed by path.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, WidgetModule>,
}

impl ModuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in widgets under `widgets/a`, `widgets/b`
    /// and `widgets/c`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("widgets/a", WidgetModule::new().with_widget::<WidgetA>("WidgetA"));
        registry.register("widgets/b", WidgetModule::new().with_widget::<WidgetB>("WidgetB"));
        registry.register("widgets/c", WidgetModule::new().with_widget::<WidgetC>("WidgetC"));
        registry
    }

    /// Register `module` under `path`, replacing any previous module.
    pub fn register(&mut self, path: impl Into<String>, module: WidgetModule) {
        self.modules.insert(path.into(), module);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_module(mut self, path: impl Into<String>, module: WidgetModule) -> Self {
        self.register(path, module);
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.modules.contains_key(path)
    }
}

#[async_trait]
impl Resolver for ModuleRegistry {
    async fn resolve(&self, path: &str) -> Result<WidgetModule, ResolveError> {
        self.modules
            .get(path)
            .cloned()
            .ok_or_else(|| ResolveError::ModuleNotFound { path: path.to_string() })
    }
}

/// Adapts a synchronous closure into a [`Resolver`].
///
/// ```
/// use trellis::{FnResolver, ResolveError, WidgetModule};
///
/// let resolver = FnResolver::new(|path: &str| {
///     Err::<WidgetModule, _>(ResolveError::load(path, "offline"))
/// });
/// # let _ = resolver;
/// ```
pub struct FnResolver<F> {
    resolve: F,
}

impl<F> FnResolver<F>
where
    F: Fn(&str) -> Result<WidgetModule, ResolveError> + Send + Sync,
{
    pub fn new(resolve: F) -> Self {
        Self { resolve }
    }
}

#[async_trait]
impl<F> Resolver for FnResolver<F>
where
    F: Fn(&str) -> Result<WidgetModule, ResolveError> + Send + Sync,
{
    async fn resolve(&self, path: &str) -> Result<WidgetModule, ResolveError> {
        (self.resolve)(path)
    }
}
