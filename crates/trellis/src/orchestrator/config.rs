//! Orchestrator configuration.

use crate::resolver::class_name_with_prefix;

/// Default attribute naming a node's widget path.
pub const DEFAULT_WIDGET_ATTRIBUTE: &str = "widget";

/// Default prefix of a widget's export name.
pub const DEFAULT_EXPORT_PREFIX: &str = "Widget";

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Attribute that marks a node as a widget host and holds its path.
    pub widget_attribute: String,
    /// Prefix prepended to the upper-cased last path segment to form the
    /// export name.
    pub export_prefix: String,
    /// Whether successful destroys are written to the feedback sink.
    pub report_destroyed: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            widget_attribute: DEFAULT_WIDGET_ATTRIBUTE.to_string(),
            export_prefix: DEFAULT_EXPORT_PREFIX.to_string(),
            report_destroyed: true,
        }
    }
}

impl OrchestratorConfig {
    /// Set the widget attribute name.
    pub fn with_widget_attribute(mut self, name: impl Into<String>) -> Self {
        self.widget_attribute = name.into();
        self
    }

    /// Set the export name prefix.
    pub fn with_export_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.export_prefix = prefix.into();
        self
    }

    pub fn with_report_destroyed(mut self, report: bool) -> Self {
        self.report_destroyed = report;
        self
    }

    /// The export name expected for `path`.
    pub fn export_name(&self, path: &str) -> String {
        class_name_with_prefix(&self.export_prefix, path)
    }
}
