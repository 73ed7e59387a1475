//! Logging and debugging facilities for Trellis.
//!
//! Trellis uses the `tracing` crate for instrumentation. The library never
//! installs a subscriber; applications do that themselves:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("trellis=debug,trellis_core=info")
//!         .init();
//! }
//! ```
//!
//! Use [`MarkupTreeDebug`] to render a subtree together with the widget
//! paths and lifecycle classes attached to each node.

use std::fmt::Write as FmtWrite;

use crate::error::TreeResult;
use crate::tree::{Element, MarkupTree, NodeId};

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Markup tree target.
    pub const TREE: &str = "trellis_core::tree";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "trellis_core::signal";
    /// Environment bootstrap target.
    pub const ENVIRONMENT: &str = "trellis_core::environment";
    /// Widget lifecycle target.
    pub const WIDGET: &str = "trellis::widget";
    /// Orchestrator target.
    pub const ORCHESTRATOR: &str = "trellis::orchestrator";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    pub style: TreeStyle,
    /// Attribute whose value is printed next to the tag (the widget path).
    pub widget_attribute: String,
    /// Only print nodes carrying `widget_attribute` (their structure is kept).
    pub widgets_only: bool,
    /// Whether to print class lists.
    pub show_classes: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            widget_attribute: "widget".to_string(),
            widgets_only: false,
            show_classes: true,
            max_depth: None,
        }
    }
}

impl TreeFormatOptions {
    /// Options that only show widget-hosting nodes.
    pub fn widgets() -> Self {
        Self {
            widgets_only: true,
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: TreeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_widget_attribute(mut self, name: impl Into<String>) -> Self {
        self.widget_attribute = name.into();
        self
    }
}

/// Debug utility for visualizing markup subtrees.
#[derive(Debug, Clone, Default)]
pub struct MarkupTreeDebug {
    options: TreeFormatOptions,
}

impl MarkupTreeDebug {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format the subtree rooted at `root`.
    pub fn format_subtree(&self, root: &Element) -> TreeResult<String> {
        root.document().with_read(|tree| {
            let mut output = String::new();
            self.format_into(tree, root.id(), 0, true, &mut Vec::new(), &mut output)?;
            Ok(output)
        })
    }

    fn format_into(
        &self,
        tree: &MarkupTree,
        id: NodeId,
        depth: usize,
        is_last: bool,
        lineage: &mut Vec<bool>,
        output: &mut String,
    ) -> TreeResult<()> {
        if let Some(max) = self.options.max_depth {
            if depth > max {
                return Ok(());
            }
        }

        let widget = tree.attribute(id, &self.options.widget_attribute)?;
        let print = depth == 0 || !self.options.widgets_only || widget.is_some();

        if print {
            output.push_str(&self.build_prefix(lineage, depth, is_last));
            write!(output, "<{}>", tree.tag_name(id)?).expect("write to String");
            if let Some(path) = &widget {
                write!(output, " {path}").expect("write to String");
            }
            if self.options.show_classes {
                let classes = tree.classes(id)?;
                if !classes.is_empty() {
                    write!(output, " [{}]", classes.join(", ")).expect("write to String");
                }
            }
            output.push('\n');
        }

        let children = tree.children(id)?;
        let child_depth = if print { depth + 1 } else { depth };
        let nested = print && depth > 0;
        if nested {
            lineage.push(is_last);
        }
        for (i, &child) in children.iter().enumerate() {
            self.format_into(tree, child, child_depth, i + 1 == children.len(), lineage, output)?;
        }
        if nested {
            lineage.pop();
        }
        Ok(())
    }

    /// `lineage` holds, for each printed ancestor below the root, whether it
    /// was the last of its siblings.
    fn build_prefix(&self, lineage: &[bool], depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }
        let (branch, last, bar, pad) = match self.options.style {
            TreeStyle::Ascii => ("|-- ", "`-- ", "|   ", "    "),
            TreeStyle::Unicode => ("├── ", "└── ", "│   ", "    "),
        };
        let mut prefix = String::new();
        for &ancestor_last in lineage {
            prefix.push_str(if ancestor_last { pad } else { bar });
        }
        prefix.push_str(if is_last { last } else { branch });
        prefix
    }
}
