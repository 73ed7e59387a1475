//! Markup tree for Trellis.
//!
//! Provides the node storage that widgets are attached to:
//! - Stable node identifiers via arena-based storage
//! - Parent-child relationships with cascading removal
//! - Attributes, class lists and text content per node
//! - Document-order traversal and attribute queries
//!
//! # Key Types
//!
//! - [`NodeId`] - Stable identifier for a node inside one tree
//! - [`MarkupTree`] - The arena holding every node of a document
//! - [`Document`] - Cloneable, thread-safe handle to a shared tree
//! - [`Element`] - A node handle bound to its document, the unit widgets attach to
//! - [`StateClass`] - The lifecycle annotations applied to widget nodes

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};

use crate::error::{TreeError, TreeResult};

new_key_type! {
    /// A unique identifier for a node in a [`MarkupTree`].
    ///
    /// `NodeId`s remain valid while the tree is restructured and become
    /// invalid once the node is removed.
    pub struct NodeId;
}

impl NodeId {
    /// Convert the NodeId to a raw u64 value.
    #[inline]
    pub fn as_raw(self) -> u64 {
        use slotmap::Key;
        self.data().as_ffi()
    }
}

/// Lifecycle annotations applied to widget-hosting nodes.
///
/// These are plain entries in the node's class list so that styling can
/// react to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateClass {
    /// The widget finished its pre-init phase.
    PreInitialized,
    /// The widget finished its post-init phase.
    Initialized,
    /// The widget reported that it finished its work.
    Finished,
    /// The widget failed somewhere in its lifecycle.
    Failed,
}

impl StateClass {
    /// Every state class, in lifecycle order.
    pub const ALL: [StateClass; 4] = [
        StateClass::PreInitialized,
        StateClass::Initialized,
        StateClass::Finished,
        StateClass::Failed,
    ];

    /// The class name written to the node.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreInitialized => "pre-initialized",
            Self::Initialized => "initialized",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for StateClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal data stored for each node.
struct NodeData {
    /// Lower-case tag name.
    tag: String,
    /// Attribute map (`class` is kept separately in `classes`).
    attributes: HashMap<String, String>,
    /// Class list in insertion order, without duplicates.
    classes: Vec<String>,
    /// Text content owned directly by this node.
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: HashMap::new(),
            classes: Vec::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Arena storage for all nodes of one document.
///
/// # Related Types
///
/// - [`Document`] - Shared, lockable wrapper around a tree
/// - [`Element`] - Node handle used by widgets and the orchestrator
pub struct MarkupTree {
    nodes: SlotMap<NodeId, NodeData>,
}

impl MarkupTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    /// Create a detached node with the given tag.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = self.nodes.insert(NodeData::new(tag));
        tracing::trace!(target: "trellis_core::tree", ?id, tag, "created element");
        id
    }

    /// Remove a node and all of its descendants.
    #[tracing::instrument(skip(self), target = "trellis_core::tree", level = "trace")]
    pub fn remove(&mut self, id: NodeId) -> TreeResult<()> {
        let descendants = self.depth_first_postorder(id)?;

        if let Some(parent_id) = self.nodes.get(id).and_then(|d| d.parent) {
            if let Some(parent) = self.nodes.get_mut(parent_id) {
                parent.children.retain(|&child| child != id);
            }
        }

        // Postorder ends with `id` itself.
        for node in descendants {
            self.nodes.remove(node);
        }
        Ok(())
    }

    /// Check if a node exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return Err(TreeError::InvalidNodeId);
        }
        if self.is_ancestor_of(child, parent) {
            return Err(TreeError::CircularParentage);
        }

        if let Some(old_parent) = self.nodes.get(child).and_then(|d| d.parent) {
            if let Some(data) = self.nodes.get_mut(old_parent) {
                data.children.retain(|&c| c != child);
            }
        }
        if let Some(data) = self.nodes.get_mut(child) {
            data.parent = Some(parent);
        }
        if let Some(data) = self.nodes.get_mut(parent) {
            data.children.push(child);
        }
        Ok(())
    }

    /// Check if `potential_ancestor` is `id` or one of its ancestors.
    fn is_ancestor_of(&self, potential_ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(current_id) = current {
            if current_id == potential_ancestor {
                return true;
            }
            current = self.nodes.get(current_id).and_then(|d| d.parent);
        }
        false
    }

    fn data(&self, id: NodeId) -> TreeResult<&NodeData> {
        self.nodes.get(id).ok_or(TreeError::InvalidNodeId)
    }

    fn data_mut(&mut self, id: NodeId) -> TreeResult<&mut NodeData> {
        self.nodes.get_mut(id).ok_or(TreeError::InvalidNodeId)
    }

    pub fn parent(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        self.data(id).map(|d| d.parent)
    }

    pub fn children(&self, id: NodeId) -> TreeResult<&[NodeId]> {
        self.data(id).map(|d| d.children.as_slice())
    }

    pub fn tag_name(&self, id: NodeId) -> TreeResult<&str> {
        self.data(id).map(|d| d.tag.as_str())
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Get an attribute value. `class` is served from the class list.
    pub fn attribute(&self, id: NodeId, name: &str) -> TreeResult<Option<String>> {
        let data = self.data(id)?;
        if name == "class" {
            if data.classes.is_empty() {
                return Ok(None);
            }
            return Ok(Some(data.classes.join(" ")));
        }
        Ok(data.attributes.get(name).cloned())
    }

    /// Check whether an attribute is present.
    pub fn has_attribute(&self, id: NodeId, name: &str) -> TreeResult<bool> {
        let data = self.data(id)?;
        if name == "class" {
            return Ok(!data.classes.is_empty());
        }
        Ok(data.attributes.contains_key(name))
    }

    /// Set an attribute. Setting `class` replaces the whole class list.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> TreeResult<()> {
        let data = self.data_mut(id)?;
        let value = value.into();
        if name == "class" {
            data.classes.clear();
            for class in value.split_whitespace() {
                if !data.classes.iter().any(|c| c == class) {
                    data.classes.push(class.to_string());
                }
            }
        } else {
            data.attributes.insert(name.to_string(), value);
        }
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> TreeResult<Option<String>> {
        let data = self.data_mut(id)?;
        if name == "class" {
            let previous = (!data.classes.is_empty()).then(|| data.classes.join(" "));
            data.classes.clear();
            return Ok(previous);
        }
        Ok(data.attributes.remove(name))
    }

    // =========================================================================
    // Class list
    // =========================================================================

    pub fn has_class(&self, id: NodeId, class: &str) -> TreeResult<bool> {
        Ok(self.data(id)?.classes.iter().any(|c| c == class))
    }

    /// Add a class. Returns `true` if it was not present before.
    pub fn add_class(&mut self, id: NodeId, class: &str) -> TreeResult<bool> {
        let data = self.data_mut(id)?;
        if data.classes.iter().any(|c| c == class) {
            return Ok(false);
        }
        data.classes.push(class.to_string());
        Ok(true)
    }

    /// Remove a class. Returns `true` if it was present.
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> TreeResult<bool> {
        let data = self.data_mut(id)?;
        let before = data.classes.len();
        data.classes.retain(|c| c != class);
        Ok(data.classes.len() != before)
    }

    pub fn classes(&self, id: NodeId) -> TreeResult<&[String]> {
        self.data(id).map(|d| d.classes.as_slice())
    }

    // =========================================================================
    // Text
    // =========================================================================

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> TreeResult<()> {
        self.data_mut(id)?.text = text.into();
        Ok(())
    }

    /// Concatenated text of the node and its descendants, in document order.
    pub fn text_content(&self, id: NodeId) -> TreeResult<String> {
        let mut output = String::new();
        for node in self.depth_first_preorder(id)? {
            output.push_str(&self.data(node)?.text);
        }
        Ok(output)
    }

    // =========================================================================
    // Traversal and queries
    // =========================================================================

    /// Depth-first pre-order traversal: the node, then its children recursively.
    ///
    /// This is document order.
    pub fn depth_first_preorder(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        let mut result = Vec::new();
        self.depth_first_preorder_recursive(id, &mut result)?;
        Ok(result)
    }

    fn depth_first_preorder_recursive(&self, id: NodeId, result: &mut Vec<NodeId>) -> TreeResult<()> {
        let data = self.data(id)?;
        result.push(id);
        for &child_id in &data.children {
            self.depth_first_preorder_recursive(child_id, result)?;
        }
        Ok(())
    }

    /// Depth-first post-order traversal: children recursively, then the node.
    pub fn depth_first_postorder(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        let mut result = Vec::new();
        self.depth_first_postorder_recursive(id, &mut result)?;
        Ok(result)
    }

    fn depth_first_postorder_recursive(&self, id: NodeId, result: &mut Vec<NodeId>) -> TreeResult<()> {
        let data = self.data(id)?;
        for &child_id in &data.children {
            self.depth_first_postorder_recursive(child_id, result)?;
        }
        result.push(id);
        Ok(())
    }

    /// All descendants of `id` (excluding `id` itself) that carry the
    /// attribute `name`, in document order.
    pub fn query_attribute_all(&self, id: NodeId, name: &str) -> TreeResult<Vec<NodeId>> {
        let mut result = Vec::new();
        for node in self.depth_first_preorder(id)?.into_iter().skip(1) {
            if self.has_attribute(node, name)? {
                result.push(node);
            }
        }
        Ok(result)
    }

    /// Debug dump of a subtree, one node per line.
    pub fn dump_tree(&self, id: NodeId) -> TreeResult<String> {
        let mut output = String::new();
        self.dump_tree_recursive(id, 0, &mut output)?;
        Ok(output)
    }

    fn dump_tree_recursive(&self, id: NodeId, depth: usize, output: &mut String) -> TreeResult<()> {
        let data = self.data(id)?;
        let indent = "  ".repeat(depth);
        output.push_str(&format!("{}[{:?}] <{}>", indent, id, data.tag));
        if !data.classes.is_empty() {
            output.push_str(&format!(" .{}", data.classes.join(".")));
        }
        output.push('\n');
        for &child_id in &data.children {
            self.dump_tree_recursive(child_id, depth + 1, output)?;
        }
        Ok(())
    }
}

impl Default for MarkupTree {
    fn default() -> Self {
        Self::new()
    }
}

/// A thread-safe, cloneable handle to a [`MarkupTree`] plus its root.
///
/// Clones share the same tree. A new document starts as
/// `<html><body></body></html>`.
#[derive(Clone)]
pub struct Document {
    inner: Arc<RwLock<MarkupTree>>,
    root: NodeId,
    body: NodeId,
}

impl Document {
    /// Create a new empty document with an `html` root and a `body`.
    pub fn new() -> Self {
        let mut tree = MarkupTree::new();
        let root = tree.create_element("html");
        let body = tree.create_element("body");
        // Both nodes were just created in this tree.
        let _ = tree.append_child(root, body);
        Self {
            inner: Arc::new(RwLock::new(tree)),
            root,
            body,
        }
    }

    /// The `html` element.
    pub fn document_element(&self) -> Element {
        self.element(self.root)
    }

    /// The `body` element.
    pub fn body(&self) -> Element {
        self.element(self.body)
    }

    /// Create a detached element owned by this document.
    pub fn create_element(&self, tag: &str) -> Element {
        let id = self.inner.write().create_element(tag);
        self.element(id)
    }

    /// Wrap a node id of this document in an [`Element`] handle.
    pub fn element(&self, id: NodeId) -> Element {
        Element {
            document: self.clone(),
            id,
        }
    }

    /// Check whether two handles refer to the same document.
    pub fn same_document(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn node_count(&self) -> usize {
        self.inner.read().node_count()
    }

    /// Access the tree with a read lock for complex operations.
    pub fn with_read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&MarkupTree) -> R,
    {
        f(&self.inner.read())
    }

    /// Access the tree with a write lock for complex operations.
    pub fn with_write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut MarkupTree) -> R,
    {
        f(&mut self.inner.write())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root)
            .field("nodes", &self.node_count())
            .finish()
    }
}

/// A node handle bound to its [`Document`].
///
/// Two elements are equal when they point at the same node of the same
/// document, so `Element` can key a map.
#[derive(Clone)]
pub struct Element {
    document: Document,
    id: NodeId,
}

impl Element {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Whether the node still exists in its document.
    pub fn is_alive(&self) -> bool {
        self.document.with_read(|t| t.contains(self.id))
    }

    pub fn tag_name(&self) -> TreeResult<String> {
        self.document.with_read(|t| t.tag_name(self.id).map(str::to_string))
    }

    pub fn attribute(&self, name: &str) -> TreeResult<Option<String>> {
        self.document.with_read(|t| t.attribute(self.id, name))
    }

    pub fn has_attribute(&self, name: &str) -> TreeResult<bool> {
        self.document.with_read(|t| t.has_attribute(self.id, name))
    }

    pub fn set_attribute(&self, name: &str, value: impl Into<String>) -> TreeResult<()> {
        self.document.with_write(|t| t.set_attribute(self.id, name, value))
    }

    pub fn remove_attribute(&self, name: &str) -> TreeResult<Option<String>> {
        self.document.with_write(|t| t.remove_attribute(self.id, name))
    }

    pub fn has_class(&self, class: &str) -> TreeResult<bool> {
        self.document.with_read(|t| t.has_class(self.id, class))
    }

    pub fn add_class(&self, class: &str) -> TreeResult<bool> {
        self.document.with_write(|t| t.add_class(self.id, class))
    }

    pub fn remove_class(&self, class: &str) -> TreeResult<bool> {
        self.document.with_write(|t| t.remove_class(self.id, class))
    }

    pub fn classes(&self) -> TreeResult<Vec<String>> {
        self.document.with_read(|t| t.classes(self.id).map(<[String]>::to_vec))
    }

    /// Check for a lifecycle annotation. Missing nodes report `false`.
    pub fn has_state(&self, state: StateClass) -> bool {
        self.has_class(state.as_str()).unwrap_or(false)
    }

    pub fn add_state(&self, state: StateClass) -> TreeResult<bool> {
        self.add_class(state.as_str())
    }

    pub fn remove_state(&self, state: StateClass) -> TreeResult<bool> {
        self.remove_class(state.as_str())
    }

    pub fn set_text(&self, text: impl Into<String>) -> TreeResult<()> {
        self.document.with_write(|t| t.set_text(self.id, text))
    }

    pub fn text_content(&self) -> TreeResult<String> {
        self.document.with_read(|t| t.text_content(self.id))
    }

    /// Append `child` to this element. Both must belong to the same document.
    pub fn append_child(&self, child: &Element) -> TreeResult<()> {
        if !self.document.same_document(&child.document) {
            return Err(TreeError::ForeignDocument);
        }
        self.document.with_write(|t| t.append_child(self.id, child.id))
    }

    /// Create a child element with the given tag and append it.
    pub fn append_element(&self, tag: &str) -> TreeResult<Element> {
        let child = self.document.create_element(tag);
        self.append_child(&child)?;
        Ok(child)
    }

    pub fn parent(&self) -> TreeResult<Option<Element>> {
        let parent = self.document.with_read(|t| t.parent(self.id))?;
        Ok(parent.map(|id| self.document.element(id)))
    }

    pub fn children(&self) -> TreeResult<Vec<Element>> {
        let ids = self.document.with_read(|t| t.children(self.id).map(<[NodeId]>::to_vec))?;
        Ok(ids.into_iter().map(|id| self.document.element(id)).collect())
    }

    /// Remove this node and its subtree from the document.
    pub fn remove(&self) -> TreeResult<()> {
        self.document.with_write(|t| t.remove(self.id))
    }

    /// All descendants carrying the attribute `name`, in document order.
    /// The element itself is never included.
    pub fn query_attribute_all(&self, name: &str) -> TreeResult<Vec<Element>> {
        let ids = self.document.with_read(|t| t.query_attribute_all(self.id, name))?;
        Ok(ids.into_iter().map(|id| self.document.element(id)).collect())
    }

    /// A short human-readable identifier: the `id` attribute, else the
    /// `class` attribute, else the tag name.
    pub fn identifier(&self) -> String {
        self.document.with_read(|t| {
            let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
            non_empty(t.attribute(self.id, "id").ok().flatten())
                .or_else(|| non_empty(t.attribute(self.id, "class").ok().flatten()))
                .or_else(|| t.tag_name(self.id).ok().map(str::to_string))
                .unwrap_or_default()
        })
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.document.same_document(&other.document)
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.document.inner) as usize).hash(state);
        self.id.hash(state);
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.tag_name().unwrap_or_else(|_| "#removed".to_string());
        write!(f, "<{tag}> [{:?}]", self.id)
    }
}
