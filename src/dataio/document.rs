//! Section tree: a slotmap arena of named nodes holding key/value pairs.

use std::collections::BTreeMap;

use slotmap::{new_key_type, SecondaryMap, SlotMap};

new_key_type! {
    /// Handle to a section in a [`Document`]. Copy, lightweight (u64).
    pub struct NodeId;
}

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// A property value as written in the source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValueNode {
    /// Raw text, trimmed. Quotes and escapes are preserved.
    pub value: String,
    /// Whether the value was written as `[ … ]`.
    pub list_node: bool,
    /// Trimmed list elements when `list_node` is set.
    pub value_list: Vec<String>,
}

impl ValueNode {
    /// Wrap a raw value, splitting it into elements when it is a `[a, b, …]` list.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let list_node = value.len() >= 2 && value.starts_with('[') && value.ends_with(']');
        let value_list = if list_node && value.len() >= 3 {
            split_list(&value[1..value.len() - 1])
        } else {
            Vec::new()
        };
        Self {
            value,
            list_node,
            value_list,
        }
    }
}

/// Split list contents on commas outside of quoted strings.
fn split_list(inner: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            ',' => items.push(std::mem::take(&mut current).trim().to_string()),
            '"' => {
                current.push(c);
                let mut escaped = false;
                for c in chars.by_ref() {
                    current.push(c);
                    if c == '"' && !escaped {
                        break;
                    }
                    escaped = c == '\\' && !escaped;
                }
            }
            _ => current.push(c),
        }
    }
    items.push(current.trim().to_string());
    items
}

/// Data stored per section.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    /// Section name, empty for the root and for anonymous sections.
    pub name: String,
    /// Properties, sorted by key.
    pub properties: BTreeMap<String, ValueNode>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }
}

/// A parsed DataIO document.
///
/// All sections live in one `SlotMap`. Children are kept in insertion order and
/// each node records its parent for scope lookups during inheritance.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: SlotMap<NodeId, Node>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    root: NodeId,
}

impl Document {
    /// Create a document holding only an unnamed root.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::default());
        let mut children = SecondaryMap::new();
        children.insert(root, Vec::new());
        Self {
            nodes,
            children,
            parent: SecondaryMap::new(),
            root,
        }
    }

    /// The unnamed root section.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a reference to a section by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Name of a section, or `""` if it does not exist.
    pub fn name(&self, id: NodeId) -> &str {
        self.nodes.get(id).map_or("", |node| node.name.as_str())
    }

    /// Enclosing section, or `None` for the root and unknown ids.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Child sections in insertion order. Empty if the node does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// First child of `id` named `name`.
    pub fn find_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.name(child) == name)
    }

    /// Value of property `key` in section `id`.
    pub fn property(&self, id: NodeId, key: &str) -> Option<&ValueNode> {
        self.nodes.get(id)?.properties.get(key)
    }

    /// Properties of a section in key order. Empty if the node does not exist.
    pub fn properties(&self, id: NodeId) -> impl Iterator<Item = (&str, &ValueNode)> + '_ {
        self.nodes
            .get(id)
            .into_iter()
            .flat_map(|node| node.properties.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Append a new, empty section under `parent`.
    ///
    /// Returns `None` if `parent` does not exist.
    pub fn insert_child(&mut self, parent: NodeId, name: impl Into<String>) -> Option<NodeId> {
        let id = self.create_detached(parent, Node::new(name))?;
        self.attach(id);
        Some(id)
    }

    /// Set a property, returning the value it replaced.
    pub fn set_property(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: ValueNode,
    ) -> Option<ValueNode> {
        self.nodes.get_mut(id)?.properties.insert(key.into(), value)
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// Deep-copy `source` and its descendants as the last child of `new_parent`.
    pub fn copy_subtree(&mut self, source: NodeId, new_parent: NodeId) -> Option<NodeId> {
        let mut top = None;
        let mut pending = vec![(source, new_parent)];
        while let Some((original, parent)) = pending.pop() {
            let Some(data) = self.nodes.get(original).cloned() else {
                continue;
            };
            let kids = self.children(original).to_vec();
            let Some(copy) = self.create_detached(parent, data) else {
                continue;
            };
            self.attach(copy);
            top.get_or_insert(copy);
            // Reversed so the first child is copied (and attached) first.
            pending.extend(kids.into_iter().rev().map(|kid| (kid, copy)));
        }
        top
    }

    /// Copy into `target` every property and child section of `base` that
    /// `target` does not define itself. Children are deep copies.
    pub fn inherit(&mut self, target: NodeId, base: NodeId) {
        let Some(base_node) = self.nodes.get(base) else {
            return;
        };
        let inherited: Vec<(String, ValueNode)> = base_node
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(node) = self.nodes.get_mut(target) {
            for (key, value) in inherited {
                node.properties.entry(key).or_insert(value);
            }
        }

        for base_child in self.children(base).to_vec() {
            if self.find_child(target, self.name(base_child)).is_none() {
                self.copy_subtree(base_child, target);
            }
        }
    }

    /// Number of sections, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document holds only an empty root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && self.properties(self.root).next().is_none()
    }

    /// Create a node whose parent link is set but which is not yet listed among
    /// the parent's children.
    pub(crate) fn create_detached(&mut self, parent: NodeId, data: Node) -> Option<NodeId> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        self.parent.insert(id, parent);
        Some(id)
    }

    /// List a detached node among its parent's children.
    pub(crate) fn attach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            if let Some(siblings) = self.children.get_mut(parent) {
                siblings.push(id);
            }
        }
    }

    /// Find `name` among the children of `start`, then of each ancestor.
    pub(crate) fn find_in_scope(&self, start: NodeId, name: &str) -> Option<NodeId> {
        let mut scope = Some(start);
        while let Some(id) = scope {
            if let Some(found) = self.find_child(id, name) {
                return Some(found);
            }
            scope = self.parent(id);
        }
        None
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
