//! Tree model for the uix engine
//!
//! A UI is described by a flat node table keyed by id plus the id of the root.
//! Parent/child structure lives in each node's ordered `children` list; the
//! optional `parent_id` is a back-reference kept in sync by the patch
//! applicator. Nothing in this module enforces the structural invariants
//! (unique ids, no dangling children, single parent, acyclic). They are
//! preserved by the applicator and reported by [`crate::integrity`] when a
//! tree arrives that violates them.

// ============================================================================
// IMPORTS
// ============================================================================

use std::fmt;

use im::OrdMap;
use serde::{Deserialize, Deserializer, Serialize};

pub mod value;

pub use value::Scalar;

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Globally unique node identifier.
pub type NodeId = String;

/// Attribute table of a node. Ordered, so iteration is already canonical.
pub type Attributes = OrdMap<String, Scalar>;

/// Id of the root node in the canonical initial tree.
pub const INITIAL_ROOT_ID: &str = "root_shell";

/// Category of a UI node. Doubles as the element name in the projection.
///
/// Kinds outside the built-in set are kept verbatim in `Custom` so trees
/// produced elsewhere survive a load/save cycle untouched.
///
/// # Examples
///
/// ```rust
/// use uix::ast::NodeKind;
/// assert_eq!(NodeKind::from("region"), NodeKind::Region);
/// assert_eq!(NodeKind::from("card").as_str(), "card");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    AppShell,
    Shell,
    View,
    Region,
    Container,
    Button,
    Text,
    Input,
    List,
    Item,
    Dialog,
    Feed,
    Custom(String),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::AppShell => "app_shell",
            NodeKind::Shell => "shell",
            NodeKind::View => "view",
            NodeKind::Region => "region",
            NodeKind::Container => "container",
            NodeKind::Button => "button",
            NodeKind::Text => "text",
            NodeKind::Input => "input",
            NodeKind::List => "list",
            NodeKind::Item => "item",
            NodeKind::Dialog => "dialog",
            NodeKind::Feed => "feed",
            NodeKind::Custom(name) => name,
        }
    }
}

impl From<&str> for NodeKind {
    fn from(name: &str) -> Self {
        match name {
            "app_shell" => NodeKind::AppShell,
            "shell" => NodeKind::Shell,
            "view" => NodeKind::View,
            "region" => NodeKind::Region,
            "container" => NodeKind::Container,
            "button" => NodeKind::Button,
            "text" => NodeKind::Text,
            "input" => NodeKind::Input,
            "list" => NodeKind::List,
            "item" => NodeKind::Item,
            "dialog" => NodeKind::Dialog,
            "feed" => NodeKind::Feed,
            other => NodeKind::Custom(other.to_string()),
        }
    }
}

impl From<String> for NodeKind {
    fn from(name: String) -> Self {
        NodeKind::from(name.as_str())
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single UI component descriptor.
///
/// The serialized field names follow the saved-session layout
/// (`type`, `props`, `parentId`, `isCollapsed`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(rename = "props", default, deserialize_with = "scalar_props")]
    pub attributes: Attributes,
    #[serde(default)]
    pub children: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(rename = "isCollapsed", default, skip_serializing_if = "is_false")]
    pub collapsed: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

// Keeps the scalar entries of a saved `props` object and drops the rest, the
// same filtering the applicator does for patch payloads.
fn scalar_props<'de, D>(deserializer: D) -> Result<Attributes, D::Error>
where
    D: Deserializer<'de>,
{
    let serde_json::Value::Object(raw) = serde_json::Value::deserialize(deserializer)? else {
        return Ok(Attributes::new());
    };
    Ok(raw
        .iter()
        .filter_map(|(name, value)| Some((name.clone(), Scalar::from_json(value)?)))
        .collect())
}

impl Node {
    /// Creates a childless, attribute-free node.
    pub fn new(id: impl Into<NodeId>, kind: impl Into<NodeKind>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
            parent_id: None,
            collapsed: false,
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// The AST: a node table plus the id of its root.
///
/// Cloning is cheap; the node table is a persistent map, so every patch
/// produces a new `Tree` that shares unchanged nodes with its predecessor.
///
/// # Examples
///
/// ```rust
/// use uix::ast::{Tree, INITIAL_ROOT_ID};
/// let tree = Tree::initial();
/// assert_eq!(tree.root_id, INITIAL_ROOT_ID);
/// assert_eq!(tree.len(), 1);
/// assert!(tree.root().unwrap().children.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    pub root_id: NodeId,
    pub nodes: OrdMap<NodeId, Node>,
}

/// Flattened per-node view handed to the external patch oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(rename = "props")]
    pub attributes: Attributes,
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Tree {
    /// Builds a tree holding only `root`.
    pub fn with_root(root: Node) -> Self {
        let mut nodes = OrdMap::new();
        let root_id = root.id.clone();
        nodes.insert(root_id.clone(), root);
        Self { root_id, nodes }
    }

    /// The canonical initial tree: a lone `app_shell` root labelled "App Shell".
    pub fn initial() -> Self {
        Self::with_root(Node::new(INITIAL_ROOT_ID, NodeKind::AppShell).with_attr("label", "App Shell"))
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// The root node, if the root id is still present in the table.
    pub fn root(&self) -> Option<&Node> {
        self.nodes.get(&self.root_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of `id` in order, or an empty slice for an unknown id.
    pub fn children_of(&self, id: &str) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Ids of every node whose `children` list references `id`.
    ///
    /// In a well-formed tree this is at most one id.
    pub fn referencing_parents(&self, id: &str) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|node| node.children.iter().any(|child| child == id))
            .map(|node| node.id.clone())
            .collect()
    }

    /// Flattened summary of every node, ordered by id.
    pub fn summary(&self) -> Vec<NodeSummary> {
        self.nodes
            .values()
            .map(|node| NodeSummary {
                id: node.id.clone(),
                kind: node.kind.clone(),
                parent_id: node.parent_id.clone(),
                attributes: node.attributes.clone(),
            })
            .collect()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_deserializes_from_saved_session_shape() {
        let node: Node = serde_json::from_value(json!({
            "id": "b1",
            "type": "button",
            "props": { "label": "Save", "primary": true },
            "children": [],
            "parentId": "root_shell",
            "isCollapsed": true
        }))
        .unwrap();
        assert_eq!(node.kind, NodeKind::Button);
        assert_eq!(node.attributes.get("label"), Some(&Scalar::from("Save")));
        assert_eq!(node.parent_id.as_deref(), Some("root_shell"));
        assert!(node.collapsed);
    }

    #[test]
    fn missing_optional_node_fields_default() {
        let node: Node = serde_json::from_value(json!({ "id": "x", "type": "card" })).unwrap();
        assert_eq!(node.kind, NodeKind::Custom("card".to_string()));
        assert!(node.attributes.is_empty());
        assert!(node.children.is_empty());
        assert!(!node.collapsed);
    }

    #[test]
    fn non_scalar_props_are_dropped_on_load() {
        let node: Node = serde_json::from_value(json!({
            "id": "b1",
            "type": "button",
            "props": { "label": "Save", "style": { "color": "red" }, "tags": ["a"] }
        }))
        .unwrap();
        assert_eq!(node.attributes.len(), 1);
        assert_eq!(node.attributes.get("label"), Some(&Scalar::from("Save")));

        let node: Node = serde_json::from_value(json!({ "id": "x", "type": "text", "props": null })).unwrap();
        assert!(node.attributes.is_empty());
    }

    #[test]
    fn custom_kind_round_trips_verbatim() {
        let node = Node::new("x", "chart_panel");
        let text = serde_json::to_string(&node).unwrap();
        assert!(text.contains("\"type\":\"chart_panel\""));
        assert!(!text.contains("isCollapsed"));
        let back: Node = serde_json::from_str(&text).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn referencing_parents_scans_children_lists() {
        let mut tree = Tree::with_root(Node::new("R", "shell").with_children(["A"]));
        tree.nodes.insert("A".to_string(), Node::new("A", "region").with_parent("R"));
        assert_eq!(tree.referencing_parents("A"), vec!["R".to_string()]);
        assert!(tree.referencing_parents("R").is_empty());
        assert_eq!(tree.children_of("R"), ["A".to_string()]);
        assert!(tree.children_of("missing").is_empty());
    }

    #[test]
    fn summary_lists_every_node_in_id_order() {
        let mut tree = Tree::with_root(Node::new("R", "shell").with_children(["b", "a"]));
        tree.nodes.insert("b".to_string(), Node::new("b", "text").with_parent("R"));
        tree.nodes.insert("a".to_string(), Node::new("a", "button").with_parent("R"));
        let ids: Vec<_> = tree.summary().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["R", "a", "b"]);
    }
}
