//! Patch applicator.
//!
//! [`apply`] is total: it never fails and never mutates its input. Any op it
//! cannot make sense of (unknown collection, missing target, malformed
//! payload, unsupported field or tag) returns a copy of the input tree, and
//! the reason is traced at `trace` level.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::trace;

use crate::ast::{Node, Scalar, Tree};
use crate::patch::path::{InsertAt, PatchPath};
use crate::patch::EditOp;

/// Why an op left the tree unchanged.
#[derive(Debug, Error, PartialEq)]
pub(crate) enum Skip {
    #[error("path `{0}` is outside the `nodes` collection")]
    Namespace(String),
    #[error("path `{0}` does not name a node")]
    NoTarget(String),
    #[error("node `{0}` does not exist")]
    MissingNode(String),
    #[error("node `{0}` already exists")]
    DuplicateId(String),
    #[error("payload rejected: {0}")]
    Payload(&'static str),
    #[error("field `{field}` is not supported by `{op}`")]
    Field { op: &'static str, field: String },
    #[error("`{0}` has no defined semantics")]
    Unsupported(&'static str),
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Applies one edit, returning the resulting tree.
///
/// # Examples
///
/// ```rust
/// use uix::ast::{Node, Tree};
/// use uix::patch::{apply, EditOp};
/// let tree = Tree::with_root(Node::new("R", "shell"));
/// let next = apply(&tree, &EditOp::add_child("R", None, &Node::new("A", "region")));
/// assert_eq!(next.children_of("R"), ["A".to_string()]);
/// // the input is untouched
/// assert!(tree.children_of("R").is_empty());
/// ```
pub fn apply(tree: &Tree, op: &EditOp) -> Tree {
    match try_apply(tree, op) {
        Ok(next) => next,
        Err(skip) => {
            trace!(op = op.name(), path = ?op.path(), reason = %skip, "edit skipped");
            tree.clone()
        }
    }
}

/// Folds [`apply`] over `ops` in order.
pub fn apply_all<'a, I>(tree: &Tree, ops: I) -> Tree
where
    I: IntoIterator<Item = &'a EditOp>,
{
    ops.into_iter().fold(tree.clone(), |acc, op| apply(&acc, op))
}

pub(crate) fn try_apply(tree: &Tree, op: &EditOp) -> Result<Tree, Skip> {
    let raw = match op {
        EditOp::Unsupported => return Err(Skip::Unsupported("unknown op")),
        EditOp::Move { .. } => return Err(Skip::Unsupported("move")),
        other => other.path().unwrap_or_default(),
    };
    let path = PatchPath::parse(raw);
    if !path.is_nodes() {
        return Err(Skip::Namespace(raw.to_string()));
    }
    let id = path.id().ok_or_else(|| Skip::NoTarget(raw.to_string()))?;

    match op {
        EditOp::Add { value, .. } => add_child(tree, &path, id, value),
        EditOp::Remove { .. } => remove_node(tree, id),
        EditOp::Replace { value, .. } => replace_field(tree, &path, id, value),
        EditOp::Move { .. } | EditOp::Unsupported => Err(Skip::Unsupported(op.name())),
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

fn add_child(tree: &Tree, path: &PatchPath, parent_id: &str, value: &Value) -> Result<Tree, Skip> {
    if path.field() != Some("children") {
        return Err(Skip::Field {
            op: "add",
            field: path.field().unwrap_or_default().to_string(),
        });
    }
    let parent = tree
        .get(parent_id)
        .ok_or_else(|| Skip::MissingNode(parent_id.to_string()))?;

    let mut node = sanitize_node(value)?;
    if node.id.is_empty() {
        return Err(Skip::Payload("node id is empty"));
    }
    if tree.contains(&node.id) {
        return Err(Skip::DuplicateId(node.id));
    }
    node.parent_id = Some(parent_id.to_string());

    let mut parent = parent.clone();
    match path.insert_at(parent.children.len()) {
        InsertAt::End => parent.children.push(node.id.clone()),
        InsertAt::Index(i) => parent.children.insert(i, node.id.clone()),
    }

    let mut nodes = tree.nodes.clone();
    nodes.insert(node.id.clone(), node);
    nodes.insert(parent_id.to_string(), parent);
    Ok(Tree {
        root_id: tree.root_id.clone(),
        nodes,
    })
}

// Shallow: descendants stay in the table and become orphans.
fn remove_node(tree: &Tree, id: &str) -> Result<Tree, Skip> {
    let node = tree
        .get(id)
        .ok_or_else(|| Skip::MissingNode(id.to_string()))?;

    let mut nodes = tree.nodes.clone();
    if let Some(parent_id) = &node.parent_id {
        if let Some(parent) = nodes.get(parent_id) {
            let mut parent = parent.clone();
            parent.children.retain(|child| child != id);
            nodes.insert(parent_id.clone(), parent);
        }
    }
    nodes.remove(id);
    Ok(Tree {
        root_id: tree.root_id.clone(),
        nodes,
    })
}

fn replace_field(tree: &Tree, path: &PatchPath, id: &str, value: &Value) -> Result<Tree, Skip> {
    let mut node = tree
        .get(id)
        .cloned()
        .ok_or_else(|| Skip::MissingNode(id.to_string()))?;

    match path.field() {
        Some("props") | Some("attributes") => {
            let Value::Object(entries) = value else {
                return Err(Skip::Payload("props replacement is not an object"));
            };
            for (name, raw) in entries {
                if let Some(scalar) = Scalar::from_json(raw) {
                    node.attributes.insert(name.clone(), scalar);
                }
            }
        }
        Some("isCollapsed") | Some("collapsed") => {
            let Value::Bool(flag) = value else {
                return Err(Skip::Payload("collapsed flag is not a boolean"));
            };
            node.collapsed = *flag;
        }
        other => {
            return Err(Skip::Field {
                op: "replace",
                field: other.unwrap_or_default().to_string(),
            })
        }
    }

    let mut nodes = tree.nodes.clone();
    nodes.insert(id.to_string(), node);
    Ok(Tree {
        root_id: tree.root_id.clone(),
        nodes,
    })
}

// ============================================================================
// PAYLOAD SANITIZING
// ============================================================================

// Fills in absent or ill-typed `children`/`props`, drops non-scalar props and
// the fields the applicator sets itself, then decodes the node.
fn sanitize_node(value: &Value) -> Result<Node, Skip> {
    let Value::Object(raw) = value else {
        return Err(Skip::Payload("node payload is not an object"));
    };
    let mut fields: Map<String, Value> = raw.clone();

    if !matches!(fields.get("children"), Some(Value::Array(_))) {
        fields.insert("children".to_string(), Value::Array(Vec::new()));
    }
    let props = match fields.remove("props") {
        Some(Value::Object(props)) => props
            .into_iter()
            .filter(|(_, v)| Scalar::from_json(v).is_some())
            .collect(),
        _ => Map::new(),
    };
    fields.insert("props".to_string(), Value::Object(props));
    fields.remove("parentId");
    if !matches!(fields.get("isCollapsed"), Some(Value::Bool(_))) {
        fields.remove("isCollapsed");
    }

    serde_json::from_value(Value::Object(fields)).map_err(|_| Skip::Payload("node payload does not decode"))
}
