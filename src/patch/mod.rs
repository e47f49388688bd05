//! Edit operations and patch batches
//!
//! An [`EditOp`] is one JSON-Patch-like instruction addressed by a
//! [`path::PatchPath`]; a [`PatchBatch`] is the immutable, ordered unit the
//! history records. Payloads stay as raw JSON until the applicator interprets
//! them, so a malformed payload degrades to a no-op instead of a decode error.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::ast::{Attributes, Node};

pub mod apply;
pub mod path;

pub use apply::{apply, apply_all};
pub use path::PatchPath;

// ============================================================================
// EDIT OPERATIONS
// ============================================================================

/// A single edit against the node table.
///
/// `move` is part of the grammar but has no semantics; applying it leaves the
/// tree unchanged. Unknown `op` tags decode to [`EditOp::Unsupported`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum EditOp {
    Add {
        path: String,
        #[serde(default)]
        value: Value,
    },
    Replace {
        path: String,
        #[serde(default)]
        value: Value,
    },
    Remove {
        path: String,
    },
    Move {
        #[serde(default)]
        from: String,
        path: String,
    },
    #[serde(other)]
    Unsupported,
}

impl EditOp {
    /// Insert `node` under `parent`; `index` of `None` appends.
    pub fn add_child(parent: &str, index: Option<usize>, node: &Node) -> Self {
        let slot = index.map_or_else(|| path::APPEND.to_string(), |i| i.to_string());
        EditOp::Add {
            path: format!("/nodes/{}/children/{}", parent, slot),
            value: serde_json::to_value(node).unwrap_or(Value::Null),
        }
    }

    pub fn remove(id: &str) -> Self {
        EditOp::Remove {
            path: format!("/nodes/{}", id),
        }
    }

    /// Shallow-merge `attributes` into the node's props.
    pub fn merge_props(id: &str, attributes: &Attributes) -> Self {
        EditOp::Replace {
            path: format!("/nodes/{}/props", id),
            value: serde_json::to_value(attributes).unwrap_or(Value::Null),
        }
    }

    pub fn set_collapsed(id: &str, collapsed: bool) -> Self {
        EditOp::Replace {
            path: format!("/nodes/{}/isCollapsed", id),
            value: json!(collapsed),
        }
    }

    /// The target path, if the operation carries one.
    pub fn path(&self) -> Option<&str> {
        match self {
            EditOp::Add { path, .. }
            | EditOp::Replace { path, .. }
            | EditOp::Remove { path }
            | EditOp::Move { path, .. } => Some(path.as_str()),
            EditOp::Unsupported => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EditOp::Add { .. } => "add",
            EditOp::Replace { .. } => "replace",
            EditOp::Remove { .. } => "remove",
            EditOp::Move { .. } => "move",
            EditOp::Unsupported => "unsupported",
        }
    }
}

// ============================================================================
// PATCH BATCHES
// ============================================================================

/// Who produced a batch. Saved batches without an author load as `system`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Ai,
    #[default]
    System,
}

impl Author {
    pub fn as_str(&self) -> &'static str {
        match self {
            Author::User => "user",
            Author::Ai => "ai",
            Author::System => "system",
        }
    }
}

/// An ordered group of edits recorded as one undo step.
///
/// Ops inside a batch are applied one after another, not transactionally: an
/// op that turns out to be a no-op is skipped and the rest still apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchBatch {
    #[serde(default = "fresh_id")]
    pub id: String,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub author: Author,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ops: Vec<EditOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_confirmation: Option<bool>,
}

impl PatchBatch {
    /// Creates a batch stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        author: Author,
        description: impl Into<String>,
        ops: Vec<EditOp>,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp: now_millis(),
            author,
            description: description.into(),
            ops,
            requires_confirmation: None,
        }
    }

    /// Bookkeeping batch with a fresh random id.
    pub fn system(description: impl Into<String>, ops: Vec<EditOp>) -> Self {
        Self::new(fresh_id(), Author::System, description, ops)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// A random v4 UUID, used wherever an id is generated.
pub fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

/// Milliseconds since the Unix epoch; 0 if the clock is before it.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
