//! Structural integrity checking.
//!
//! The checker reads a tree (or a whole session) and reports defects without
//! correcting them: children that point at ids missing from the table, and
//! orphans (non-root nodes no parent references). It also gathers statistics
//! such as nesting depth, the kind histogram and history sizes. It never
//! fails. Malformed trees are what it exists to describe.
//!
//! The report is structured data; its `Display` impl is the human-readable
//! rendering and is derived from the structure alone.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::{NodeId, Tree};
use crate::session::{Session, WorkOrderStatus};

const RULE: &str = "----------------------------------------";

// ============================================================================
// REPORT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IntegrityStatus {
    Pass,
    Warn,
}

impl fmt::Display for IntegrityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityStatus::Pass => write!(f, "PASS"),
            IntegrityStatus::Warn => write!(f, "WARN"),
        }
    }
}

/// A child id that no node in the table carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingReference {
    pub parent: NodeId,
    pub child: NodeId,
}

/// A non-root node that no other node lists as a child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orphan {
    pub id: NodeId,
    pub kind: String,
}

/// A node listed in the `children` of more than one parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedChild {
    pub id: NodeId,
    pub parents: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCount {
    pub kind: String,
    pub count: usize,
}

/// Findings about a single tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureReport {
    pub node_count: usize,
    pub root_id: NodeId,
    pub root_present: bool,
    pub missing_references: Vec<MissingReference>,
    pub orphans: Vec<Orphan>,
    pub shared_children: Vec<SharedChild>,
    pub max_depth: usize,
    /// Sorted by descending count, ties by kind name.
    pub kind_distribution: Vec<KindCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub applied: usize,
    pub redos_available: usize,
    pub replay_consistent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

/// Full session diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    /// Id of the first recorded batch, if any.
    pub session_id: Option<String>,
    pub structure: StructureReport,
    pub history: HistoryStats,
    pub tracking: TrackingStats,
    /// Length in bytes of the serialized session record.
    pub size_bytes: usize,
    pub status: IntegrityStatus,
}

// ============================================================================
// CHECKS
// ============================================================================

impl StructureReport {
    /// `PASS` when there are no missing references and no orphans. A missing
    /// root or a shared child is reported but does not change the status.
    pub fn status(&self) -> IntegrityStatus {
        if self.missing_references.is_empty() && self.orphans.is_empty() {
            IntegrityStatus::Pass
        } else {
            IntegrityStatus::Warn
        }
    }
}

/// Checks the structure of a single tree.
///
/// # Examples
///
/// ```rust
/// use uix::ast::Tree;
/// use uix::integrity::{check_tree, IntegrityStatus};
/// let report = check_tree(&Tree::initial());
/// assert_eq!(report.node_count, 1);
/// assert_eq!(report.max_depth, 1);
/// assert_eq!(report.status(), IntegrityStatus::Pass);
/// ```
pub fn check_tree(tree: &Tree) -> StructureReport {
    let mut referenced: BTreeSet<&str> = BTreeSet::new();
    let mut missing_references = Vec::new();
    let mut histogram: BTreeMap<&str, usize> = BTreeMap::new();

    for node in tree.nodes.values() {
        *histogram.entry(node.kind.as_str()).or_default() += 1;
        for child in &node.children {
            referenced.insert(child);
            if !tree.contains(child) {
                missing_references.push(MissingReference {
                    parent: node.id.clone(),
                    child: child.clone(),
                });
            }
        }
    }

    let orphans = tree
        .nodes
        .iter()
        .filter(|(id, _)| **id != tree.root_id && !referenced.contains(id.as_str()))
        .map(|(id, node)| Orphan {
            id: id.clone(),
            kind: node.kind.to_string(),
        })
        .collect();

    let shared_children = referenced
        .iter()
        .filter(|id| tree.contains(id))
        .filter_map(|id| {
            let parents = tree.referencing_parents(id);
            (parents.len() > 1).then(|| SharedChild {
                id: id.to_string(),
                parents,
            })
        })
        .collect();

    let mut kind_distribution: Vec<KindCount> = histogram
        .into_iter()
        .map(|(kind, count)| KindCount {
            kind: kind.to_string(),
            count,
        })
        .collect();
    kind_distribution.sort_by(|a, b| b.count.cmp(&a.count));

    let root_present = tree.root().is_some();
    let max_depth = if root_present {
        let mut visited = HashSet::new();
        depth_from(tree, &tree.root_id, 1, &mut visited)
    } else {
        0
    };

    StructureReport {
        node_count: tree.len(),
        root_id: tree.root_id.clone(),
        root_present,
        missing_references,
        orphans,
        shared_children,
        max_depth,
        kind_distribution,
    }
}

// Each node is entered at most once, so cyclic tables terminate.
fn depth_from<'a>(tree: &'a Tree, id: &'a str, depth: usize, visited: &mut HashSet<&'a str>) -> usize {
    if !visited.insert(id) {
        return 0;
    }
    tree.children_of(id)
        .iter()
        .filter(|child| tree.contains(child))
        .map(|child| depth_from(tree, child, depth + 1, visited))
        .fold(depth, usize::max)
}

/// Checks a whole session: its current tree, history and tracking data.
pub fn check(session: &Session) -> IntegrityReport {
    let history = session.history();
    let structure = check_tree(history.current());
    let completed = session
        .work_orders
        .iter()
        .filter(|w| w.status == WorkOrderStatus::Complete)
        .count();
    let size_bytes = serde_json::to_string(&session.to_record())
        .map(|s| s.len())
        .unwrap_or(0);

    IntegrityReport {
        session_id: history.past().front().map(|b| b.id.clone()),
        status: structure.status(),
        structure,
        history: HistoryStats {
            applied: history.past().len(),
            redos_available: history.future().len(),
            replay_consistent: history.is_consistent(),
        },
        tracking: TrackingStats {
            total: session.work_orders.len(),
            completed,
            pending: session.work_orders.len() - completed,
        },
        size_bytes,
    }
}

// ============================================================================
// TEXT RENDERING
// ============================================================================

impl fmt::Display for StructureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Nodes: {}", self.node_count)?;
        if self.root_present {
            writeln!(f, "Root Node: Present ({})", self.root_id)?;
        } else {
            writeln!(f, "[CRITICAL] Root node '{}' is missing!", self.root_id)?;
        }
        for missing in &self.missing_references {
            writeln!(
                f,
                "[ERROR] Node {} references missing child {}",
                missing.parent, missing.child
            )?;
        }
        for orphan in &self.orphans {
            writeln!(f, "[WARN] Orphaned Node detected: {} ({})", orphan.id, orphan.kind)?;
        }
        for shared in &self.shared_children {
            writeln!(
                f,
                "[WARN] Node {} is listed by multiple parents: {}",
                shared.id,
                shared.parents.join(", ")
            )?;
        }
        writeln!(f, "Maximum Nesting Depth: {}", self.max_depth)?;
        writeln!(f, "Missing References: {}", self.missing_references.len())?;
        writeln!(f, "Orphaned Nodes: {}", self.orphans.len())?;
        write!(f, "Integrity Status: {}", self.status())
    }
}

impl fmt::Display for IntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "UIX DIAGNOSTIC REPORT")?;
        writeln!(
            f,
            "Session ID: {}",
            self.session_id.as_deref().unwrap_or("New Session")
        )?;
        writeln!(f, "{}", RULE)?;

        section(f, "Structure Check")?;
        writeln!(f, "{}", self.structure)?;

        section(f, "Component Distribution")?;
        for entry in &self.structure.kind_distribution {
            writeln!(f, "{:<15}: {}", entry.kind, entry.count)?;
        }

        section(f, "Session Stats")?;
        writeln!(f, "Total Patches Applied: {}", self.history.applied)?;
        writeln!(f, "Undos Available: {}", self.history.applied)?;
        writeln!(f, "Redos Available: {}", self.history.redos_available)?;
        writeln!(
            f,
            "Replay Consistent: {}",
            if self.history.replay_consistent { "yes" } else { "no" }
        )?;

        section(f, "Project Tracking")?;
        writeln!(f, "Total Work Orders: {}", self.tracking.total)?;
        writeln!(f, "Completed: {}", self.tracking.completed)?;
        writeln!(f, "Pending: {}", self.tracking.pending)?;

        section(f, "System Resource Est.")?;
        writeln!(f, "State Size: ~{:.2} KB", self.size_bytes as f64 / 1024.0)?;

        writeln!(f)?;
        writeln!(f, "{}", RULE)?;
        write!(f, "End of Report")
    }
}

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "[ {} ]", title.to_uppercase())
}
