//! Session state container
//!
//! A [`Session`] bundles the edit history with the auxiliary records kept
//! alongside it (work orders, diagnostic reports, the current selection).
//! All transitions go through [`Session::reduce`], a pure function from
//! `(state, action)` to the next state. Callers that need change
//! notification wrap it themselves.
//!
//! The persisted layout is [`SessionRecord`]. Loading is lenient: absent or
//! `null` collections load as empty, and a record without a tree has its tree
//! rebuilt by replaying the recorded batches.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use crate::ast::{NodeId, Tree};
use crate::errors::UixError;
use crate::history::History;
use crate::integrity;
use crate::oracle::{PatchOracle, Verification, Verifier};
use crate::patch::{fresh_id, now_millis, Author, EditOp, PatchBatch};
use crate::projection::project;

const TITLE_LIMIT: usize = 40;

// ============================================================================
// AUXILIARY RECORDS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkOrderStatus {
    #[default]
    Triage,
    InProgress,
    Review,
    Complete,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Tracking entry for one instruction sent to the oracle.
///
/// Every field has a default so that partially saved orders still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    #[serde(default = "fresh_order_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: WorkOrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub created_at: u64,
}

impl WorkOrder {
    /// An in-progress, medium-priority order titled after `instruction`.
    pub fn for_instruction(instruction: &str) -> Self {
        Self {
            id: fresh_order_id(),
            title: short_title(instruction),
            description: instruction.to_string(),
            status: WorkOrderStatus::InProgress,
            assigned_to: None,
            priority: Priority::Medium,
            created_at: now_millis(),
        }
    }
}

fn fresh_order_id() -> String {
    format!("wo-{}", fresh_id())
}

fn fresh_report_id() -> String {
    format!("rep-{}", fresh_id())
}

/// Partial update merged into an existing work order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkOrderUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkOrderStatus>,
    pub assigned_to: Option<String>,
    pub priority: Option<Priority>,
}

impl WorkOrderUpdate {
    pub fn status(status: WorkOrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    fn merge_into(&self, order: &mut WorkOrder) {
        if let Some(title) = &self.title {
            order.title = title.clone();
        }
        if let Some(description) = &self.description {
            order.description = description.clone();
        }
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(assignee) = &self.assigned_to {
            order.assigned_to = Some(assignee.clone());
        }
        if let Some(priority) = self.priority {
            order.priority = priority;
        }
    }
}

/// A stored diagnostic run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default = "fresh_report_id")]
    pub id: String,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

// ============================================================================
// PERSISTED LAYOUT
// ============================================================================

/// On-disk shape of a session. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ast: Option<Tree>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub history: Vec<PatchBatch>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub future: Vec<PatchBatch>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub work_orders: Vec<WorkOrder>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reports: Vec<Report>,
    #[serde(default)]
    pub selection: Option<NodeId>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// SESSION
// ============================================================================

/// Every state transition a session accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ApplyBatch(PatchBatch),
    Undo,
    Redo,
    Select(Option<NodeId>),
    AddWorkOrder(WorkOrder),
    UpdateWorkOrder { id: String, update: WorkOrderUpdate },
    AddReport(Report),
    DeleteReport(String),
    Load(SessionRecord),
    Reset,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::ApplyBatch(_) => "apply-batch",
            Action::Undo => "undo",
            Action::Redo => "redo",
            Action::Select(_) => "select",
            Action::AddWorkOrder(_) => "add-work-order",
            Action::UpdateWorkOrder { .. } => "update-work-order",
            Action::AddReport(_) => "add-report",
            Action::DeleteReport(_) => "delete-report",
            Action::Load(_) => "load",
            Action::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    history: History,
    /// Newest first.
    pub work_orders: Vec<WorkOrder>,
    /// Newest first.
    pub reports: Vec<Report>,
    pub selection: Option<NodeId>,
}

/// Result of [`Session::execute`]: the next session plus the id of the applied
/// batch, or the failure that prevented it.
#[derive(Debug)]
pub struct CommandOutcome {
    pub session: Session,
    pub result: Result<String, UixError>,
}

impl Session {
    /// A fresh session rooted at `initial`.
    pub fn new(initial: Tree) -> Self {
        Self {
            history: History::new(initial),
            work_orders: Vec::new(),
            reports: Vec::new(),
            selection: None,
        }
    }

    /// Rebuilds a session from its persisted record over the canonical initial tree.
    pub fn from_record(record: SessionRecord) -> Self {
        Self::restore(Tree::initial(), record)
    }

    /// Rebuilds a session from `record`, replaying from `initial` when the
    /// record carries no tree.
    pub fn restore(initial: Tree, record: SessionRecord) -> Self {
        let current = match record.ast {
            Some(tree) => tree,
            None => {
                debug!(batches = record.history.len(), "session has no tree, replaying history");
                History::replay(&initial, &record.history)
            }
        };
        Self {
            history: History::from_parts(
                initial,
                current,
                record.history.into_iter().collect(),
                record.future.into_iter().collect(),
            ),
            work_orders: record.work_orders,
            reports: record.reports,
            selection: record.selection,
        }
    }

    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            ast: Some(self.history.current().clone()),
            history: self.history.past().iter().cloned().collect(),
            future: self.history.future().iter().cloned().collect(),
            work_orders: self.work_orders.clone(),
            reports: self.reports.clone(),
            selection: self.selection.clone(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, UixError> {
        let record: SessionRecord =
            serde_json::from_str(raw).map_err(|source| UixError::Session { source })?;
        Ok(Self::from_record(record))
    }

    pub fn to_json(&self) -> Result<String, UixError> {
        serde_json::to_string_pretty(&self.to_record()).map_err(|source| UixError::Encode { source })
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn tree(&self) -> &Tree {
        self.history.current()
    }

    /// The single transition function.
    pub fn reduce(&self, action: Action) -> Session {
        debug!(action = action.name(), "reduce");
        match action {
            Action::ApplyBatch(batch) => self.with_history(self.history.apply_batch(batch)),
            Action::Undo => self.with_history(self.history.undo()),
            Action::Redo => self.with_history(self.history.redo()),
            Action::Select(selection) => Session {
                selection,
                ..self.clone()
            },
            Action::AddWorkOrder(order) => {
                let mut next = self.clone();
                next.work_orders.insert(0, order);
                next
            }
            Action::UpdateWorkOrder { id, update } => {
                let mut next = self.clone();
                for order in next.work_orders.iter_mut().filter(|o| o.id == id) {
                    update.merge_into(order);
                }
                next
            }
            Action::AddReport(report) => {
                let mut next = self.clone();
                next.reports.insert(0, report);
                next
            }
            Action::DeleteReport(id) => {
                let mut next = self.clone();
                next.reports.retain(|r| r.id != id);
                next
            }
            Action::Load(record) => Session::restore(self.history.initial().clone(), record),
            Action::Reset => Session::new(self.history.initial().clone()),
        }
    }

    fn with_history(&self, history: History) -> Session {
        Session {
            history,
            ..self.clone()
        }
    }

    pub fn apply_batch(&self, batch: PatchBatch) -> Session {
        self.reduce(Action::ApplyBatch(batch))
    }

    pub fn undo(&self) -> Session {
        self.reduce(Action::Undo)
    }

    pub fn redo(&self) -> Session {
        self.reduce(Action::Redo)
    }

    /// A `system` batch that sets the collapsed flag of `node_id`, or flips
    /// it when `collapsed` is `None`. `None` if the node does not exist.
    pub fn collapse_batch(&self, node_id: &str, collapsed: Option<bool>) -> Option<PatchBatch> {
        let node = self.tree().get(node_id)?;
        let flag = collapsed.unwrap_or(!node.collapsed);
        Some(PatchBatch::system(
            "Toggle Collapse",
            vec![EditOp::set_collapsed(node_id, flag)],
        ))
    }

    /// Flips the collapsed flag of `node_id` as a recorded batch.
    pub fn toggle_collapse(&self, node_id: &str) -> Session {
        match self.collapse_batch(node_id, None) {
            Some(batch) => self.apply_batch(batch),
            None => self.clone(),
        }
    }

    /// Runs the integrity checker and stores the result as a new report.
    pub fn diagnose(&self) -> Session {
        let content = integrity::check(self).to_string();
        let report = Report {
            id: fresh_report_id(),
            timestamp: now_millis(),
            title: format!("Diagnostic Run #{}", self.reports.len() + 1),
            content,
        };
        self.reduce(Action::AddReport(report))
    }

    /// Asks `oracle` for a batch implementing `instruction` and applies it.
    ///
    /// The batch is stamped with `author` and the current time. Unless the
    /// author is `system`, the instruction is tracked as a work order that
    /// ends up `complete` or, on failure, `review`. A failed oracle call
    /// leaves the tree and history exactly as they were.
    pub fn execute(&self, oracle: &dyn PatchOracle, instruction: &str, author: Author) -> CommandOutcome {
        let mut session = self.clone();
        let order_id = if author == Author::System {
            None
        } else {
            let order = WorkOrder::for_instruction(instruction);
            let id = order.id.clone();
            session = session.reduce(Action::AddWorkOrder(order));
            Some(id)
        };

        match oracle.propose(&session.tree().summary(), instruction) {
            Ok(mut batch) => {
                batch.author = author;
                batch.timestamp = now_millis();
                let batch_id = batch.id.clone();
                info!(batch = %batch_id, ops = batch.ops.len(), "oracle batch accepted");
                session = session.apply_batch(batch);
                if let Some(id) = order_id {
                    session = session.reduce(Action::UpdateWorkOrder {
                        id,
                        update: WorkOrderUpdate::status(WorkOrderStatus::Complete),
                    });
                }
                CommandOutcome {
                    session,
                    result: Ok(batch_id),
                }
            }
            Err(err) => {
                warn!(error = %err, "oracle call failed");
                if let Some(id) = order_id {
                    let description = match err {
                        UixError::OracleEmpty => "Oracle failed to generate a valid patch.",
                        _ => "System error during generation.",
                    };
                    session = session.reduce(Action::UpdateWorkOrder {
                        id,
                        update: WorkOrderUpdate {
                            status: Some(WorkOrderStatus::Review),
                            description: Some(description.to_string()),
                            ..WorkOrderUpdate::default()
                        },
                    });
                }
                CommandOutcome {
                    session,
                    result: Err(err),
                }
            }
        }
    }

    /// Asks `verifier` whether the current projection satisfies `instruction`.
    pub fn verify_with(&self, verifier: &dyn Verifier, instruction: &str) -> Result<Verification, UixError> {
        verifier.verify(instruction, &project(self.tree()))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Tree::initial())
    }
}

fn short_title(instruction: &str) -> String {
    if instruction.chars().count() > TITLE_LIMIT {
        let head: String = instruction.chars().take(TITLE_LIMIT).collect();
        format!("{}...", head)
    } else {
        instruction.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;

    #[test]
    fn titles_truncate_on_char_boundaries() {
        assert_eq!(short_title("short"), "short");
        let long = "é".repeat(45);
        let title = short_title(&long);
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), 43);
    }

    #[test]
    fn work_order_updates_merge_only_given_fields() {
        let order = WorkOrder::for_instruction("add a header");
        let id = order.id.clone();
        let session = Session::default()
            .reduce(Action::AddWorkOrder(order))
            .reduce(Action::UpdateWorkOrder {
                id,
                update: WorkOrderUpdate::status(WorkOrderStatus::Complete),
            });
        let order = &session.work_orders[0];
        assert_eq!(order.status, WorkOrderStatus::Complete);
        assert_eq!(order.description, "add a header");
        assert_eq!(order.priority, Priority::Medium);
    }

    #[test]
    fn reports_are_added_newest_first_and_deleted_by_id() {
        let session = Session::default().diagnose().diagnose();
        assert_eq!(session.reports[0].title, "Diagnostic Run #2");
        assert_eq!(session.reports[1].title, "Diagnostic Run #1");
        let id = session.reports[0].id.clone();
        let session = session.reduce(Action::DeleteReport(id));
        assert_eq!(session.reports.len(), 1);
    }

    #[test]
    fn toggle_collapse_records_a_system_batch() {
        let session = Session::default().toggle_collapse("root_shell");
        assert!(session.tree().root().unwrap().collapsed);
        let batch = &session.history().past()[0];
        assert_eq!(batch.author, Author::System);
        assert_eq!(batch.description, "Toggle Collapse");
        let session = session.toggle_collapse("root_shell");
        assert!(!session.tree().root().unwrap().collapsed);
        assert_eq!(session.toggle_collapse("ghost"), session);
    }

    #[test]
    fn reset_keeps_initial_tree_and_drops_everything_else() {
        let initial = Tree::with_root(Node::new("R", "shell"));
        let session = Session::new(initial.clone())
            .reduce(Action::Select(Some("R".to_string())))
            .toggle_collapse("R")
            .reduce(Action::Reset);
        assert_eq!(session, Session::new(initial));
    }

    #[test]
    fn record_round_trip_preserves_state() {
        let session = Session::default()
            .toggle_collapse("root_shell")
            .undo()
            .diagnose();
        let restored = Session::from_json(&session.to_json().unwrap()).unwrap();
        assert_eq!(restored, session);
    }
}
