//! Interfaces to the external collaborators.
//!
//! The patch oracle turns an instruction plus a flattened tree summary into a
//! [`PatchBatch`]; the verifier judges whether a canonical projection
//! satisfies an instruction. Both are long-latency and fallible, and neither
//! is implemented here. Timeouts, retries and cancellation belong to whoever
//! implements the traits.
//!
//! [`decode_batch`] turns a raw JSON oracle answer into a batch, undoing the
//! encoding quirks such answers carry.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::ast::NodeSummary;
use crate::errors::UixError;
use crate::patch::{fresh_id, PatchBatch};

/// Produces a patch batch for an instruction.
pub trait PatchOracle {
    fn propose(&self, summary: &[NodeSummary], instruction: &str) -> Result<PatchBatch, UixError>;
}

impl<F> PatchOracle for F
where
    F: Fn(&[NodeSummary], &str) -> Result<PatchBatch, UixError>,
{
    fn propose(&self, summary: &[NodeSummary], instruction: &str) -> Result<PatchBatch, UixError> {
        self(summary, instruction)
    }
}

/// Verdict of the verification collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub satisfied: bool,
    pub reason: String,
    #[serde(default, alias = "fixCommand", skip_serializing_if = "Option::is_none")]
    pub fix_instruction: Option<String>,
}

/// Checks a canonical projection against an instruction.
pub trait Verifier {
    fn verify(&self, instruction: &str, projection: &str) -> Result<Verification, UixError>;
}

impl<F> Verifier for F
where
    F: Fn(&str, &str) -> Result<Verification, UixError>,
{
    fn verify(&self, instruction: &str, projection: &str) -> Result<Verification, UixError> {
        self(instruction, projection)
    }
}

/// Decodes a raw oracle answer into a batch.
///
/// Normalisation applied to each op before decoding:
/// - a `props` array of `{name, value}` pairs becomes a mapping;
/// - a `replace` on a `/props` path whose value wraps `{props: ...}` is unwrapped;
/// - an `add` payload without `children` gets an empty list.
///
/// A missing `id`, `author` or `timestamp` is filled in. An answer without
/// an `ops` array counts as no patch at all.
///
/// # Examples
///
/// ```rust
/// use uix::oracle::decode_batch;
/// let batch = decode_batch(r#"{
///     "id": "p1",
///     "description": "label the shell",
///     "ops": [{ "op": "replace", "path": "/nodes/root_shell/props",
///               "value": { "props": [{ "name": "label", "value": "Main" }] } }]
/// }"#).unwrap();
/// assert_eq!(batch.ops.len(), 1);
/// ```
pub fn decode_batch(raw: &str) -> Result<PatchBatch, UixError> {
    let mut value: Value =
        serde_json::from_str(raw).map_err(|source| UixError::OracleResponse { source })?;
    let Value::Object(fields) = &mut value else {
        return Err(UixError::oracle("response is not a JSON object"));
    };
    let Some(Value::Array(ops)) = fields.get_mut("ops") else {
        return Err(UixError::OracleEmpty);
    };
    for op in ops.iter_mut() {
        normalize_op(op);
    }

    if !matches!(fields.get("id"), Some(Value::String(id)) if !id.is_empty()) {
        fields.insert("id".to_string(), json!(fresh_id()));
    }
    if !matches!(fields.get("author"), Some(Value::String(_))) {
        fields.insert("author".to_string(), json!("ai"));
    }
    if !fields.get("timestamp").is_some_and(Value::is_u64) {
        fields.insert("timestamp".to_string(), json!(0));
    }

    serde_json::from_value(value).map_err(|source| UixError::OracleResponse { source })
}

fn normalize_op(op: &mut Value) {
    let Some(fields) = op.as_object_mut() else {
        return;
    };
    let kind = fields.get("op").and_then(Value::as_str).unwrap_or_default().to_string();
    let path = fields.get("path").and_then(Value::as_str).unwrap_or_default().to_string();
    let Some(payload) = fields.get_mut("value") else {
        return;
    };
    let Some(entries) = payload.as_object_mut() else {
        return;
    };

    let flattened: Option<Map<String, Value>> = match entries.get("props") {
        Some(Value::Array(pairs)) => Some(
            pairs
                .iter()
                .filter_map(|pair| {
                    let name = pair.get("name")?.as_str()?;
                    Some((name.to_string(), pair.get("value")?.clone()))
                })
                .collect(),
        ),
        _ => None,
    };
    if let Some(props) = flattened {
        entries.insert("props".to_string(), Value::Object(props));
    }

    let unwrapped = if kind == "replace" && path.ends_with("/props") {
        entries.get("props").cloned()
    } else {
        None
    };
    if let Some(props) = unwrapped {
        *payload = props;
        return;
    }

    if kind == "add" && !entries.contains_key("children") {
        entries.insert("children".to_string(), json!([]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{Author, EditOp};

    #[test]
    fn props_pairs_become_a_mapping() {
        let batch = decode_batch(
            r#"{ "id": "p", "author": "ai", "ops": [
                { "op": "add", "path": "/nodes/root_shell/children/-",
                  "value": { "id": "b", "type": "button",
                             "props": [{ "name": "label", "value": "Save" }] } }
            ] }"#,
        )
        .unwrap();
        let EditOp::Add { value, .. } = &batch.ops[0] else {
            panic!("expected add, got {:?}", batch.ops[0]);
        };
        assert_eq!(value["props"], json!({ "label": "Save" }));
        assert_eq!(value["children"], json!([]));
    }

    #[test]
    fn replace_props_payload_is_unwrapped() {
        let batch = decode_batch(
            r#"{ "ops": [
                { "op": "replace", "path": "/nodes/x/props",
                  "value": { "props": [{ "name": "color", "value": "red" }] } }
            ] }"#,
        )
        .unwrap();
        assert_eq!(
            batch.ops[0],
            EditOp::Replace {
                path: "/nodes/x/props".to_string(),
                value: json!({ "color": "red" })
            }
        );
        assert_eq!(batch.author, Author::Ai);
        assert!(!batch.id.is_empty());
    }

    #[test]
    fn fractional_timestamp_is_reset() {
        let batch = decode_batch(r#"{ "id": "p", "timestamp": 1.5e12, "ops": [] }"#).unwrap();
        assert_eq!(batch.timestamp, 0);
    }

    #[test]
    fn missing_ops_is_an_empty_answer() {
        assert!(matches!(decode_batch(r#"{ "id": "p" }"#), Err(UixError::OracleEmpty)));
        assert!(matches!(
            decode_batch("not json"),
            Err(UixError::OracleResponse { .. })
        ));
        assert!(matches!(decode_batch("[1]"), Err(UixError::Oracle { .. })));
    }

    #[test]
    fn verification_accepts_fix_command_alias() {
        let verdict: Verification = serde_json::from_str(
            r#"{ "satisfied": false, "reason": "no button", "fixCommand": "add a button" }"#,
        )
        .unwrap();
        assert_eq!(verdict.fix_instruction.as_deref(), Some("add a button"));
    }
}
