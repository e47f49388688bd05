// CLI round trips over real session files.
// Requires: assert_cmd, predicates, tempfile in [dev-dependencies]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};
use tempfile::TempDir;

const ADD_BUTTON: &str = r#"{
    "id": "p1",
    "description": "add a save button",
    "ops": [
        { "op": "add", "path": "/nodes/root_shell/children/-",
          "value": { "id": "save", "type": "button",
                     "props": [{ "name": "label", "value": "Save" }] } }
    ]
}"#;

fn uix() -> Command {
    Command::cargo_bin("uix").unwrap()
}

fn new_session(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("session.json");
    uix().arg("new").arg(&path).assert().success();
    path
}

fn write_batch(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("batch.json");
    fs::write(&path, body).unwrap();
    path
}

fn project(session: &Path) -> String {
    let output = uix().arg("project").arg(session).output().unwrap();
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn new_session_projects_initial_tree() {
    let dir = TempDir::new().unwrap();
    let session = new_session(&dir);
    assert_eq!(
        project(&session),
        "<app_shell id=\"root_shell\" label=\"App Shell\" />\n"
    );
    uix()
        .arg("new")
        .arg(&session)
        .assert()
        .failure()
        .stderr(contains("uix::io"));
    uix().arg("new").arg(&session).arg("--force").assert().success();
}

#[test]
fn apply_undo_redo_cycle() {
    let dir = TempDir::new().unwrap();
    let session = new_session(&dir);
    let batch = write_batch(&dir, ADD_BUTTON);

    uix()
        .arg("apply")
        .arg(&session)
        .arg(&batch)
        .assert()
        .success()
        .stdout(contains("Applied p1"));
    let applied = project(&session);
    assert!(applied.contains("<button id=\"save\" label=\"Save\" />"));

    uix()
        .arg("undo")
        .arg(&session)
        .assert()
        .success()
        .stdout(contains("Undone p1"));
    assert!(!project(&session).contains("button"));
    uix()
        .arg("undo")
        .arg(&session)
        .assert()
        .success()
        .stdout(contains("Nothing to undo"));

    uix()
        .arg("redo")
        .arg(&session)
        .assert()
        .success()
        .stdout(contains("Redone p1"));
    assert_eq!(project(&session), applied);
    uix()
        .arg("redo")
        .arg(&session)
        .assert()
        .success()
        .stdout(contains("Nothing to redo"));
}

#[test]
fn output_flag_leaves_input_untouched() {
    let dir = TempDir::new().unwrap();
    let session = new_session(&dir);
    let batch = write_batch(&dir, ADD_BUTTON);
    let out = dir.path().join("next.json");
    let before = fs::read_to_string(&session).unwrap();

    uix()
        .arg("apply")
        .arg(&session)
        .arg(&batch)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&session).unwrap(), before);
    assert!(project(&out).contains("save"));
}

#[test]
fn check_reports_orphans_and_strict_fails() {
    let dir = TempDir::new().unwrap();
    let session = new_session(&dir);
    let batch = write_batch(&dir, ADD_BUTTON);
    uix().arg("apply").arg(&session).arg(&batch).assert().success();

    uix()
        .arg("check")
        .arg(&session)
        .assert()
        .success()
        .stdout(contains("UIX DIAGNOSTIC REPORT").and(contains("Integrity Status: PASS")));

    let remove_parent = write_batch(
        &dir,
        r#"{ "id": "p2", "ops": [
            { "op": "add", "path": "/nodes/save/children/-", "value": { "id": "icon", "type": "text" } },
            { "op": "remove", "path": "/nodes/save" }
        ] }"#,
    );
    uix().arg("apply").arg(&session).arg(&remove_parent).assert().success();

    uix()
        .arg("check")
        .arg(&session)
        .arg("--strict")
        .assert()
        .code(1)
        .stdout(contains("[WARN] Orphaned Node detected: icon (text)"));

    let output = uix().arg("check").arg(&session).arg("--json").output().unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["status"], "WARN");
    assert_eq!(report["structure"]["orphans"][0]["id"], "icon");
    assert_eq!(report["history"]["applied"], 2);
    assert_eq!(report["sessionId"], "p1");
}

#[test]
fn collapse_toggles_and_rejects_unknown_nodes() {
    let dir = TempDir::new().unwrap();
    let session = new_session(&dir);

    uix().arg("collapse").arg(&session).arg("root_shell").assert().success();
    let record: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&session).unwrap()).unwrap();
    assert_eq!(record["ast"]["nodes"]["root_shell"]["isCollapsed"], true);
    assert_eq!(record["history"][0]["author"], "system");

    uix()
        .arg("collapse")
        .arg(&session)
        .arg("root_shell")
        .arg("--expand")
        .assert()
        .success();
    let record: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&session).unwrap()).unwrap();
    assert!(record["ast"]["nodes"]["root_shell"].get("isCollapsed").is_none());

    uix()
        .arg("collapse")
        .arg(&session)
        .arg("ghost")
        .assert()
        .code(1)
        .stderr(contains("No node with id ghost"));
}

#[test]
fn history_diff_and_summary() {
    let dir = TempDir::new().unwrap();
    let session = new_session(&dir);
    uix()
        .arg("diff")
        .arg(&session)
        .assert()
        .success()
        .stdout(contains("(no batches)"));

    let batch = write_batch(&dir, ADD_BUTTON);
    uix().arg("apply").arg(&session).arg(&batch).assert().success();

    uix()
        .arg("history")
        .arg(&session)
        .assert()
        .success()
        .stdout(contains("p1 [ai] add a save button (1 ops)"));
    uix()
        .arg("diff")
        .arg(&session)
        .assert()
        .success()
        .stdout(contains("+  <button id=\"save\" label=\"Save\" />"));

    let output = uix().arg("summary").arg(&session).output().unwrap();
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary.as_array().map(Vec::len), Some(2));
    assert_eq!(summary[1]["id"], "save");
    assert_eq!(summary[1]["parentId"], "root_shell");
    assert_eq!(summary[1]["props"]["label"], "Save");
}

#[test]
fn malformed_inputs_render_miette_diagnostics() {
    let dir = TempDir::new().unwrap();
    let session = new_session(&dir);

    let empty = write_batch(&dir, r#"{ "id": "p1" }"#);
    uix()
        .arg("apply")
        .arg(&session)
        .arg(&empty)
        .assert()
        .failure()
        .stderr(contains("uix::oracle::empty"));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ not json").unwrap();
    uix()
        .arg("project")
        .arg(&broken)
        .assert()
        .failure()
        .stderr(contains("uix::session::decode").or(contains("help:")));

    uix()
        .arg("project")
        .arg(dir.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(contains("uix::io"));
}

#[test]
fn digest_is_stable_across_runs() {
    let dir = TempDir::new().unwrap();
    let session = new_session(&dir);
    let run = || {
        let output = uix().arg("project").arg(&session).arg("--digest").output().unwrap();
        String::from_utf8(output.stdout).unwrap()
    };
    let first = run();
    assert_eq!(first.trim().len(), 64);
    assert_eq!(first, run());
}
