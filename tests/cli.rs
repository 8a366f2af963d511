//! End-to-end tests driving the `toolz` binary against a temporary database.

use assert_cmd::Command;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

const PROJECT: &str = "/tmp/toolz-cli-test-project";

fn toolz(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("toolz").expect("toolz binary");
    // Quiet keeps log lines off stderr; JSON errors are still reported there.
    cmd.arg("--db").arg(db).arg("--json").arg("--quiet");
    for backend_var in [
        "OPENAI_API_KEY",
        "ANTHROPIC_API_KEY",
        "GOOGLE_API_KEY",
        "DEEPSEEK_API_KEY",
        "MCP_TOOLZ_DB",
        "RUST_LOG",
    ] {
        cmd.env_remove(backend_var);
    }
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

fn stderr_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stderr).expect("stderr is JSON")
}

#[test]
fn version_reports_package_version() {
    let temp = TempDir::new().unwrap();
    let output = toolz(&temp.path().join("t.db"))
        .arg("version")
        .assert()
        .success()
        .get_output()
        .clone();

    let json = stdout_json(&output);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["schema_version"], 1);
}

#[test]
fn context_save_get_list_round_trip() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("nested").join("contexts.db");

    let output = toolz(&db)
        .args([
            "context", "save", "Index error in loop",
            "--type", "error",
            "--error", "IndexError: list index out of range",
            "--tags", "python,bug",
            "--meta", "attempts=2",
            "--project", PROJECT,
            "--id", "c1",
        ])
        .assert()
        .success()
        .get_output()
        .clone();
    assert_eq!(stdout_json(&output)["id"], "c1");
    assert!(db.exists(), "parent directories are created");

    let output = toolz(&db)
        .args(["context", "get", "c1"])
        .assert()
        .success()
        .get_output()
        .clone();
    let entry = stdout_json(&output);
    assert_eq!(entry["type"], "error");
    assert_eq!(entry["title"], "Index error in loop");
    assert_eq!(entry["tags"], serde_json::json!(["python", "bug"]));
    assert_eq!(entry["metadata"]["attempts"], 2);
    assert_eq!(
        entry["content"]["errors"],
        "IndexError: list index out of range"
    );
    assert!(entry["claude_response"].is_null());

    let output = toolz(&db)
        .args(["context", "list", "--project", PROJECT])
        .assert()
        .success()
        .get_output()
        .clone();
    let list = stdout_json(&output);
    assert_eq!(list["count"], 1);
    assert_eq!(list["contexts"][0]["id"], "c1");

    let output = toolz(&db)
        .args(["context", "tags", "py"])
        .assert()
        .success()
        .get_output()
        .clone();
    assert_eq!(stdout_json(&output)["count"], 1);
}

#[test]
fn context_save_requires_content() {
    let temp = TempDir::new().unwrap();
    let output = toolz(&temp.path().join("t.db"))
        .args(["context", "save", "Nothing here", "--project", PROJECT])
        .assert()
        .code(4)
        .get_output()
        .clone();
    assert_eq!(stderr_json(&output)["error"]["code"], "INVALID_ARGUMENT");
}

#[test]
fn missing_context_exits_not_found() {
    let temp = TempDir::new().unwrap();
    let output = toolz(&temp.path().join("t.db"))
        .args(["context", "get", "nope"])
        .assert()
        .code(3)
        .get_output()
        .clone();

    let err = stderr_json(&output);
    assert_eq!(err["error"]["code"], "CONTEXT_NOT_FOUND");
    assert_eq!(err["error"]["retryable"], false);
    assert!(err["error"]["hint"].as_str().unwrap().contains("toolz context list"));
}

#[test]
fn active_todo_snapshot_moves_to_latest_save() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("t.db");

    for (id, todo) in [("s1", "done:Write parser"), ("s2", "wip:Write tests")] {
        toolz(&db)
            .args([
                "todo", "save", todo, "--active", "--branch", "main", "--project", PROJECT,
                "--id", id,
            ])
            .assert()
            .success();
    }

    let output = toolz(&db)
        .args(["todo", "active", "--project", PROJECT])
        .assert()
        .success()
        .get_output()
        .clone();
    let active = stdout_json(&output);
    assert_eq!(active["id"], "s2");
    assert_eq!(active["todos"][0]["status"], "in_progress");

    let output = toolz(&db)
        .args(["todo", "get", "s1"])
        .assert()
        .success()
        .get_output()
        .clone();
    assert_eq!(stdout_json(&output)["is_active"], false);

    let output = toolz(&db)
        .args(["todo", "list", "--project", PROJECT])
        .assert()
        .success()
        .get_output()
        .clone();
    assert_eq!(stdout_json(&output)["count"], 2);
}

#[test]
fn no_active_snapshot_exits_not_found() {
    let temp = TempDir::new().unwrap();
    let output = toolz(&temp.path().join("t.db"))
        .args(["todo", "active", "--project", PROJECT])
        .assert()
        .code(3)
        .get_output()
        .clone();
    assert_eq!(stderr_json(&output)["error"]["code"], "NO_ACTIVE_SNAPSHOT");
}

#[test]
fn ask_without_credentials_exits_config_error() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("t.db");

    toolz(&db)
        .args([
            "context", "save", "Parser", "--type", "code", "--message", "Is this right?",
            "--project", PROJECT, "--id", "c1",
        ])
        .assert()
        .success();

    let output = toolz(&db)
        .args(["ask", "c1", "--backend", "deepseek"])
        .assert()
        .code(7)
        .get_output()
        .clone();
    let err = stderr_json(&output);
    assert_eq!(err["error"]["code"], "MISSING_CREDENTIAL");
    assert!(err["error"]["message"].as_str().unwrap().contains("DEEPSEEK_API_KEY"));

    // Nothing was stored for any backend.
    let output = toolz(&db)
        .args(["context", "get", "c1"])
        .assert()
        .success()
        .get_output()
        .clone();
    assert!(stdout_json(&output)["deepseek_response"].is_null());
}

#[test]
fn ask_unknown_context_fails_before_backend() {
    let temp = TempDir::new().unwrap();
    toolz(&temp.path().join("t.db"))
        .args(["ask", "missing", "--backend", "claude", "--api-key", "unused"])
        .assert()
        .code(3);
}

#[test]
fn completions_generate_for_bash() {
    let temp = TempDir::new().unwrap();
    let output = toolz(&temp.path().join("t.db"))
        .args(["completions", "bash"])
        .assert()
        .success()
        .get_output()
        .clone();
    assert!(String::from_utf8_lossy(&output.stdout).contains("toolz"));
}
