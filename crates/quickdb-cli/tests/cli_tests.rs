//! End-to-end tests for the qdb binary

use serde_json::{json, Value as JsonValue};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn qdb(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_qdb"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run qdb")
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn stdout_json(output: &Output) -> JsonValue {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn user_model(dir: &Path, alias: &str) -> PathBuf {
    let model = json!({
        "collection_name": "users",
        "database_alias": alias,
        "fields": {
            "name": {"field_type": {"String": {"max_length": 10, "min_length": null, "regex": null}}, "required": true},
            "age": {"field_type": {"Integer": {"min_value": 0, "max_value": null}}},
            "tags": {"field_type": {"Array": {"item_type": {"Integer": {"min_value": null, "max_value": null}}, "max_items": null, "min_items": null}}}
        },
        "indexes": [{"fields": ["name"], "unique": true, "name": "idx_name"}],
        "description": "User model"
    });
    write(dir, &format!("users_{}.json", alias), &model.to_string())
}

#[test]
fn test_encode_record() {
    let dir = TempDir::new().unwrap();
    let model = user_model(dir.path(), "default");
    let data = write(dir.path(), "data.json", r#"{"name": "alice", "age": 30, "tags": ["a", "b"]}"#);

    let output = qdb(&["encode", "--model", model.to_str().unwrap(), "--data", data.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_json(&output),
        json!({
            "name": {"String": "alice"},
            "age": {"Int": 30},
            "tags": {"Array": [{"String": "a"}, {"String": "b"}]}
        })
    );
}

#[test]
fn test_encode_declared_items_rejects_mismatched_element() {
    let dir = TempDir::new().unwrap();
    let model = user_model(dir.path(), "default");
    let data = write(dir.path(), "data.json", r#"{"name": "alice", "tags": [1, "b"]}"#);

    let output = qdb(&[
        "encode",
        "--model",
        model.to_str().unwrap(),
        "--data",
        data.to_str().unwrap(),
        "--declared-items",
    ]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("tags[1]"));
}

#[test]
fn test_encode_validate_flags_bounds() {
    let dir = TempDir::new().unwrap();
    let model = user_model(dir.path(), "default");
    let data = write(dir.path(), "data.json", r#"{"name": "a-very-long-name"}"#);

    let output = qdb(&[
        "encode",
        "--model",
        model.to_str().unwrap(),
        "--data",
        data.to_str().unwrap(),
        "--validate",
    ]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_decode_file() {
    let dir = TempDir::new().unwrap();
    let input = write(
        dir.path(),
        "tagged.json",
        r#"[{"Object": {"id": {"Int": 1}, "when": {"DateTime": "2025-10-22T08:30:00Z"}}}, {"Unknown": 1}]"#,
    );

    let output = qdb(&["decode", input.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        json!([{"id": 1, "when": "2025-10-22T08:30:00Z"}, {"Unknown": 1}])
    );
}

#[test]
fn test_register_models() {
    let dir = TempDir::new().unwrap();
    let model = user_model(dir.path(), "main");
    let config = write(
        dir.path(),
        "app.yaml",
        "default_alias: main\ndatabases:\n  - alias: main\n    backend:\n      type: sqlite\n      path: ./app.db\n",
    );

    let output = qdb(&["register", "--config", config.to_str().unwrap(), "--model", model.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_json(&output),
        json!({"registered": [{"model": "users", "alias": "main", "fields": 3, "indexes": 1}]})
    );
}

#[test]
fn test_register_on_unconfigured_alias_exits_one() {
    let dir = TempDir::new().unwrap();
    let model = user_model(dir.path(), "missing");
    let config = write(
        dir.path(),
        "app.json",
        r#"{"databases": [{"alias": "main", "backend": {"type": "sqlite", "path": "app.db"}}]}"#,
    );

    let output = qdb(&["register", "--config", config.to_str().unwrap(), "--model", model.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Fatal"));
}
