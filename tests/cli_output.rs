//! The `hydrate` binary keeps stdout machine-readable

use serde_json::{json, Value};
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn json_file(value: &Value) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, "{value}").unwrap();
    file
}

fn run_hydrate(json_logging: bool) -> std::process::Output {
    let input = json_file(&json!([{"user_id": 1}]));
    let store = json_file(&json!({"users": [{"id": 1, "name": "ada"}]}));

    Command::new(env!("CARGO_BIN_EXE_hydrate"))
        .arg(input.path())
        .arg("--store")
        .arg(store.path())
        .args(["--relation", "user=users", "--spec", "user", "--compact"])
        .env_remove("RUST_LOG")
        .env("HYDRATION_LOGGING__LEVEL", "info")
        .env("HYDRATION_LOGGING__JSON", json_logging.to_string())
        .output()
        .unwrap()
}

#[test]
fn test_json_logging_leaves_stdout_parseable() {
    let output = run_hydrate(true);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stdout, json!([{"user_id": 1, "user": {"id": 1, "name": "ada"}}]));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Hydration finished"));
    for line in stderr.lines().filter(|line| !line.trim().is_empty()) {
        serde_json::from_str::<Value>(line).unwrap();
    }
}

#[test]
fn test_console_logging_leaves_stdout_parseable() {
    let output = run_hydrate(false);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stdout[0]["user"]["name"], "ada");
}
