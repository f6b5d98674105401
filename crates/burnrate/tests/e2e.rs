// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the `burnrate` binary.
//!
//! Each test writes an isolated config file and runs the compiled binary
//! with a scrubbed environment, so none of them can reach AWS.

use std::path::Path;
use std::process::{Command, Output};

fn burnrate(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_burnrate"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("AWS_BEARER_TOKEN_BEDROCK")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", config.parent().unwrap_or(Path::new("/nonexistent")))
        .output()
        .expect("failed to spawn burnrate")
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("burnrate.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
#[serial_test::serial]
fn config_command_prints_merged_config_with_key_redacted() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
[bedrock]
model_id = "amazon.nova-lite-v1:0"
api_key = "ABSK-very-secret"

[budget]
target_usd = 15.0
"#,
    );

    let output = burnrate(&path, &["config"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("amazon.nova-lite-v1:0"));
    assert!(stdout.contains("target_usd = 15.0"));
    assert!(!stdout.contains("ABSK-very-secret"));
}

#[test]
#[serial_test::serial]
fn unknown_config_key_exits_with_setup_code() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[budget]\ntarget_usdd = 5.0\n");

    let output = burnrate(&path, &["config"]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
#[serial_test::serial]
fn invalid_run_flag_value_exits_with_setup_code() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[bedrock]\napi_key = \"x\"\n");

    let output = burnrate(&path, &["run", "--stop-ratio", "1.5"]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
#[serial_test::serial]
fn run_without_api_key_exits_with_setup_code() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[budget]\ntarget_usd = 1.0\n");

    let output = burnrate(&path, &["run"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("AWS_BEARER_TOKEN_BEDROCK"));
}

#[test]
#[serial_test::serial]
fn check_fails_without_api_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[budget]\ntarget_usd = 1.0\n");

    let output = burnrate(&path, &["check", "--plain"]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[FAIL]"));
    assert!(stdout.contains("API key"));
}

#[test]
#[serial_test::serial]
fn check_passes_with_key_and_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("spend.json");
    let path = write_config(
        dir.path(),
        &format!(
            "[bedrock]\napi_key = \"x\"\n\n[budget]\ntarget_usd = 100.0\nstop_ratio = 0.9\nstate_file = {:?}\n",
            state.display().to_string()
        ),
    );

    let output = burnrate(&path, &["check", "--plain"]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("[FAIL]"));
    assert!(stdout.contains("will be created"));
}
