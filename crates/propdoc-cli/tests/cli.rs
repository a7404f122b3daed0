use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn propdoc() -> Command {
    let mut cmd = Command::cargo_bin("propdoc").unwrap();
    cmd.env_remove("DATABASE_URL");
    cmd
}

#[test]
fn test_help_lists_commands() {
    propdoc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("classify"))
        .stdout(predicate::str::contains("extract"));
}

#[test]
fn test_config_path_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    propdoc()
        .args(["-c", path.to_str().unwrap(), "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));
}

#[test]
fn test_config_set_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let path = path.to_str().unwrap();

    propdoc()
        .args(["-c", path, "config", "set", "reasoning.model", "gpt-4o"])
        .assert()
        .success();

    propdoc()
        .args(["-c", path, "config", "get", "reasoning.model"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"gpt-4o\""));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    propdoc()
        .args(["-c", path.to_str().unwrap(), "config", "set", "reasoning.colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn test_extract_rejects_unsupported_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    fs::write(&input, "plain text").unwrap();

    propdoc()
        .args(["extract", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not read document"))
        .stderr(predicate::str::contains("unsupported file format"));
}

#[test]
fn test_extract_missing_input() {
    propdoc()
        .args(["extract", "/nonexistent/lease.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_ingest_rejects_unknown_type() {
    propdoc()
        .args(["ingest", "lease.pdf", "--type", "receipt", "--owner", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown document type"));
}

#[test]
fn test_models_status_lists_primary_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let models = dir.path().join("models");
    fs::write(
        &path,
        format!(r#"{{"ocr": {{"model_dir": {:?}}}}}"#, models.to_str().unwrap()),
    )
    .unwrap();

    propdoc()
        .args(["-c", path.to_str().unwrap(), "models", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("primary"))
        .stdout(predicate::str::contains("incomplete"))
        .stdout(predicate::str::contains("det.onnx"));
}
