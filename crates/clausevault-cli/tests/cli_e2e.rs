#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cvault_cmd(data: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("cvault"));
    cmd.env("CLAUSEVAULT_DATA", data.path().as_os_str())
        .env_remove("RUST_LOG");
    cmd
}

fn provision(data: &TempDir, backend: &str) {
    cvault_cmd(data)
        .args(["--backend", backend, "tenant", "add", "T1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added tenant T1"));

    cvault_cmd(data)
        .args(["--backend", backend, "library", "add", "L1", "--tenant", "T1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added library L1"));

    cvault_cmd(data)
        .args([
            "--backend", backend, "user", "add", "U1", "--tenant", "T1", "--library", "L1",
            "--token", "refresh-1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added user U1"));
}

#[test]
fn test_file_backend_provision_and_show() {
    let data = TempDir::new().unwrap();
    provision(&data, "file");

    cvault_cmd(&data)
        .args(["user", "show", "U1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tenant T1\n"))
        .stdout(predicate::str::contains("default library L1\n"))
        .stdout(predicate::str::contains("refresh-1").not());

    cvault_cmd(&data)
        .args(["tenant", "show", "T1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("library L1"));

    let doc = fs::read_to_string(data.path().join("App_Data").join("LoginSettings.json")).unwrap();
    assert!(doc.contains("\"RefreshToken\": \"refresh-1\""));
}

#[test]
fn test_sqlite_backend_provision_and_show() {
    let data = TempDir::new().unwrap();
    provision(&data, "sqlite");

    assert!(data.path().join("App_Data").join("LoginSettings.db").exists());

    cvault_cmd(&data)
        .args(["--backend", "sqlite", "user", "show", "U1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default library L1\n"));
}

#[test]
fn test_backend_from_config_file() {
    let data = TempDir::new().unwrap();
    fs::write(data.path().join("clausevault.toml"), "backend = \"sqlite\"\n").unwrap();

    cvault_cmd(&data).args(["tenant", "add", "T1"]).assert().success();

    assert!(data.path().join("App_Data").join("LoginSettings.db").exists());
    assert!(!data.path().join("App_Data").join("LoginSettings.json").exists());
}

#[test]
fn test_sqlite_rejects_dangling_user() {
    let data = TempDir::new().unwrap();

    cvault_cmd(&data)
        .args(["--backend", "sqlite", "user", "add", "U1", "--tenant", "T404"])
        .assert()
        .failure();

    cvault_cmd(&data)
        .args(["--backend", "sqlite", "user", "show", "U1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("user U1 not found"));
}

#[test]
fn test_rm_user_keeps_others() {
    let data = TempDir::new().unwrap();
    provision(&data, "file");

    cvault_cmd(&data)
        .args(["user", "add", "U2", "--tenant", "T1"])
        .assert()
        .success();

    cvault_cmd(&data)
        .args(["user", "rm", "U1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed user U1"));

    cvault_cmd(&data).args(["user", "show", "U1"]).assert().failure();
    cvault_cmd(&data).args(["user", "show", "U2"]).assert().success();
}

#[test]
fn test_rm_unknown_fails() {
    let data = TempDir::new().unwrap();

    cvault_cmd(&data)
        .args(["tenant", "rm", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tenant nope not found"));
}

#[test]
fn test_duplicate_add_fails() {
    let data = TempDir::new().unwrap();
    cvault_cmd(&data).args(["tenant", "add", "T1"]).assert().success();

    cvault_cmd(&data)
        .args(["tenant", "add", "T1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_classify_without_data_dir() {
    let data = TempDir::new().unwrap();

    cvault_cmd(&data)
        .args(["classify", "404"])
        .assert()
        .success()
        .stdout("not found: (404) NotFound\n");

    cvault_cmd(&data)
        .args(["classify", "401"])
        .assert()
        .success()
        .stdout("unauthorized: (401) Unauthorized\n");

    cvault_cmd(&data)
        .args(["classify", "503", "--reason", "maintenance"])
        .assert()
        .success()
        .stdout("maintenance: (503) ServiceUnavailable\n");

    assert!(!data.path().join("App_Data").exists());
}

#[test]
fn test_classify_log_appends_to_daily_log() {
    let data = TempDir::new().unwrap();

    cvault_cmd(&data)
        .args(["classify", "500", "--log"])
        .assert()
        .success()
        .stdout("internal error: (500) InternalServerError\n");

    let logs: Vec<_> = fs::read_dir(data.path().join("App_Data").join("Logs"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(logs.len(), 1);

    let name = logs[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("Log_") && name.ends_with(".txt"));

    let content = fs::read_to_string(&logs[0]).unwrap();
    assert!(content.contains("internal error: (500) InternalServerError"));
}
