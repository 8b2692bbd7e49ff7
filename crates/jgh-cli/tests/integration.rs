#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

const CONFIG: &str = "\
jira:
  url: https://acme.atlassian.net
  email: dev@acme.io
  token: secret
  project: PROJ
  issue_type: Task
display_name: Dana
";

fn jgh(config: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("jgh").unwrap();
    cmd.env("JGH_CONFIG", config)
        .env_remove("JGH_REPO")
        .env_remove("RUST_LOG");
    cmd
}

fn configured(dir: &TempDir, extra: &str) -> PathBuf {
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, format!("{CONFIG}{extra}")).unwrap();
    path
}

// ---------------------------------------------------------------------------
// jgh config
// ---------------------------------------------------------------------------

#[test]
fn commands_need_setup_first() {
    let dir = TempDir::new().unwrap();
    jgh(&dir.path().join("missing.yaml"))
        .arg("config")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("run 'jgh setup' first"));
}

#[test]
fn config_masks_token_and_reports_gaps() {
    let dir = TempDir::new().unwrap();
    let path = configured(&dir, "");
    jgh(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("API Token: ******"))
        .stdout(predicate::str::contains("Account ID: Not set"))
        .stdout(predicate::str::contains("Tempo Token: Not set"))
        .stdout(predicate::str::contains("secret").not());
}

#[test]
fn config_json_masks_secrets() {
    let dir = TempDir::new().unwrap();
    let path = configured(&dir, "tempo_token: tempo-secret\n");
    let out = jgh(&path).args(["--json", "config"]).output().unwrap();
    assert!(out.status.success());

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["jira"]["token"], "******");
    assert_eq!(json["tempo_configured"], true);
    assert_eq!(json["warnings"][0]["field"], "account_id");
    assert!(!String::from_utf8_lossy(&out.stdout).contains("tempo-secret"));
}

// ---------------------------------------------------------------------------
// Local failures (no network)
// ---------------------------------------------------------------------------

#[test]
fn list_without_gh_fails_with_install_hint() {
    let dir = TempDir::new().unwrap();
    let path = configured(&dir, "");
    jgh(&path)
        .env("PATH", "")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("https://cli.github.com/"));
}

#[test]
fn update_without_tokens_reports_no_updates() {
    let dir = TempDir::new().unwrap();
    let path = configured(&dir, "");
    jgh(&path)
        .env("PATH", "")
        .args(["update", "proj-1", "just", "words"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No updates specified."));
}

#[test]
fn update_accepts_label_removal_tokens() {
    let dir = TempDir::new().unwrap();
    let path = configured(&dir, "");
    // `-wip` is a token, not a flag; it reaches the gh preflight.
    jgh(&path)
        .env("PATH", "")
        .args(["update", "PROJ-1", "-wip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not installed"));
}

#[test]
fn time_requires_tempo_token() {
    let dir = TempDir::new().unwrap();
    let path = configured(&dir, "");
    jgh(&path)
        .args(["time", "PROJ-1", "1h"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Tempo token not configured"));
}

#[test]
fn time_rejects_bad_duration() {
    let dir = TempDir::new().unwrap();
    let path = configured(&dir, "tempo_token: t\n");
    jgh(&path)
        .args(["time", "PROJ-1", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid duration format 'soon'"));
}

#[test]
fn estimate_rejects_bad_duration() {
    let dir = TempDir::new().unwrap();
    let path = configured(&dir, "");
    jgh(&path)
        .args(["estimate", "PROJ-1", "tomorrow"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid duration format"));
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    jgh(&dir.path().join("unused.yaml"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("estimate"));
}
