//! Integration tests for the `redfly` CLI binary.
//!
//! Argument parsing, exit codes, and a few end-to-end runs against a
//! wiremock plugin. Every run gets its own config file.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{basic_auth, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `redfly` binary with env isolation.
fn redfly_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("redfly");
    cmd.env("HOME", "/tmp/redfly-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/redfly-cli-test-nonexistent")
        .env_remove("REDFLY_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, port: u16) -> PathBuf {
    let path = dir.join("config.toml");
    let body = format!(
        r#"
[transport]
scheme = "http"
timeout_secs = 5

[plugin_status_polling]
max_retry_attempt = 1
retry_interval_secs = 0
response_timeout_secs = 2

[plugins.GRF]
ip = "127.0.0.1"
port = {port}
username = "admin"
password = "secret"
preferred_auth_type = "XAuthToken"

[plugins.ILO]
ip = "127.0.0.1"
port = {port}
username = "admin"
password = "secret"
preferred_auth_type = "BasicAuth"
"#
    );
    std::fs::write(&path, body).unwrap();
    path
}

/// Run the binary off the async runtime so wiremock keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> assert_cmd::assert::Assert {
    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert_cmd::assert::Assert::new(output)
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = redfly_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = String::from_utf8_lossy(&output.stderr);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    redfly_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("login")
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("contact"))
            .and(predicate::str::contains("device")),
    );
}

#[test]
fn test_config_path_honours_flag() {
    redfly_cmd()
        .args(["--config", "/etc/redfly/custom.toml", "config-path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/etc/redfly/custom.toml"));
}

// ── Error exit codes ────────────────────────────────────────────────

#[test]
fn test_unknown_plugin_exits_general() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), 1);
    redfly_cmd()
        .arg("--config")
        .arg(&config)
        .args(["status", "NOPE"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_broken_config_exits_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[plugins.GRF]\nip = \"h\"\n").unwrap();
    redfly_cmd()
        .arg("--config")
        .arg(&config)
        .args(["login", "GRF"])
        .assert()
        .code(2);
}

// ── Against a plugin ────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_login_and_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ODIM/v1/Sessions"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-Auth-Token", "tok-1")
                .set_body_json(json!({})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ODIM/v1/Status"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), server.address().port());

    let mut login = redfly_cmd();
    login.arg("--config").arg(&config).args(["login", "GRF"]);
    run(login)
        .await
        .success()
        .stdout(predicate::str::contains("Session created").and(predicate::str::contains("tok-1").not()));

    let mut status = redfly_cmd();
    status.arg("--config").arg(&config).args(["status", "GRF"]);
    run(status).await.success().stdout(predicate::str::contains("GRF: alive"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_rejected_exits_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ODIM/v1/Sessions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), server.address().port());

    let mut cmd = redfly_cmd();
    cmd.arg("--config").arg(&config).args(["login", "GRF"]);
    run(cmd)
        .await
        .code(3)
        .stderr(predicate::str::contains("unable to create session with plugin GRF"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_contact_prints_translated_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ODIM/v1/Systems"))
        .and(basic_auth("admin", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@odata.id": "/ODIM/v1/Systems"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), server.address().port());

    let mut cmd = redfly_cmd();
    cmd.arg("--config")
        .arg(&config)
        .args(["contact", "ILO", "/redfish/v1/Systems"]);
    run(cmd)
        .await
        .success()
        .stdout(predicate::str::contains("\"/redfish/v1/Systems\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_contact_rejection_exits_plugin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ODIM/v1/Chassis/9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "gone" })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), server.address().port());

    let mut cmd = redfly_cmd();
    cmd.arg("--config")
        .arg(&config)
        .args(["contact", "ILO", "/redfish/v1/Chassis/9"]);
    run(cmd)
        .await
        .code(4)
        .stderr(predicate::str::contains("error while contacting plugin ILO"));
}
