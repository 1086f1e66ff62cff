//! End-to-end tests against the real binary over stdio.
//!
//! `cat` stands in for the MCP server: allowed traffic is echoed back
//! verbatim, so anything the proxy forwards shows up on stdout, and
//! response-shaped lines pushed through the loop exercise the outbound
//! engine against a live child process.

use assert_cmd::Command;
use std::io::Write;

fn write_test_config(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let config = format!(
        r#"
version: 1
settings:
  log_dir: {}
  log_level: debug
  default_action: allow
  outbound_default_action: allow
rules:
  - name: block-ssh-keys
    match:
      method: tools/call
      tool: "*"
      arguments:
        _any_value:
          regex: "(\\.ssh/|id_rsa|id_ed25519)"
    action: deny
    message: "Blocked: access to SSH keys"
outbound_rules:
  - name: redact-secrets
    match:
      secrets: true
    action: redact
"#,
        dir.path().join("logs").display()
    );

    let path = dir.path().join("config.yml");
    let mut file = std::fs::File::create(&path).expect("create config");
    file.write_all(config.as_bytes()).expect("write config");
    path
}

fn warden() -> (Command, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_test_config(&dir);
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mcp-warden"));
    cmd.arg("-c").arg(config).arg("--").arg("cat");
    (cmd, dir)
}

#[test]
fn test_binary_help() {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mcp-warden"));
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("mcp-warden"));
}

#[test]
fn test_missing_command_is_a_usage_error() {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mcp-warden"));
    cmd.assert().failure();
}

#[test]
fn test_spawn_failure_is_fatal() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_test_config(&dir);
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mcp-warden"));
    cmd.arg("-c")
        .arg(config)
        .arg("--")
        .arg("/nonexistent/mcp-server-binary")
        .write_stdin("")
        .assert()
        .failure();
}

#[test]
fn test_invalid_config_is_fatal_before_any_traffic() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("bad.yml");
    std::fs::write(
        &path,
        r#"
version: 1
rules:
  - name: redos
    match:
      arguments:
        _any_value:
          regex: "(a+)+"
    action: deny
"#,
    )
    .expect("write config");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mcp-warden"));
    cmd.arg("-c")
        .arg(path)
        .arg("--")
        .arg("cat")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicates::str::contains("ReDoS"));
}

#[test]
fn test_allowed_call_reaches_the_server() {
    let (mut cmd, _dir) = warden();
    let request = r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"read_file","arguments":{"path":"/tmp/safe-file.txt"}}}"#;

    // cat echoes whatever the proxy forwards.
    cmd.write_stdin(format!("{}\n", request))
        .assert()
        .success()
        .stdout(predicates::str::contains("safe-file.txt"));
}

#[test]
fn test_denied_call_yields_jsonrpc_error_and_never_reaches_server() {
    let (mut cmd, _dir) = warden();
    let request = r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"read_file","arguments":{"path":"/home/user/.ssh/id_rsa"}}}"#;

    let assert = cmd.write_stdin(format!("{}\n", request)).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    // Exactly the synthesized error; the echoed request never appears.
    assert!(stdout.contains("-32600"), "stdout: {}", stdout);
    assert!(stdout.contains("Blocked: access to SSH keys"));
    assert!(!stdout.contains("\"method\":\"tools/call\""));

    let error: serde_json::Value =
        serde_json::from_str(stdout.lines().next().expect("one line")).unwrap();
    assert_eq!(error["id"], serde_json::json!(1));
    assert_eq!(error["error"]["code"], serde_json::json!(-32600));
}

#[test]
fn test_denied_notification_produces_no_response() {
    let (mut cmd, _dir) = warden();
    // Same deny match, but no id: nothing may be emitted for it.
    let notification = r#"{"jsonrpc":"2.0","method":"tools/call","params":{"name":"read_file","arguments":{"path":".ssh/id_rsa"}}}"#;

    let assert = cmd
        .write_stdin(format!("{}\n", notification))
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.trim().is_empty(), "stdout: {}", stdout);
}

#[test]
fn test_batch_is_partially_denied() {
    let (mut cmd, _dir) = warden();
    let batch = r#"[{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"read_file","arguments":{"path":"/tmp/ok.txt"}}},{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"read_file","arguments":{"path":"/home/u/.ssh/id_ed25519"}}}]"#;

    let assert = cmd.write_stdin(format!("{}\n", batch)).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    // The error for id 2 comes from the proxy; the allowed element for id 1
    // is echoed back by cat.
    assert!(stdout.contains("-32600"));
    assert!(stdout.contains("ok.txt"));
    assert!(!stdout.contains("id_ed25519"));
}

#[test]
fn test_non_protocol_traffic_passes_through() {
    let (mut cmd, _dir) = warden();

    cmd.write_stdin("this is not json\n")
        .assert()
        .success()
        .stdout(predicates::str::contains("this is not json"));
}

#[test]
fn test_response_secrets_are_redacted_end_to_end() {
    let (mut cmd, _dir) = warden();
    // A response-shaped line travels proxy -> cat -> proxy and is then
    // evaluated by the outbound engine on the way back to the client.
    let response = r#"{"jsonrpc":"2.0","id":7,"result":{"content":[{"type":"text","text":"Key: AKIA1234567890ABCDEF"}]}}"#;

    let assert = cmd.write_stdin(format!("{}\n", response)).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    assert!(stdout.contains("[REDACTED BY MCP-WARDEN]"), "stdout: {}", stdout);
    assert!(!stdout.contains("AKIA"));
}

#[test]
fn test_child_exit_code_is_propagated() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = write_test_config(&dir);
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mcp-warden"));
    cmd.arg("-c")
        .arg(config)
        .arg("--")
        .arg("sh")
        .arg("-c")
        .arg("exit 3")
        .write_stdin("")
        .assert()
        .code(3);
}
