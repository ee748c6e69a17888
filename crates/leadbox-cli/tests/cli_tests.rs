//! Integration tests for the `leadbox` CLI binary.
//!
//! These tests exercise the CLI as a subprocess, verifying exit codes,
//! stdout output, and session-file side effects. They do NOT require a
//! running Leadbox server: the address points at a closed port.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::Path;
use std::process::Command;

/// Helper: locate the `leadbox` binary built by `cargo test`.
fn leadbox_bin() -> String {
    let path = env!("CARGO_BIN_EXE_leadbox");
    assert!(
        Path::new(path).exists(),
        "leadbox binary not found at {path}"
    );
    path.to_owned()
}

/// Helper: run leadbox with args and return (`exit_code`, stdout, stderr).
fn run_with_session(args: &[&str], session_file: &Path) -> (i32, String, String) {
    let output = Command::new(leadbox_bin())
        .args(args)
        .env("LEADBOX_ADDR", "http://127.0.0.1:19999") // Non-existent server
        .env("LEADBOX_SESSION_FILE", session_file)
        .env_remove("LEADBOX_ADMIN_PASSWORD")
        .output()
        .expect("failed to execute leadbox");

    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

fn run(args: &[&str]) -> (i32, String, String) {
    let dir = tempfile::tempdir().unwrap();
    run_with_session(args, &dir.path().join("session.json"))
}

// ── Version & help ───────────────────────────────────────────────────

#[test]
fn test_version_flag() {
    let (code, stdout, _) = run(&["--version"]);
    assert_eq!(code, 0, "leadbox --version should exit 0");
    assert!(stdout.contains("leadbox"), "version output: {stdout}");
}

#[test]
fn test_help_lists_commands() {
    let (code, stdout, _) = run(&["--help"]);
    assert_eq!(code, 0);
    for command in ["phone", "submit", "admin"] {
        assert!(stdout.contains(command), "help should list {command}");
    }
}

// ── Phone ────────────────────────────────────────────────────────────

#[test]
fn test_phone_normalizes_international() {
    let (code, stdout, _) = run(&["phone", "+998901234567"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "+998 90 123 45 67");
}

#[test]
fn test_phone_groups_local_number() {
    let (code, stdout, _) = run(&["phone", "12-345-67-89"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "12 345 67 89");
}

#[test]
fn test_phone_blur_completes_local_number() {
    let (code, stdout, _) = run(&["phone", "123456789", "--blur"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "+998 12 345 67 89");
}

// ── Submit ───────────────────────────────────────────────────────────

#[test]
fn test_submit_invalid_form_reports_fields_without_network() {
    let (code, _, stderr) = run(&[
        "submit",
        "--name",
        "Aziza",
        "--email",
        "not-an-email",
        "--phone",
        "901234567",
        "--message",
        "",
    ]);
    assert_ne!(code, 0);
    assert!(stderr.contains("email"), "stderr: {stderr}");
    assert!(stderr.contains("message"), "stderr: {stderr}");
    assert!(stderr.contains("nothing was sent"), "stderr: {stderr}");
}

#[test]
fn test_submit_unreachable_server_shows_generic_message() {
    let (code, _, stderr) = run(&[
        "submit",
        "--name",
        "Aziza",
        "--email",
        "aziza@example.uz",
        "--phone",
        "901234567",
        "--message",
        "Need a bot",
        "--service",
        "telegram_bots",
    ]);
    assert_ne!(code, 0);
    assert!(stderr.contains("contact us by phone"), "stderr: {stderr}");
}

#[test]
fn test_submit_rejects_unknown_service() {
    let (code, _, stderr) = run(&[
        "submit", "--name", "A", "--email", "a@b.uz", "--phone", "901234567", "--message",
        "hi", "--service", "catering",
    ]);
    assert_eq!(code, 2, "clap usage errors exit 2");
    assert!(stderr.contains("catering"));
}

// ── Admin ────────────────────────────────────────────────────────────

#[test]
fn test_admin_command_requires_login() {
    let (code, _, stderr) = run(&["admin", "stats"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("not logged in"), "stderr: {stderr}");
}

#[test]
fn test_failed_login_does_not_store_session() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.json");

    let (code, _, _) = run_with_session(
        &["admin", "login", "--username", "admin", "--password", "pw"],
        &session,
    );
    assert_ne!(code, 0);
    assert!(!session.exists());
}

#[test]
fn test_logout_removes_session_file() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.json");
    fs::write(
        &session,
        r#"{"username":"admin","authorization":"Basic YWRtaW46cHc="}"#,
    )
    .unwrap();

    let (code, stdout, _) = run_with_session(&["admin", "logout"], &session);
    assert_eq!(code, 0);
    assert!(stdout.contains("Logged out"));
    assert!(!session.exists());
}

#[test]
fn test_stored_session_is_used_for_admin_calls() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.json");
    fs::write(
        &session,
        r#"{"username":"admin","authorization":"Basic YWRtaW46cHc="}"#,
    )
    .unwrap();

    // Logged in, so the failure is the unreachable server, not the session.
    let (code, _, stderr) = run_with_session(&["admin", "list", "--status", "new"], &session);
    assert_ne!(code, 0);
    assert!(!stderr.contains("not logged in"), "stderr: {stderr}");
}

#[test]
fn test_list_rejects_unknown_status() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.json");
    fs::write(
        &session,
        r#"{"username":"admin","authorization":"Basic YWRtaW46cHc="}"#,
    )
    .unwrap();

    let (code, _, stderr) = run_with_session(&["admin", "list", "--status", "done"], &session);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown status"), "stderr: {stderr}");
}
