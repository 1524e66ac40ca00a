//! Run the `personalize` preview binary against template and recipient files
//! written to a temporary directory, and check what it prints.
//!
//! `HOME` is pointed at the temporary directory so a developer's own
//! `~/.personalizerc` cannot change the outcome.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Path to the binary built by this Cargo workspace.
fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_personalize"))
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(binary())
        .args(args)
        .current_dir(dir)
        .env("HOME", dir)
        .env_remove("PERSONALIZE_BLOCK_MODE")
        .env_remove("PERSONALIZE_LOG")
        .output()
        .expect("failed to spawn personalize binary")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

const HOST: &str = r#"{
    "id": "u-7",
    "email": "ana@example.com",
    "first_name": "Ana",
    "role": "host",
    "tags": ["vip"],
    "login_count": 3,
    "custom_properties": { "plan": "pro" }
}"#;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn renders_template_for_recipient() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "t.txt", "{{#if role == 'host'}}Welcome host {{user_first_name}}!{{/if}} ({{plan}})");
    write(dir.path(), "ana.json", HOST);
    let out = run(dir.path(), &["t.txt", "ana.json"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "Welcome host Ana! (pro)");
}

#[test]
fn renders_without_recipient() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "t.txt", "Hi {{user_first_name}}{{#unless is_subscribed}}, upgrade{{/unless}}");
    let out = run(dir.path(), &["t.txt"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "Hi {{user_first_name}}, upgrade");
}

#[test]
fn legacy_flag_and_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "t.txt", "{{#if role}}A{{#if role}}B{{/if}}C{{/if}}");
    write(dir.path(), "ana.json", HOST);

    let out = run(dir.path(), &["t.txt", "ana.json"]);
    assert_eq!(stdout(&out), "ABC");

    let out = run(dir.path(), &["-L", "t.txt", "ana.json"]);
    assert_eq!(stdout(&out), "A{{#if role}}BC{{/if}}");

    write(dir.path(), "legacy.rc", "block_mode = legacy\n");
    let out = run(dir.path(), &["-f", "legacy.rc", "t.txt", "ana.json"]);
    assert_eq!(stdout(&out), "A{{#if role}}BC{{/if}}");

    write(dir.path(), ".personalizerc", "block_mode = legacy\n");
    let out = run(dir.path(), &["t.txt", "ana.json"]);
    assert_eq!(stdout(&out), "A{{#if role}}BC{{/if}}");
}

#[test]
fn lint_reports_problems() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "t.txt", "{{#if role is host}}x{{/if}}{{favourite_car}}{{plan}}");
    write(dir.path(), "ana.json", HOST);
    let out = run(dir.path(), &["-lq", "t.txt", "ana.json"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "");
    let err = stderr(&out);
    assert!(err.contains("condition `role is host` is malformed"), "{err}");
    assert!(err.contains("token `{{favourite_car}}` is unknown"), "{err}");
    assert!(!err.contains("{{plan}}"), "{err}");
}

#[test]
fn catalog_is_json() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["-C"]);
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&out)).expect("catalog JSON");
    assert!(json["tokens"]
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["name"] == "user_first_name"));
}

#[test]
fn bad_recipient_json_fails() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "t.txt", "x");
    write(dir.path(), "bad.json", "{ nope");
    let out = run(dir.path(), &["t.txt", "bad.json"]);
    assert!(!out.status.success());
    assert!(stderr(&out).starts_with("personalize: invalid recipient JSON"));
}

#[test]
fn recipient_without_email_fails() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "t.txt", "{{user_id}}");
    write(dir.path(), "anon.json", r#"{ "id": "u-9" }"#);
    let out = run(dir.path(), &["t.txt", "anon.json"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("missing field `email`"), "{}", stderr(&out));
}

#[test]
fn preview_recipient_when_omitted() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "t.txt", "{{user_id}} <{{user_email}}>");
    let out = run(dir.path(), &["t.txt"]);
    assert_eq!(stdout(&out), "preview <preview@example.invalid>");
}

#[test]
fn missing_template_fails_with_usage() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Usage: personalize"));
}
