//! Integration tests for the draft commands

#![allow(deprecated)]

use chrono::{Duration, Utc};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

mod common;
use common::{daybook_in, init_signed_in, saved_id};

fn draft_file(root: &Path, id: &str) -> std::path::PathBuf {
    root.join(".daybook/drafts").join(format!("{}.json", id))
}

/// Move a stored draft's timestamp into the past
fn age_draft(root: &Path, id: &str, age: Duration) {
    let path = draft_file(root, id);
    let mut doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    doc["createdAt"] = serde_json::Value::String((Utc::now() - age).to_rfc3339());
    fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
}

fn entry_count(root: &Path) -> usize {
    fs::read_dir(root.join(".daybook/entries")).unwrap().count()
}

#[test]
fn test_save_and_list_draft() {
    let temp = TempDir::new().unwrap();
    init_signed_in(temp.path());

    let id = saved_id(daybook_in(temp.path()).args(["write", "half a thought", "--draft"]));
    assert!(draft_file(temp.path(), &id).exists());

    daybook_in(temp.path())
        .args(["drafts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()))
        .stdout(predicate::str::contains("left"))
        .stdout(predicate::str::contains("half a thought"));
}

#[test]
fn test_continue_draft_updates_in_place() {
    let temp = TempDir::new().unwrap();
    init_signed_in(temp.path());
    let id = saved_id(daybook_in(temp.path()).args(["write", "v1", "--draft"]));

    let again = saved_id(daybook_in(temp.path()).args([
        "write",
        "v2",
        "--draft",
        "--draft-id",
        id.as_str(),
    ]));

    assert_eq!(id, again);
    assert_eq!(
        fs::read_dir(temp.path().join(".daybook/drafts")).unwrap().count(),
        1
    );
    let stored = fs::read_to_string(draft_file(temp.path(), &id)).unwrap();
    assert!(stored.contains("\"content\": \"v2\""));
}

#[test]
fn test_expired_draft_hidden_but_kept() {
    let temp = TempDir::new().unwrap();
    init_signed_in(temp.path());
    let id = saved_id(daybook_in(temp.path()).args(["write", "old", "--draft"]));
    age_draft(temp.path(), &id, Duration::hours(24) + Duration::minutes(1));

    daybook_in(temp.path())
        .args(["drafts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No drafts found"));
    assert!(draft_file(temp.path(), &id).exists());

    daybook_in(temp.path())
        .args(["drafts", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 draft(s)"));
    assert!(!draft_file(temp.path(), &id).exists());
}

#[test]
fn test_expired_draft_cannot_be_promoted() {
    let temp = TempDir::new().unwrap();
    init_signed_in(temp.path());
    let id = saved_id(daybook_in(temp.path()).args(["write", "too late", "--draft"]));
    age_draft(temp.path(), &id, Duration::hours(24) + Duration::minutes(1));

    daybook_in(temp.path())
        .args(["drafts", "promote", id.as_str(), "-r", "4"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("expired"));
    daybook_in(temp.path())
        .args(["write", "--draft-id", id.as_str(), "-r", "4"])
        .assert()
        .code(5);

    assert_eq!(entry_count(temp.path()), 0);
    assert!(draft_file(temp.path(), &id).exists());
}

#[test]
fn test_retention_follows_config() {
    let temp = TempDir::new().unwrap();
    init_signed_in(temp.path());
    daybook_in(temp.path())
        .args(["config", "retention_hours", "48"])
        .assert()
        .success();
    let id = saved_id(daybook_in(temp.path()).args(["write", "kept longer", "--draft"]));
    age_draft(temp.path(), &id, Duration::hours(30));

    daybook_in(temp.path())
        .args(["drafts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()));
}

#[test]
fn test_delete_draft() {
    let temp = TempDir::new().unwrap();
    init_signed_in(temp.path());
    let id = saved_id(daybook_in(temp.path()).args(["write", "gone soon", "--draft"]));

    daybook_in(temp.path())
        .args(["drafts", "delete", id.as_str()])
        .assert()
        .success();
    assert!(!draft_file(temp.path(), &id).exists());

    daybook_in(temp.path())
        .args(["drafts", "delete", id.as_str()])
        .assert()
        .code(5);
}

#[test]
fn test_promote_keeps_draft_by_default() {
    let temp = TempDir::new().unwrap();
    init_signed_in(temp.path());
    let id = saved_id(daybook_in(temp.path()).args(["write", "nearly done", "--draft"]));

    daybook_in(temp.path())
        .args(["drafts", "promote", id.as_str()])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("rate the day"));
    assert_eq!(entry_count(temp.path()), 0);

    daybook_in(temp.path())
        .args(["drafts", "promote", id.as_str(), "-r", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved entry"));

    assert_eq!(entry_count(temp.path()), 1);
    assert!(draft_file(temp.path(), &id).exists());
}

#[test]
fn test_promote_deletes_draft_when_configured() {
    let temp = TempDir::new().unwrap();
    init_signed_in(temp.path());
    daybook_in(temp.path())
        .args(["config", "on_promote", "delete"])
        .assert()
        .success();
    let id = saved_id(daybook_in(temp.path()).args(["write", "finished", "-r", "2", "--draft"]));

    daybook_in(temp.path())
        .args(["write", "--draft-id", id.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved entry"));

    assert_eq!(entry_count(temp.path()), 1);
    assert!(!draft_file(temp.path(), &id).exists());
}

#[test]
fn test_drafts_are_per_user() {
    let temp = TempDir::new().unwrap();
    init_signed_in(temp.path());
    let id = saved_id(daybook_in(temp.path()).args(["write", "private", "--draft"]));

    daybook_in(temp.path())
        .args(["register", "second@example.com", "--password", "secret2"])
        .assert()
        .success();

    daybook_in(temp.path())
        .args(["drafts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No drafts found"));
    daybook_in(temp.path())
        .args(["drafts", "delete", id.as_str()])
        .assert()
        .code(5);
    assert!(draft_file(temp.path(), &id).exists());
}
