use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn bin(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tasknote"));
    cmd.env("TASKNOTE_HOME", root.join(".home"))
        .arg("--root")
        .arg(root);
    cmd
}

fn run(root: &Path, args: &[&str]) -> Output {
    bin(root).args(args).output().expect("run tasknote")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn add_list_search_complete_round_trip() {
    let repo = TempDir::new().expect("repo");

    let add = run(repo.path(), &["add", "Buy milk"]);
    assert!(add.status.success());
    assert!(stdout(&add).contains("Task added successfully (ID: 1)"));

    let add = run(repo.path(), &["add", "Read book", "Chapter 1"]);
    assert!(add.status.success());
    assert!(stdout(&add).contains("(ID: 2)"));
    assert!(repo.path().join("tasks.json").is_file());

    let search = run(repo.path(), &["search", "chapter", "--json"]);
    assert!(search.status.success());
    let found: Value = serde_json::from_slice(&search.stdout).expect("json");
    let found = found.as_array().expect("array");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], 2);

    let complete = run(repo.path(), &["complete", "1"]);
    assert!(complete.status.success());
    assert!(stdout(&complete).contains("Task 1 marked as complete: Buy milk"));

    let again = run(repo.path(), &["complete", "1"]);
    assert!(again.status.success());
    assert!(stdout(&again).contains("Task 1 is already completed."));

    let list = run(repo.path(), &["list"]);
    assert!(list.status.success());
    let text = stdout(&list);
    assert!(text.contains("TASKS (2 total)"));
    assert!(text.contains("[✓] ID: 1"));
    assert!(text.contains("[○] ID: 2"));
    assert!(text.contains("Description: Chapter 1"));
}

#[test]
fn empty_store_reports_no_tasks() {
    let repo = TempDir::new().expect("repo");
    let list = run(repo.path(), &["list"]);
    assert!(list.status.success());
    assert_eq!(stdout(&list).trim(), "No tasks found.");

    let search = run(repo.path(), &["search", "anything"]);
    assert!(search.status.success());
    assert_eq!(stdout(&search).trim(), "No tasks found matching 'anything'");
    assert!(!repo.path().join("tasks.json").exists());
}

#[test]
fn complete_unknown_id_fails_without_writing() {
    let repo = TempDir::new().expect("repo");
    run(repo.path(), &["add", "Only task"]);
    let before = std::fs::read_to_string(repo.path().join("tasks.json")).expect("read");

    let complete = run(repo.path(), &["complete", "9"]);
    assert!(!complete.status.success());
    assert!(String::from_utf8_lossy(&complete.stderr).contains("Task 9 not found"));
    let after = std::fs::read_to_string(repo.path().join("tasks.json")).expect("read");
    assert_eq!(before, after);
}

#[test]
fn blank_title_is_rejected() {
    let repo = TempDir::new().expect("repo");
    let add = run(repo.path(), &["add", "   "]);
    assert!(!add.status.success());
    assert!(String::from_utf8_lossy(&add.stderr).contains("Task title required"));
    assert!(!repo.path().join("tasks.json").exists());
}

#[test]
fn usage_errors_exit_non_zero_without_touching_store() {
    let repo = TempDir::new().expect("repo");
    for args in [&["frobnicate"][..], &["add"][..], &["complete", "abc"][..], &["search"][..]] {
        let output = run(repo.path(), args);
        assert!(!output.status.success(), "args {args:?} should fail");
        assert!(String::from_utf8_lossy(&output.stderr).contains("error"));
    }
    assert!(!repo.path().join("tasks.json").exists());
}

#[test]
fn help_prints_usage() {
    let repo = TempDir::new().expect("repo");
    let help = run(repo.path(), &["help"]);
    assert!(help.status.success());
    let text = stdout(&help);
    for command in ["add", "list", "search", "complete", "migrate"] {
        assert!(text.contains(command), "help should mention {command}");
    }
}

#[test]
fn corrupt_document_reports_remedy() {
    let repo = TempDir::new().expect("repo");
    std::fs::write(repo.path().join("tasks.json"), "[{").expect("write");
    let list = run(repo.path(), &["list"]);
    assert!(!list.status.success());
    let stderr = String::from_utf8_lossy(&list.stderr).to_string();
    assert!(stderr.contains("tasks.json"));
    assert!(stderr.contains("to start fresh"));
}
