// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the task engine.
//!
//! Runs operations end to end against real temporary repositories, with the
//! terminal UI reading scripted answers.

use std::io::{self, Cursor};
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use repotask::config::types::GitConfig;
use repotask::error::Severity;
use repotask::git::backend::{GitRepository, Repository};
use repotask::task::manager::TaskManager;
use repotask::task::tasks::branches::{DeleteBranch, RenameBranch, SwitchBranch};
use repotask::task::tasks::history::MergeBranch;
use repotask::task::tasks::stash::{ApplyStash, NewStash};
use repotask::task::tools::git::GitDriver;
use repotask::task::{JumpTo, TaskEffects, TaskOutcome};
use repotask::ui::TerminalUi;
use repotask::utility::trash::Trash;
use tempfile::TempDir;

fn git(cwd: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Repository on `main` with `a.txt`, plus a branch `dev` one commit ahead.
fn init_repo() -> TempDir {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    let path = temp.path();
    git(path, &["init", "--quiet", "--initial-branch=main"]);
    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["config", "user.name", "Test"]);
    git(path, &["config", "commit.gpgsign", "false"]);
    std::fs::write(path.join("a.txt"), "one\n").unwrap();
    git(path, &["add", "a.txt"]);
    git(path, &["commit", "--quiet", "-m", "Initial commit"]);

    git(path, &["branch", "dev"]);
    git(path, &["checkout", "--quiet", "dev"]);
    std::fs::write(path.join("a.txt"), "two\n").unwrap();
    git(path, &["commit", "--quiet", "-am", "Second commit"]);
    git(path, &["checkout", "--quiet", "main"]);
    temp
}

fn open(dir: &TempDir) -> GitRepository {
    GitRepository::open(dir.path(), &GitConfig::default()).unwrap()
}

fn manager(dir: &TempDir, ui: TerminalUi) -> TaskManager {
    let repo = open(dir);
    let driver = GitDriver::new(repo.workdir(), &GitConfig::default()).unwrap();
    TaskManager::new(Arc::new(repo), Arc::new(ui), Arc::new(driver))
}

fn scripted(answers: &'static str) -> TerminalUi {
    TerminalUi::new(Cursor::new(answers), io::sink(), false)
}

fn assume_yes() -> TerminalUi {
    TerminalUi::new(Cursor::new(""), io::sink(), true)
}

#[tokio::test]
async fn rename_branch_through_dialog() {
    let dir = init_repo();
    // A taken name is refused and asked again; the empty line accepts.
    let manager = manager(&dir, scripted("main\nfeature/renamed\n\n"));

    let report = manager.run(RenameBranch::new("dev")).await.unwrap();

    assert!(report.is_completed());
    assert_eq!(
        report.status.as_deref(),
        Some("Branch 'dev' renamed to 'feature/renamed'.")
    );
    assert_eq!(report.effects, TaskEffects::REFS);
    assert_eq!(
        open(&dir).local_branch_names().unwrap(),
        ["feature/renamed", "main"]
    );
}

#[tokio::test]
async fn cancelled_rename_changes_nothing() {
    let dir = init_repo();
    // End of input cancels the dialog.
    let manager = manager(&dir, scripted(""));

    let report = manager.run(RenameBranch::new("dev")).await.unwrap();

    assert!(matches!(report.outcome, TaskOutcome::Aborted(ref s) if s.is_silent()));
    assert!(report.effects.is_empty());
    assert_eq!(open(&dir).local_branch_names().unwrap(), ["dev", "main"]);
}

#[tokio::test]
async fn switch_branch_checks_out() {
    let dir = init_repo();
    let manager = manager(&dir, assume_yes());

    let report = manager.run(SwitchBranch::new("dev")).await.unwrap();

    assert!(report.is_completed());
    assert_eq!(report.status.as_deref(), Some("Switched to branch 'dev'."));
    assert_eq!(report.effects, TaskEffects::REFS | TaskEffects::HEAD);
    assert_eq!(open(&dir).head().unwrap().branch_name(), Some("dev"));
}

#[tokio::test]
async fn failed_checkout_keeps_effects() {
    let dir = init_repo();
    std::fs::write(dir.path().join("a.txt"), "local edit\n").unwrap();
    let manager = manager(&dir, assume_yes());

    let report = manager.run(SwitchBranch::new("dev")).await.unwrap();

    assert!(matches!(report.outcome, TaskOutcome::Failed(_)));
    assert_eq!(report.effects, TaskEffects::REFS | TaskEffects::HEAD);
    assert_eq!(open(&dir).head().unwrap().branch_name(), Some("main"));
}

#[tokio::test]
async fn deleting_current_branch_is_refused() {
    let dir = init_repo();
    let manager = manager(&dir, assume_yes());

    let report = manager.run(DeleteBranch::new("main")).await.unwrap();

    let TaskOutcome::Aborted(signal) = &report.outcome else {
        panic!("expected abort, got {:?}", report.outcome);
    };
    assert_eq!(signal.severity(), Severity::Warning);
    assert_eq!(open(&dir).local_branch_names().unwrap(), ["dev", "main"]);
}

#[tokio::test]
async fn delete_branch_after_confirmation() {
    let dir = init_repo();
    let manager = manager(&dir, scripted("y\n"));

    let report = manager.run(DeleteBranch::new("dev")).await.unwrap();

    assert!(report.is_completed());
    assert_eq!(open(&dir).local_branch_names().unwrap(), ["main"]);
}

#[tokio::test]
async fn merge_fast_forwards() {
    let dir = init_repo();
    let dev_tip = git(dir.path(), &["rev-parse", "dev"]);
    let manager = manager(&dir, assume_yes());

    let report = manager.run(MergeBranch::new("refs/heads/dev")).await.unwrap();

    assert!(report.is_completed());
    assert_eq!(report.effects, TaskEffects::REFS | TaskEffects::WORKDIR);
    assert_eq!(git(dir.path(), &["rev-parse", "main"]), dev_tip);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
        "two\n"
    );
}

#[tokio::test]
async fn merge_up_to_date_aborts() {
    let dir = init_repo();
    git(dir.path(), &["checkout", "--quiet", "dev"]);
    let manager = manager(&dir, assume_yes());

    let report = manager.run(MergeBranch::new("refs/heads/main")).await.unwrap();

    let TaskOutcome::Aborted(signal) = &report.outcome else {
        panic!("expected abort, got {:?}", report.outcome);
    };
    assert_eq!(signal.severity(), Severity::Information);
    assert!(report.effects.is_empty());
}

#[tokio::test]
async fn stash_round_trip_with_backup() {
    let dir = init_repo();
    let trash_dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "stashed\n").unwrap();
    let manager =
        manager(&dir, assume_yes()).with_trash(Trash::new(trash_dir.path(), 10));

    let report = manager.run(NewStash::default()).await.unwrap();
    assert!(report.is_completed());
    assert_eq!(report.status.as_deref(), Some("File stashed."));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
        "one\n"
    );

    let stash = open(&dir).resolve_commit("stash@{0}").unwrap();
    let report = manager.run(ApplyStash::new(stash.clone())).await.unwrap();

    assert!(report.is_completed());
    assert_eq!(report.jump_to, Some(JumpTo::Workdir));
    assert_eq!(report.effects, TaskEffects::WORKDIR | TaskEffects::REFS);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
        "stashed\n"
    );
    assert_eq!(git(dir.path(), &["stash", "list"]), "");

    let backups = Trash::new(trash_dir.path(), 10).files().unwrap();
    assert_eq!(backups.len(), 1);
    let backup = std::fs::read_to_string(&backups[0]).unwrap();
    assert!(backup.contains(stash.as_str()));
}

#[tokio::test]
async fn report_serializes_for_hosts() {
    let dir = init_repo();
    let manager = manager(&dir, assume_yes());

    let report = manager.run(SwitchBranch::new("dev")).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["task"], "SwitchBranch");
    assert_eq!(json["outcome"]["kind"], "completed");
    assert_eq!(json["status"], "Switched to branch 'dev'.");
}
