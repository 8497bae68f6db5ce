// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use clap::Parser;

use super::{exit_code, format_report, merge_refname, task_for, trash_for};
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::error::AbortSignal;
use crate::task::test_utils::{FakeRepo, oid};
use crate::task::{JumpTo, Task, TaskEffects, TaskOutcome, TaskReport};

fn command(args: &[&str]) -> Command {
    let cli = Cli::try_parse_from(std::iter::once("repotask").chain(args.iter().copied())).unwrap();
    cli.command.unwrap()
}

fn repo() -> FakeRepo {
    FakeRepo::new()
        .with_branch("dev", oid('b'))
        .with_remote_branch("origin/main", oid('c'))
        .with_remote_branch("origin/dev", oid('d'))
        .with_stash(oid('5'), "On main: wip\n")
}

fn report(outcome: TaskOutcome) -> TaskReport {
    TaskReport {
        task: "MergeBranch",
        effects: TaskEffects::empty(),
        status: None,
        jump_to: None,
        outcome,
        recovery: None,
    }
}

#[test]
fn test_switch_without_confirmation() {
    let task = task_for(
        &command(&["switch", "dev", "--no-confirm", "--recurse-submodules"]),
        &repo(),
    )
    .unwrap();

    let Task::SwitchBranch(switch) = task else {
        panic!("expected SwitchBranch, got {task:?}");
    };
    assert_eq!(switch.branch, "dev");
    assert!(!switch.ask);
    assert!(switch.recurse_submodules);
}

#[test]
fn test_merge_prefers_local_branch() {
    let repo = repo();
    assert_eq!(merge_refname("dev", &repo).unwrap(), "refs/heads/dev");
    assert_eq!(
        merge_refname("origin/main", &repo).unwrap(),
        "refs/remotes/origin/main"
    );
    assert_eq!(
        merge_refname("refs/tags/v1", &repo).unwrap(),
        "refs/tags/v1"
    );
    insta::assert_snapshot!(
        merge_refname("nope", &repo).unwrap_err(),
        @"no local or remote branch named 'nope'"
    );
}

#[test]
fn test_merge_silent_fast_forward() {
    let task = task_for(
        &command(&["merge", "origin/dev", "--silent-fast-forward"]),
        &repo(),
    )
    .unwrap();

    let Task::MergeBranch(merge) = task else {
        panic!("expected MergeBranch, got {task:?}");
    };
    assert_eq!(merge.them, "refs/remotes/origin/dev");
    assert!(merge.silent_fast_forward);
}

#[test]
fn test_stash_apply_by_hash_keeps_by_default() {
    let task = task_for(&command(&["stash", "apply", "5555", "--keep"]), &repo()).unwrap();

    let Task::ApplyStash(apply) = task else {
        panic!("expected ApplyStash, got {task:?}");
    };
    assert_eq!(apply.stash, oid('5'));
    assert!(!apply.tick_delete);
    assert!(!apply.silent);
}

#[test]
fn test_reset_unknown_commit() {
    let err = task_for(&command(&["reset", "zzz"]), &repo()).unwrap_err();
    insta::assert_snapshot!(err, @"no commit matches 'zzz'");
}

#[test]
fn test_new_branch_variants() {
    let repo = repo();
    assert!(matches!(
        task_for(&command(&["new-branch"]), &repo).unwrap(),
        Task::NewBranchFromHead(_)
    ));
    let Task::NewBranchFromCommit(at) =
        task_for(&command(&["new-branch", "--at", "bbbb"]), &repo).unwrap()
    else {
        panic!("expected NewBranchFromCommit");
    };
    assert_eq!(at.tip, oid('b'));
    let Task::NewBranchFromRef(from) = task_for(
        &command(&["new-branch", "--from", "refs/remotes/origin/dev"]),
        &repo,
    )
    .unwrap() else {
        panic!("expected NewBranchFromRef");
    };
    assert_eq!(from.refname, "refs/remotes/origin/dev");
}

#[test]
fn test_recall_without_hash_prefills_nothing() {
    let Task::RecallCommit(recall) = task_for(&command(&["recall"]), &repo()).unwrap() else {
        panic!("expected RecallCommit");
    };
    assert_eq!(recall.hash, "");
}

#[test]
fn test_options_is_not_a_task() {
    assert!(task_for(&Command::Options, &repo()).is_err());
}

#[test]
fn test_trash_location() {
    let repo = repo();
    let mut config = Config::default();

    let trash = trash_for(&config, &repo).unwrap();
    assert_eq!(trash.dir(), PathBuf::from("/fake/.git/repotask-trash"));

    config.trash.dir = Some(PathBuf::from("/tmp/backups"));
    assert_eq!(
        trash_for(&config, &repo).unwrap().dir(),
        PathBuf::from("/tmp/backups")
    );

    config.trash.enabled = false;
    assert!(trash_for(&config, &repo).is_none());
}

#[test]
fn test_format_completed_report() {
    let report = TaskReport {
        status: Some("Branch 'dev' deleted.".to_string()),
        effects: TaskEffects::REFS | TaskEffects::WORKDIR,
        jump_to: Some(JumpTo::Commit(oid('b'))),
        ..report(TaskOutcome::Completed)
    };

    assert_eq!(
        format_report(&report),
        [
            "MergeBranch: completed",
            "status: Branch 'dev' deleted.",
            "effects: REFS, WORKDIR",
            "jump: commit bbbbbbb",
        ]
    );
    assert_eq!(exit_code(&report), 0);
}

#[test]
fn test_format_recovered_report() {
    let recovered = TaskReport {
        jump_to: Some(JumpTo::Workdir),
        ..report(TaskOutcome::Completed)
    };
    let report = TaskReport {
        recovery: Some(Box::new(recovered)),
        ..report(TaskOutcome::Failed("divergent".to_string()))
    };

    assert_eq!(
        format_report(&report),
        [
            "MergeBranch: failed: divergent",
            "recovery:",
            "  MergeBranch: completed",
            "  jump: working directory",
        ]
    );
    assert_eq!(exit_code(&report), 0);
}

#[test]
fn test_aborted_exit_code() {
    let aborted = report(TaskOutcome::Aborted(AbortSignal::information("Nothing to do.")));
    assert_eq!(format_report(&aborted), ["MergeBranch: aborted: Nothing to do."]);
    assert_eq!(exit_code(&aborted), 2);
    assert_eq!(exit_code(&report(TaskOutcome::Failed(String::new()))), 1);
    assert_eq!(
        format_report(&report(TaskOutcome::Aborted(AbortSignal::silent()))),
        ["MergeBranch: aborted"]
    );
}
