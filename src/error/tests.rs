// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{AbortSignal, ExecError, FlowError, ProcessFailure, RepoError, Severity};

#[test]
fn test_silent_abort() {
    let signal = AbortSignal::silent();
    assert!(signal.is_silent());
    assert!(signal.details().is_empty());
    insta::assert_snapshot!(signal.to_string(), @"aborted");
}

#[test]
fn test_abort_with_details() {
    let signal = AbortSignal::warning("Stash couldn't be applied.")
        .with_details(["git stash apply --index 0"]);

    assert_eq!(signal.severity(), Severity::Warning);
    assert_eq!(signal.message(), Some("Stash couldn't be applied."));
    assert_eq!(signal.details(), ["git stash apply --index 0"]);
}

#[test]
fn test_information_abort_display() {
    let err = FlowError::from(AbortSignal::information("Branch 'main' is already checked out."));
    insta::assert_snapshot!(err.to_string(), @"aborted: Branch 'main' is already checked out.");
    assert!(err.as_abort().is_some());
    assert!(!err.is_operational());
}

#[test]
fn test_process_failure_display() {
    let err = FlowError::from(ProcessFailure {
        command: "git stash drop stash@{0}".to_string(),
        exit_code: 1,
        stderr: "error: stash@{0} is not a valid reference".to_string(),
    });
    insta::assert_snapshot!(err.to_string(), @"'git stash drop stash@{0}' exited with code 1");
    assert!(err.is_operational());
}

#[test]
fn test_divergent_branches_display() {
    let err = RepoError::DivergentBranches {
        local: "main".to_string(),
        upstream: "origin/main".to_string(),
        checked_out: true,
    };
    insta::assert_snapshot!(
        err.to_string(),
        @"can't fast-forward 'main' to 'origin/main': the branches are divergent"
    );
}

#[test]
fn test_exec_error_display() {
    let busy = ExecError::Busy {
        requested: "delete branch".to_string(),
    };
    let prereq = ExecError::PrereqViolation {
        task: "merge branch".to_string(),
        missing: "no conflicts".to_string(),
    };

    insta::assert_snapshot!(busy.to_string(), @"cannot start 'delete branch': another task is already running");
    insta::assert_snapshot!(prereq.to_string(), @"prerequisites not met for 'merge branch': no conflicts");
}
