// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{GitCommand, GitDriver, ProcessInvocation, check_exit};
use crate::config::types::GitConfig;
use crate::error::FlowError;
use crate::task::tools::ProcessDriver;

fn invocation(exit_code: i32, fail_on_nonzero: bool) -> ProcessInvocation {
    ProcessInvocation {
        command: "git stash drop stash@{0}".to_string(),
        exit_code,
        stdout: String::new(),
        stderr: "error: no such stash\n".to_string(),
        fail_on_nonzero,
    }
}

#[test]
fn test_git_command_builder() {
    let cmd = GitCommand::new(["checkout", "--progress", "--no-guess"])
        .arg_if(false, "--recurse-submodules")
        .arg("dev");
    assert!(cmd.fail_on_nonzero());
    insta::assert_snapshot!(cmd.command_line(), @"git checkout --progress --no-guess dev");

    let cmd = GitCommand::new(["merge"])
        .arg_if(true, "--no-ff")
        .arg("origin/main")
        .allow_failure();
    assert!(!cmd.fail_on_nonzero());
    assert_eq!(cmd.args(), ["merge", "--no-ff", "origin/main"]);
}

#[test]
fn test_command_line_quotes_spaces() {
    let cmd = GitCommand::new(["stash", "push", "-m", "my work"]);
    insta::assert_snapshot!(cmd.command_line(), @r#"git stash push -m "my work""#);
}

#[test]
fn test_check_exit_fatal() {
    let err = check_exit(invocation(1, true)).unwrap_err();
    let FlowError::Process(failure) = err else {
        panic!("expected a process failure, got {err:?}");
    };
    assert_eq!(failure.exit_code, 1);
    assert_eq!(failure.stderr, "error: no such stash\n");
    insta::assert_snapshot!(
        FlowError::Process(failure).to_string(),
        @"'git stash drop stash@{0}' exited with code 1"
    );
}

#[test]
fn test_check_exit_not_fatal() {
    let inv = check_exit(invocation(1, false)).unwrap();
    assert_eq!(inv.exit_code, 1);
    assert!(!inv.success());
    assert_eq!(inv.stderr_lines().collect::<Vec<_>>(), ["error: no such stash"]);

    assert!(check_exit(invocation(0, true)).unwrap().success());
}

#[test]
fn test_driver_missing_executable() {
    let config = GitConfig {
        executable: "nonexistent_git_12345".into(),
        ..GitConfig::default()
    };
    let err = GitDriver::new(std::path::Path::new("."), &config).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"executable not found: 'nonexistent_git_12345' (not in PATH)"
    );
}

#[tokio::test]
async fn test_driver_runs_git() {
    let temp = tempfile::tempdir().unwrap();
    let driver = GitDriver::new(temp.path(), &GitConfig::default()).unwrap();
    assert_eq!(driver.name(), "git");

    let inv = driver
        .invoke(&GitCommand::new(["init", "--quiet"]))
        .await
        .unwrap();
    assert!(inv.success());
    assert_eq!(inv.command, "git init --quiet");

    let inv = driver
        .invoke(&GitCommand::new(["rev-parse", "--verify", "no-such-ref"]).allow_failure())
        .await
        .unwrap();
    assert_ne!(inv.exit_code, 0);
    assert!(!inv.fail_on_nonzero);
    assert!(!inv.stderr.is_empty());
}
