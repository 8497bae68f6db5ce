// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Runs one repository operation from the command line.
//!
//! ```text
//! Command + GlobalOptions + Config
//!        |
//!        v
//! GitRepository::open(-C) ----> task_for() --> Task
//! GitDriver::new               (resolves hashes, stash indices and
//! TerminalUi::stdio(--yes)      branch shorthands against the repo)
//!        |
//!        v
//! TaskManager::run(task) --> TaskReport --> text lines | JSON
//!                                       --> exit code 0/1/2
//! ```

use std::sync::Arc;

use anyhow::{Context, anyhow};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::Command;
use crate::cli::branch::NewBranchArgs;
use crate::cli::global::GlobalOptions;
use crate::cli::stash::StashSubcommand;
use crate::config::Config;
use crate::error::Result;
use crate::git::backend::{GitRepository, Repository};
use crate::git::types::{HEADS_PREFIX, REMOTES_PREFIX};
use crate::task::manager::TaskManager;
use crate::task::tasks::branches::{
    DeleteBranch, DeleteBranchFolder, EditUpstreamBranch, NewBranchFromCommit, NewBranchFromHead,
    NewBranchFromRef, RenameBranch, RenameBranchFolder, SwitchBranch,
};
use crate::task::tasks::history::{FastForwardBranch, MergeBranch, RecallCommit, ResetHead};
use crate::task::tasks::stash::{ApplyStash, DropStash, NewStash};
use crate::task::tools::git::GitDriver;
use crate::task::{JumpTo, Task, TaskOutcome, TaskReport};
use crate::ui::TerminalUi;
use crate::utility::trash::Trash;

/// Name of the trash directory inside the git directory.
pub const TRASH_DIR_NAME: &str = "repotask-trash";

/// Exit status after a second Ctrl+C, as a shell reports SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Runs a task command and prints its report.
///
/// Returns the process exit code for the report.
///
/// # Errors
///
/// Returns an error if the repository cannot be opened, git cannot be
/// found, an argument does not resolve, or the engine refuses to start.
pub async fn run_task_command(
    command: &Command,
    global: &GlobalOptions,
    config: &Config,
) -> Result<u8> {
    let repo = GitRepository::open(&global.repo_dir(), &config.git)
        .with_context(|| format!("no repository at '{}'", global.repo_dir().display()))?;
    let task = task_for(command, &repo)?;
    debug!(task = ?task, "resolved command");

    let driver = GitDriver::new(repo.workdir(), &config.git)?;
    let trash = trash_for(config, &repo);
    let cancel_token = CancellationToken::new();
    let ui = TerminalUi::stdio(global.yes).with_cancel_token(cancel_token.clone());

    let mut manager = TaskManager::new(Arc::new(repo), Arc::new(ui), Arc::new(driver))
        .with_suppressed_prompts(config.prompts.suppressed.iter().cloned())
        .with_cancel_token(cancel_token.clone());
    if let Some(trash) = trash {
        manager = manager.with_trash(trash);
    }

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, interrupting task...");
            cancel_token.cancel();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C again, exiting");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });

    let report = manager.run(task).await;
    interrupt.abort();
    let report = report?;
    info!(
        task = report.task,
        completed = report.is_completed(),
        "task finished"
    );

    if global.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_report(&report) {
            println!("{line}");
        }
    }
    Ok(exit_code(&report))
}

/// Builds the engine task for a CLI command.
///
/// # Errors
///
/// Returns an error for `options` or when a commit, stash or branch
/// argument does not resolve.
pub fn task_for(command: &Command, repo: &dyn Repository) -> Result<Task> {
    let task: Task = match command {
        Command::Switch(args) => {
            let task = SwitchBranch::new(&args.branch);
            if args.no_confirm {
                task.without_confirmation(args.recurse_submodules).into()
            } else {
                task.into()
            }
        }
        Command::Rename(args) => RenameBranch::new(&args.branch).into(),
        Command::RenameFolder(args) => RenameBranchFolder::new(&args.folder).into(),
        Command::Delete(args) => DeleteBranch::new(&args.branch).into(),
        Command::DeleteFolder(args) => DeleteBranchFolder::new(&args.folder).into(),
        Command::NewBranch(args) => new_branch_task(args, repo)?,
        Command::Upstream(args) => {
            EditUpstreamBranch::new(&args.branch, args.upstream.clone()).into()
        }
        Command::Reset(args) => ResetHead::new(repo.resolve_commit(&args.commit)?).into(),
        Command::FastForward(args) => FastForwardBranch::new(args.branch.clone()).into(),
        Command::Merge(args) => {
            let task = MergeBranch::new(merge_refname(&args.branch, repo)?);
            if args.silent_fast_forward {
                task.silent_fast_forward().into()
            } else {
                task.into()
            }
        }
        Command::Recall(args) => RecallCommit::new(args.hash.clone().unwrap_or_default()).into(),
        Command::Stash(args) => match &args.subcommand {
            StashSubcommand::New(new) => NewStash::new(new.paths.clone()).into(),
            StashSubcommand::Apply(apply) => {
                let task = ApplyStash::new(repo.resolve_commit(&apply.stash.revision())?);
                if apply.keep {
                    task.keep_by_default().into()
                } else {
                    task.into()
                }
            }
            StashSubcommand::Drop(stash) => {
                DropStash::new(repo.resolve_commit(&stash.revision())?).into()
            }
        },
        Command::Options => return Err(anyhow!("'options' is not a repository operation")),
    };
    Ok(task)
}

fn new_branch_task(args: &NewBranchArgs, repo: &dyn Repository) -> Result<Task> {
    Ok(match (&args.at, &args.from) {
        (Some(commit), _) => NewBranchFromCommit::new(repo.resolve_commit(commit)?).into(),
        (None, Some(refname)) => NewBranchFromRef::new(refname).into(),
        (None, None) => NewBranchFromHead.into(),
    })
}

/// Full refname for a merge argument.
///
/// Local branches win over remote branches with the same shorthand.
///
/// # Errors
///
/// Returns an error if `name` is neither a refname nor a known branch.
pub fn merge_refname(name: &str, repo: &dyn Repository) -> Result<String> {
    if name.starts_with("refs/") {
        return Ok(name.to_string());
    }
    if repo.local_branch_names()?.iter().any(|b| b == name) {
        return Ok(format!("{HEADS_PREFIX}{name}"));
    }
    repo.remote_branch(name)
        .map(|_| format!("{REMOTES_PREFIX}{name}"))
        .map_err(|_| anyhow!("no local or remote branch named '{name}'"))
}

/// Trash used for stash backups, unless disabled.
#[must_use]
pub fn trash_for(config: &Config, repo: &dyn Repository) -> Option<Trash> {
    if !config.trash.enabled {
        return None;
    }
    let dir = config
        .trash
        .dir
        .clone()
        .unwrap_or_else(|| repo.git_dir().join(TRASH_DIR_NAME));
    Some(Trash::new(dir, config.trash.max_files))
}

/// Human-readable report, one line per fact.
#[must_use]
pub fn format_report(report: &TaskReport) -> Vec<String> {
    let mut lines = vec![match &report.outcome {
        TaskOutcome::Completed => format!("{}: completed", report.task),
        TaskOutcome::Aborted(signal) => match signal.message() {
            Some(message) => format!("{}: aborted: {message}", report.task),
            None => format!("{}: aborted", report.task),
        },
        TaskOutcome::Failed(reason) => format!("{}: failed: {reason}", report.task),
    }];

    if let Some(status) = &report.status {
        lines.push(format!("status: {status}"));
    }
    if !report.effects.is_empty() {
        lines.push(format!("effects: {}", report.effects.describe()));
    }
    if let Some(jump) = &report.jump_to {
        lines.push(format!("jump: {}", describe_jump(jump)));
    }
    if let Some(recovery) = &report.recovery {
        lines.push("recovery:".to_string());
        lines.extend(format_report(recovery).into_iter().map(|l| format!("  {l}")));
    }
    lines
}

fn describe_jump(jump: &JumpTo) -> String {
    match jump {
        JumpTo::Ref(refname) => refname.clone(),
        JumpTo::Workdir => "working directory".to_string(),
        JumpTo::Commit(id) => format!("commit {}", id.short()),
    }
}

/// Exit status: 0 completed, 1 failed, 2 aborted.
///
/// A recovery operation decides the status when there is one.
#[must_use]
pub fn exit_code(report: &TaskReport) -> u8 {
    if let Some(recovery) = &report.recovery {
        return exit_code(recovery);
    }
    match report.outcome {
        TaskOutcome::Completed => 0,
        TaskOutcome::Failed(_) => 1,
        TaskOutcome::Aborted(_) => 2,
    }
}

#[cfg(test)]
mod tests;
