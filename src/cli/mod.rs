// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for repotask using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! repotask [global options] <command>
//! switch | rename | rename-folder | delete | delete-folder
//! new-branch | upstream
//! reset | fast-forward | merge | recall
//! stash {new|apply|drop}
//! options
//! ```

pub mod branch;
pub mod global;
pub mod history;
pub mod stash;


use crate::cli::branch::{
    BranchArgs, FolderArgs, NewBranchArgs, SwitchArgs, UpstreamArgs,
};
use crate::cli::global::GlobalOptions;
use crate::cli::history::{FastForwardArgs, MergeArgs, RecallArgs, ResetArgs};
use crate::cli::stash::StashArgs;
use clap::{Parser, Subcommand};

/// Resumable Git Task Flows
///
/// Runs interactive git operations one at a time.
#[derive(Debug, Parser)]
#[command(
    name = "repotask",
    author,
    version,
    about = "Resumable Git Task Flows",
    long_about = "repotask Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Runs interactive git operations (switching, renaming and\n\
                  deleting branches, merging, stashing) as task flows that\n\
                  ask before touching the repository.",
    after_help = "CONFIG FILES:\n\n\
                  repotask reads `repotask.toml` from the current directory if\n\
                  present. Additional files can be given with --ini and are\n\
                  loaded after it. Environment variables such as\n\
                  REPOTASK_TRASH__MAX_FILES override files, and --set overrides\n\
                  everything."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Switches to a local branch.
    Switch(SwitchArgs),

    /// Renames a local branch.
    Rename(BranchArgs),

    /// Renames a folder of local branches.
    #[command(name = "rename-folder")]
    RenameFolder(FolderArgs),

    /// Deletes a local branch.
    Delete(BranchArgs),

    /// Deletes every local branch in a folder.
    #[command(name = "delete-folder")]
    DeleteFolder(FolderArgs),

    /// Creates a local branch.
    #[command(name = "new-branch")]
    NewBranch(NewBranchArgs),

    /// Changes the upstream of a local branch.
    Upstream(UpstreamArgs),

    /// Resets the current branch to a commit.
    Reset(ResetArgs),

    /// Fast-forwards a branch to its upstream.
    #[command(name = "fast-forward")]
    FastForward(FastForwardArgs),

    /// Merges a branch into HEAD.
    Merge(MergeArgs),

    /// Recovers a lost commit as a new branch.
    Recall(RecallArgs),

    /// Manages stashes.
    Stash(StashArgs),

    /// Lists all options and their values, and the loaded config files.
    Options,
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}
