// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Stash command arguments.
//!
//! # Subcommands
//!
//! ```text
//! stash new [PATH...]         preselect PATHs (all files when none)
//! stash apply [STASH] [--keep]
//! stash drop [STASH]
//! ```
//!
//! `STASH` is an index (`0` is the newest), `stash@{n}` or a commit hash.

use clap::{Args, Subcommand};

/// Arguments for the `stash` command.
#[derive(Debug, Clone, Args)]
pub struct StashArgs {
    /// Stash subcommand.
    #[command(subcommand)]
    pub subcommand: StashSubcommand,
}

/// Stash subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum StashSubcommand {
    /// Stashes uncommitted changes.
    New(NewStashArgs),

    /// Applies a stash to the working directory.
    Apply(ApplyStashArgs),

    /// Deletes a stash.
    Drop(StashRef),
}

/// Arguments for `stash new`.
#[derive(Debug, Clone, Args)]
pub struct NewStashArgs {
    /// Files to preselect.
    pub paths: Vec<String>,
}

/// Arguments for `stash apply`.
#[derive(Debug, Clone, Args)]
pub struct ApplyStashArgs {
    #[command(flatten)]
    pub stash: StashRef,

    /// Leaves "delete the stash" unticked by default.
    #[arg(long)]
    pub keep: bool,
}

/// Which stash to act on.
#[derive(Debug, Clone, Args)]
pub struct StashRef {
    /// Stash index, `stash@{n}` or commit hash.
    #[arg(default_value = "0")]
    pub stash: String,
}

impl StashRef {
    /// Revision that `git rev-parse` understands.
    #[must_use]
    pub fn revision(&self) -> String {
        if self.stash.parse::<usize>().is_ok() {
            format!("stash@{{{}}}", self.stash)
        } else {
            self.stash.clone()
        }
    }
}
