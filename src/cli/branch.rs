// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Branch command arguments.
//!
//! # Subcommands
//!
//! ```text
//! switch BRANCH [--no-confirm] [--recurse-submodules]
//! rename BRANCH                 rename-folder FOLDER
//! delete BRANCH                 delete-folder FOLDER
//! new-branch [--at COMMIT | --from REF]
//! upstream BRANCH [REMOTE/BRANCH]   (no upstream: stop tracking)
//! ```

use clap::Args;

/// Arguments for `switch`.
#[derive(Debug, Clone, Args)]
pub struct SwitchArgs {
    /// Local branch to check out.
    pub branch: String,

    /// Switches without asking first.
    #[arg(long)]
    pub no_confirm: bool,

    /// Updates submodules recursively (only with --no-confirm).
    #[arg(long, requires = "no_confirm")]
    pub recurse_submodules: bool,
}

/// A local branch name.
#[derive(Debug, Clone, Args)]
pub struct BranchArgs {
    /// Local branch name.
    pub branch: String,
}

/// A branch folder, such as `feature`.
#[derive(Debug, Clone, Args)]
pub struct FolderArgs {
    /// Folder name, with or without a trailing '/'.
    pub folder: String,
}

/// Arguments for `new-branch`.
#[derive(Debug, Clone, Args)]
pub struct NewBranchArgs {
    /// Commit (hash or revision) to create the branch on.
    #[arg(long, value_name = "COMMIT", conflicts_with = "from")]
    pub at: Option<String>,

    /// Full refname of a local or remote branch to start from.
    #[arg(long, value_name = "REF")]
    pub from: Option<String>,
}

/// Arguments for `upstream`.
#[derive(Debug, Clone, Args)]
pub struct UpstreamArgs {
    /// Local branch to edit.
    pub branch: String,

    /// Remote branch shorthand, such as 'origin/main'. Omit to stop tracking.
    pub upstream: Option<String>,
}
