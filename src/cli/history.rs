// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arguments for commands that move branch tips.

use clap::Args;

/// Arguments for `reset`.
#[derive(Debug, Clone, Args)]
pub struct ResetArgs {
    /// Commit to point the current branch at.
    pub commit: String,
}

/// Arguments for `fast-forward`.
#[derive(Debug, Clone, Args)]
pub struct FastForwardArgs {
    /// Local branch; the current branch when omitted.
    pub branch: Option<String>,
}

/// Arguments for `merge`.
#[derive(Debug, Clone, Args)]
pub struct MergeArgs {
    /// Branch to merge: a full refname, a local branch or a remote branch
    /// shorthand such as 'origin/main'.
    pub branch: String,

    /// Fast-forwards without asking when possible.
    #[arg(long)]
    pub silent_fast_forward: bool,
}

/// Arguments for `recall`.
#[derive(Debug, Clone, Args)]
pub struct RecallArgs {
    /// Hash of the lost commit, prefilled in the form.
    pub hash: Option<String>,
}
