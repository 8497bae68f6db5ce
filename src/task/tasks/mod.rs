// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Concrete repository operations.
//!
//! ```text
//! task::tasks
//! branches: SwitchBranch, RenameBranch, RenameBranchFolder, DeleteBranch,
//!           DeleteBranchFolder, NewBranchFromCommit/Head/Ref, EditUpstreamBranch
//! history:  ResetHead, FastForwardBranch, MergeBranch, RecallCommit
//! stash:    NewStash, ApplyStash, DropStash
//! ```
//!
//! Every operation is a plain struct of its parameters. Messages quote
//! branch names, e.g. `Branch 'dev' deleted`.

pub mod branches;
pub mod history;
pub mod stash;
