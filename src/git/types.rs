// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Domain values returned by the repository backend.
//!
//! ```text
//! RepoState   head + conflicts + staged      (prerequisite snapshot)
//! HeadState   Unborn | Detached | Branch
//! Branch      local branch with target, upstream, checked-out flag
//! RemoteBranch shorthand "origin/main" split into remote + name
//! FileStatus  one porcelain status record
//! MergeAnalysis  UP_TO_DATE | FASTFORWARD | NORMAL | UNBORN
//! ```

use bitflags::bitflags;
use serde::Serialize;

/// Prefix of local branch references.
pub const HEADS_PREFIX: &str = "refs/heads/";
/// Prefix of remote-tracking branch references.
pub const REMOTES_PREFIX: &str = "refs/remotes/";

/// Hex object id of a commit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form used in messages (7 characters).
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..7).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of reference, from its full name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Local,
    Remote,
    Other,
}

/// Splits `refs/heads/foo` into `(Local, "foo")`.
#[must_use]
pub fn split_refname(refname: &str) -> (RefKind, &str) {
    if let Some(name) = refname.strip_prefix(HEADS_PREFIX) {
        (RefKind::Local, name)
    } else if let Some(name) = refname.strip_prefix(REMOTES_PREFIX) {
        (RefKind::Remote, name)
    } else {
        (RefKind::Other, refname)
    }
}

/// Where HEAD points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    /// HEAD names a branch that has no commit yet.
    Unborn { branch: String },
    /// HEAD points at a raw commit.
    Detached { commit: CommitId },
    /// HEAD is a branch with at least one commit.
    Branch { name: String, commit: CommitId },
}

impl HeadState {
    #[must_use]
    pub const fn is_unborn(&self) -> bool {
        matches!(self, Self::Unborn { .. })
    }

    #[must_use]
    pub const fn is_detached(&self) -> bool {
        matches!(self, Self::Detached { .. })
    }

    /// Short name of the checked-out branch (also for an unborn branch).
    #[must_use]
    pub fn branch_name(&self) -> Option<&str> {
        match self {
            Self::Unborn { branch } | Self::Branch { name: branch, .. } => Some(branch),
            Self::Detached { .. } => None,
        }
    }

    /// Commit HEAD resolves to, if any.
    #[must_use]
    pub const fn commit(&self) -> Option<&CommitId> {
        match self {
            Self::Unborn { .. } => None,
            Self::Detached { commit } | Self::Branch { commit, .. } => Some(commit),
        }
    }
}

/// Repository facts that prerequisites are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoState {
    pub head: HeadState,
    /// Unresolved merge conflicts exist in the index.
    pub conflicts: bool,
    /// The index differs from HEAD.
    pub staged_changes: bool,
}

/// A local branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Short name (`feature/foo`).
    pub name: String,
    pub target: CommitId,
    /// Full refname of the upstream (`refs/remotes/origin/foo`).
    pub upstream: Option<String>,
    pub checked_out: bool,
}

impl Branch {
    #[must_use]
    pub fn refname(&self) -> String {
        format!("{HEADS_PREFIX}{}", self.name)
    }

    /// Upstream without its `refs/remotes/` or `refs/heads/` prefix.
    #[must_use]
    pub fn upstream_shorthand(&self) -> Option<&str> {
        self.upstream.as_deref().map(|u| split_refname(u).1)
    }
}

/// A remote-tracking branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBranch {
    /// `origin/main`
    pub shorthand: String,
    /// `origin`
    pub remote: String,
    pub target: CommitId,
}

impl RemoteBranch {
    /// Branch name without the remote prefix (`main`).
    #[must_use]
    pub fn branch_name(&self) -> &str {
        self.shorthand
            .strip_prefix(&self.remote)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(&self.shorthand)
    }
}

/// One entry of `git status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    pub path: String,
    /// Index column of the porcelain status.
    pub index: char,
    /// Worktree column of the porcelain status.
    pub worktree: char,
}

impl FileStatus {
    #[must_use]
    pub const fn is_untracked(&self) -> bool {
        self.index == '?'
    }

    #[must_use]
    pub const fn is_conflicted(&self) -> bool {
        matches!(
            (self.index, self.worktree),
            ('U', _) | (_, 'U') | ('A', 'A') | ('D', 'D')
        )
    }

    #[must_use]
    pub const fn is_staged(&self) -> bool {
        !self.is_conflicted() && !matches!(self.index, ' ' | '?' | '!')
    }

    /// Modified in the worktree relative to the index (untracked included).
    #[must_use]
    pub const fn is_unstaged(&self) -> bool {
        !self.is_conflicted() && !matches!(self.worktree, ' ' | '!')
    }
}

bitflags! {
    /// Result of comparing a branch tip against another commit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MergeAnalysis: u8 {
        const UP_TO_DATE = 1 << 0;
        const FASTFORWARD = 1 << 1;
        const NORMAL = 1 << 2;
        const UNBORN = 1 << 3;
    }
}
