// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!                 FlowError
//!                     |
//!   +--------+--------+--------+---------+---------+
//!   |        |        |        |         |         |
//!   v        v        v        v         v         v
//! Abort   Prereq   Process   Repo   Interrupted Internal
//! (clean) (caller  (exit     (domain  (host      (always
//!          bug)    code)     errors)  teardown)  surfaced)
//!
//! ExecError   Busy, PrereqViolation, Snapshot   (TaskManager::run)
//! RepoError   BranchNotFound, DivergentBranches, CommandFailed, Gix, ...
//! ProcessError  ExecutableNotFound, SpawnFailed
//! ConfigError   InvalidValue
//! ```
//!
//! Only [`FlowError::Abort`] is an expected outcome. Everything else is
//! presented to the user, possibly after a task-specific recovery hook.

use serde::Serialize;
use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type for repository backend calls.
pub type RepoResult<T> = std::result::Result<T, RepoError>;

/// Result type for flow steps.
pub type FlowResult<T> = std::result::Result<T, FlowError>;

// --- Abort Signal ---

/// Tone of a message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Neutral information ("already up to date").
    Information,
    /// Something the user should pay attention to.
    #[default]
    Warning,
    /// A failure.
    Critical,
}

/// Clean, expected termination of a flow.
///
/// Raising it stops the flow with no further steps. The message, if any, is
/// shown to the user; an abort without a message stops silently (typically
/// because the user just cancelled a prompt).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AbortSignal {
    message: Option<String>,
    severity: Severity,
    details: Vec<String>,
}

impl AbortSignal {
    /// Abort without telling the user anything.
    #[must_use]
    pub fn silent() -> Self {
        Self::default()
    }

    /// Abort with a warning message.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            severity: Severity::Warning,
            details: Vec::new(),
        }
    }

    /// Abort with an informational message.
    pub fn information(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            severity: Severity::Information,
            details: Vec::new(),
        }
    }

    /// Attaches detail lines (shown collapsed under the message).
    #[must_use]
    pub fn with_details(mut self, details: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.details = details.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn details(&self) -> &[String] {
        &self.details
    }

    /// Returns true if the abort should not show anything.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        self.message.is_none()
    }
}

impl std::fmt::Display for AbortSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "aborted: {message}"),
            None => write!(f, "aborted"),
        }
    }
}

// --- Flow Errors ---

/// Error raised by a flow step.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Clean early termination.
    #[error("{0}")]
    Abort(AbortSignal),

    /// The task was started while its prerequisites did not hold.
    #[error("prerequisites not met for '{task}': {missing}")]
    PrereqViolation { task: String, missing: String },

    /// The external git process failed and the step required success.
    #[error(transparent)]
    Process(#[from] ProcessFailure),

    /// The repository backend raised a domain error.
    #[error(transparent)]
    Repo(#[from] RepoError),

    /// The host tore the executor down between two steps or while the flow
    /// waited for the user.
    #[error("task '{0}' was interrupted")]
    Interrupted(String),

    /// Anything else. Always surfaced verbatim.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FlowError {
    /// Creates an [`FlowError::Internal`] error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the abort signal if this is a clean abort.
    #[must_use]
    pub const fn as_abort(&self) -> Option<&AbortSignal> {
        match self {
            Self::Abort(signal) => Some(signal),
            _ => None,
        }
    }

    /// Operational failures are expected to happen in normal use
    /// (failed git command, diverged branches) and may be recovered from.
    #[must_use]
    pub const fn is_operational(&self) -> bool {
        matches!(self, Self::Process(_) | Self::Repo(_))
    }
}

impl From<AbortSignal> for FlowError {
    fn from(signal: AbortSignal) -> Self {
        Self::Abort(signal)
    }
}

/// A git invocation that exited non-zero while its step demanded success.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("'{command}' exited with code {exit_code}")]
pub struct ProcessFailure {
    /// Command line as it was run.
    pub command: String,
    /// Process exit code (-1 when killed by a signal).
    pub exit_code: i32,
    /// Captured standard error.
    pub stderr: String,
}

// --- Executor Errors ---

/// Errors returned by `TaskManager::run` before a flow starts.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Another task is in flight on the same repository.
    #[error("cannot start '{requested}': another task is already running")]
    Busy { requested: String },

    /// The task's declared prerequisites are not satisfied.
    ///
    /// The host should not have offered this action at all.
    #[error("prerequisites not met for '{task}': {missing}")]
    PrereqViolation { task: String, missing: String },

    /// The repository state could not be read for the prerequisite check.
    #[error("failed to read repository state: {0}")]
    Snapshot(#[from] RepoError),

    /// A worker thread failed outside of any flow.
    #[error("internal error: {0}")]
    Internal(String),
}

// --- Gix Errors ---

/// Wrapper for gix-specific errors.
#[derive(Debug, Error)]
pub enum GixError {
    /// Failed to discover repository from path.
    #[error("failed to discover repository: {0}")]
    Discover(#[from] Box<gix::discover::Error>),

    /// Failed to get HEAD reference.
    #[error("failed to get head reference: {0}")]
    Head(#[from] gix::reference::find::existing::Error),

    /// Repository has no worktree (bare repository).
    #[error("repository has no worktree (bare repository)")]
    BareRepository,
}

// --- Repository Errors ---

/// Domain errors raised by the repository backend.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Local or remote branch not found.
    #[error("branch not found: {branch}")]
    BranchNotFound { branch: String },

    /// Reference not found or not a branch.
    #[error("reference not found: {refname}")]
    RefNotFound { refname: String },

    /// A branch cannot be fast-forwarded to its upstream.
    #[error("can't fast-forward '{local}' to '{upstream}': the branches are divergent")]
    DivergentBranches {
        local: String,
        upstream: String,
        checked_out: bool,
    },

    /// Merge analysis returned a combination the flow does not handle.
    #[error("unsupported merge analysis: {0}")]
    UnsupportedMergeAnalysis(String),

    /// A hash or revision did not resolve to a commit.
    #[error("no commit matches '{needle}'")]
    InvalidObject { needle: String },

    /// Stash commit is not in the stash list.
    #[error("stash not found: {id}")]
    StashNotFound { id: String },

    /// Git command execution failed.
    #[error("git command failed: {command} - {message}")]
    CommandFailed { command: String, message: String },

    /// Error from gix library.
    #[error("gix error: {0}")]
    Gix(#[from] GixError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// --- Process Errors ---

/// Process execution errors.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Executable not found in PATH.
    #[error("executable not found: '{name}' (not in PATH)")]
    ExecutableNotFound { name: String },

    /// Failed to spawn process.
    #[error("failed to spawn process '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

#[cfg(test)]
mod tests;
