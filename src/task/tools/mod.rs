// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! External process bridge used by flows.
//!
//! ```text
//! FlowContext::run_git(GitCommand)
//!     --> executor --> ProcessDriver::invoke --> ProcessInvocation
//!                          |                           |
//!                      GitDriver                  check_exit
//!                  (ProcessBuilder)       (fail_on_nonzero -> FlowError)
//! ```

use futures_util::future::BoxFuture;

use crate::error::FlowResult;

pub mod git;

use git::{GitCommand, ProcessInvocation};

/// Runs git commands for the executor.
///
/// Implementations capture the output and return the exit code as data;
/// the executor decides whether a non-zero exit is fatal.
pub trait ProcessDriver: Send + Sync {
    /// Returns the name of this driver, for logs.
    fn name(&self) -> &str;

    /// Runs `command` to completion.
    ///
    /// # Errors
    ///
    /// Only when the process could not be started or awaited.
    fn invoke<'a>(&'a self, command: &'a GitCommand)
    -> BoxFuture<'a, FlowResult<ProcessInvocation>>;
}
