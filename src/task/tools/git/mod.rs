// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git command descriptors and the process driver that runs them.
//!
//! ```text
//! GitCommand    args + fail_on_nonzero         (what a flow asks for)
//! GitDriver     ProcessBuilder, config env,    (how the executor runs it)
//!               no terminal prompts
//! ProcessInvocation  exit code, stdout, stderr, command line
//! ```
//!
//! Output lines are forwarded to the log as they arrive and kept in the
//! invocation for the flow to inspect.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{BoxFuture, ProcessDriver};
use crate::config::types::GitConfig;
use crate::core::process::builder::{ProcessBuilder, ProcessFlags};
use crate::error::{FlowError, FlowResult, ProcessError, ProcessFailure};

/// A git invocation requested by a flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommand {
    args: Vec<String>,
    fail_on_nonzero: bool,
}

impl GitCommand {
    /// Creates a command that fails the step on a non-zero exit.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            fail_on_nonzero: true,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends `arg` only when `condition` holds.
    #[must_use]
    pub fn arg_if(self, condition: bool, arg: impl Into<String>) -> Self {
        if condition { self.arg(arg) } else { self }
    }

    /// Returns the exit code as data instead of failing the step.
    #[must_use]
    pub const fn allow_failure(mut self) -> Self {
        self.fail_on_nonzero = false;
        self
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub const fn fail_on_nonzero(&self) -> bool {
        self.fail_on_nonzero
    }

    /// `git` followed by the arguments, quoted where needed.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once("git".to_string())
            .chain(self.args.iter().map(|a| {
                if a.is_empty() || a.contains(char::is_whitespace) {
                    format!("\"{a}\"")
                } else {
                    a.clone()
                }
            }))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Outcome of one git run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub fail_on_nonzero: bool,
}

impl ProcessInvocation {
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Non-empty lines of standard error.
    pub fn stderr_lines(&self) -> impl Iterator<Item = &str> {
        self.stderr.lines().filter(|l| !l.trim().is_empty())
    }
}

/// Applies the fail-on-nonzero flag of an invocation.
///
/// # Errors
///
/// Returns [`FlowError::Process`] when the invocation demanded success and
/// exited non-zero.
pub fn check_exit(invocation: ProcessInvocation) -> FlowResult<ProcessInvocation> {
    if invocation.fail_on_nonzero && !invocation.success() {
        warn!(
            cmd = %invocation.command,
            exit_code = invocation.exit_code,
            "git command failed"
        );
        return Err(ProcessFailure {
            command: invocation.command,
            exit_code: invocation.exit_code,
            stderr: invocation.stderr,
        }
        .into());
    }
    Ok(invocation)
}

/// Runs git commands in a working directory.
#[derive(Debug, Clone)]
pub struct GitDriver {
    executable: PathBuf,
    workdir: PathBuf,
    env: BTreeMap<String, String>,
}

impl GitDriver {
    /// Creates a driver for `workdir` using the `[git]` configuration.
    ///
    /// A bare executable name is looked up in `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::ExecutableNotFound`] if git cannot be found.
    pub fn new(workdir: &Path, config: &GitConfig) -> Result<Self, ProcessError> {
        let configured = config.executable.as_path();
        let executable = if configured.components().count() > 1 {
            configured.to_path_buf()
        } else {
            ProcessBuilder::which(&configured.to_string_lossy())?
                .program()
                .to_path_buf()
        };
        debug!(git = %executable.display(), "using git executable");

        Ok(Self {
            executable,
            workdir: workdir.to_path_buf(),
            env: config.env.clone(),
        })
    }

    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl ProcessDriver for GitDriver {
    fn name(&self) -> &'static str {
        "git"
    }

    fn invoke<'a>(
        &'a self,
        command: &'a GitCommand,
    ) -> BoxFuture<'a, FlowResult<ProcessInvocation>> {
        Box::pin(async move {
            let output = ProcessBuilder::new(&self.executable)
                .args(command.args())
                .cwd(&self.workdir)
                .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .env("GIT_TERMINAL_PROMPT", "0")
                .env("GCM_INTERACTIVE", "never")
                .flag(ProcessFlags::ALLOW_FAILURE)
                .capture_output()
                .name("git")
                .run()
                .await
                .map_err(|e| FlowError::internal(format!("{e:#}")))?;

            let (exit_code, stdout, stderr) = output.into_parts();
            Ok(ProcessInvocation {
                command: command.command_line(),
                exit_code,
                stdout,
                stderr,
                fail_on_nonzero: command.fail_on_nonzero(),
            })
        })
    }
}

#[cfg(test)]
mod tests;
