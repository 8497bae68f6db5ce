// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Step protocol between a flow and the executor.
//!
//! ```text
//!  flow                                   executor
//!   |  PendingStep { request, reply } ──>   |
//!   |  (suspended on reply)                 |  resolve on UI or worker context
//!   |  <── StepResult via reply channel     |
//!   v                                       v
//! ```
//!
//! A flow owns a [`FlowContext`] for the duration of one execution. The
//! context sends each suspension point to the executor over a channel of
//! capacity one and waits for the answer, so steps run strictly in order.
//! It also holds the accumulated effects, status message and jump target.

use std::fmt;

use tokio::sync::{mpsc, oneshot};

use crate::error::{AbortSignal, FlowError, FlowResult};
use crate::git::backend::Repository;
use crate::ui::{Choice, DialogSpec, FormResult, Prompt, Ui};
use crate::utility::trash::Trash;

use super::prereqs::check_prereqs;
use super::tools::git::{GitCommand, ProcessInvocation};
use super::{JumpTo, Task, TaskEffects, TaskPrereqs, Taskable};

/// Work shipped to the worker context.
pub type WorkerJob = Box<dyn FnOnce(&dyn Repository) + Send>;

/// Work shipped to the UI context.
pub type UiJob = Box<dyn FnOnce(&dyn Ui) + Send>;

/// Where a step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadContext {
    /// The task driving the flow; the only place UI calls happen.
    Ui,
    /// The blocking pool (backend calls) or the process reactor.
    Worker,
}

impl fmt::Display for ThreadContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ui => f.write_str("ui"),
            Self::Worker => f.write_str("worker"),
        }
    }
}

/// A suspension point's declared need.
pub enum StepRequest {
    RunOnWorker(WorkerJob),
    RunOnUi(UiJob),
    AwaitConfirmation(Prompt),
    AwaitDialog(DialogSpec),
    InvokeProcess(GitCommand),
    InvokeSubtask(Box<Task>),
}

impl StepRequest {
    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RunOnWorker(_) => "worker",
            Self::RunOnUi(_) => "ui",
            Self::AwaitConfirmation(_) => "confirm",
            Self::AwaitDialog(_) => "dialog",
            Self::InvokeProcess(_) => "process",
            Self::InvokeSubtask(_) => "subtask",
        }
    }

    /// The context the executor resolves this request on.
    #[must_use]
    pub const fn context(&self) -> ThreadContext {
        match self {
            Self::RunOnWorker(_) | Self::InvokeProcess(_) => ThreadContext::Worker,
            Self::RunOnUi(_)
            | Self::AwaitConfirmation(_)
            | Self::AwaitDialog(_)
            | Self::InvokeSubtask(_) => ThreadContext::Ui,
        }
    }
}

impl fmt::Debug for StepRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitConfirmation(p) => write!(f, "AwaitConfirmation({:?})", p.title),
            Self::AwaitDialog(d) => write!(f, "AwaitDialog({:?})", d.title),
            Self::InvokeProcess(c) => write!(f, "InvokeProcess({})", c.command_line()),
            Self::InvokeSubtask(t) => write!(f, "InvokeSubtask({})", t.name()),
            other => f.write_str(other.kind()),
        }
    }
}

/// Everything a finished subtask hands back to its parent.
#[derive(Debug)]
pub struct SubtaskOutcome {
    pub effects: TaskEffects,
    pub status: Option<String>,
    pub jump_to: Option<JumpTo>,
    pub result: FlowResult<()>,
}

/// The executor's answer to a [`StepRequest`].
#[derive(Debug)]
pub enum StepResult {
    Done,
    Choice(Choice),
    Form(FormResult),
    Process(ProcessInvocation),
    Subtask(SubtaskOutcome),
    Failed(FlowError),
}

/// A request in flight, with the channel for its answer.
pub struct PendingStep {
    pub request: StepRequest,
    pub reply: oneshot::Sender<StepResult>,
}

/// The flow's handle on the executor and on its own accumulated results.
pub struct FlowContext {
    task: &'static str,
    sender: mpsc::Sender<PendingStep>,
    trash: Option<Trash>,
    effects: TaskEffects,
    status: Option<String>,
    jump_to: Option<JumpTo>,
}

impl FlowContext {
    pub(crate) const fn new(
        task: &'static str,
        sender: mpsc::Sender<PendingStep>,
        trash: Option<Trash>,
    ) -> Self {
        Self {
            task,
            sender,
            trash,
            effects: TaskEffects::empty(),
            status: None,
            jump_to: None,
        }
    }

    /// Name of the operation this context belongs to.
    #[must_use]
    pub const fn task(&self) -> &'static str {
        self.task
    }

    /// Where backups of deleted objects go, if enabled.
    #[must_use]
    pub fn trash(&self) -> Option<Trash> {
        self.trash.clone()
    }

    #[must_use]
    pub const fn effects(&self) -> TaskEffects {
        self.effects
    }

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    #[must_use]
    pub const fn jump_target(&self) -> Option<&JumpTo> {
        self.jump_to.as_ref()
    }

    /// Declares effects. Effects only ever grow.
    pub fn add_effects(&mut self, effects: TaskEffects) {
        self.effects |= effects;
    }

    /// Sets the message shown once the operation ends.
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn jump_to(&mut self, target: JumpTo) {
        self.jump_to = Some(target);
    }

    pub(crate) fn into_parts(self) -> (TaskEffects, Option<String>, Option<JumpTo>) {
        (self.effects, self.status, self.jump_to)
    }

    async fn request(&mut self, request: StepRequest) -> FlowResult<StepResult> {
        let (reply, answer) = oneshot::channel();
        self.sender
            .send(PendingStep { request, reply })
            .await
            .map_err(|_| FlowError::Interrupted(self.task.to_string()))?;

        match answer.await {
            Ok(StepResult::Failed(error)) => Err(error),
            Ok(result) => Ok(result),
            Err(_) => Err(FlowError::Interrupted(self.task.to_string())),
        }
    }

    fn unexpected(&self, expected: &str, got: &StepResult) -> FlowError {
        FlowError::internal(format!(
            "{}: expected {expected} result, got {got:?}",
            self.task
        ))
    }

    /// Runs `job` on the worker context and returns its value.
    ///
    /// # Errors
    ///
    /// Fails if the executor is interrupted or the job panics.
    pub async fn on_worker<T, F>(&mut self, job: F) -> FlowResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Repository) -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.request(StepRequest::RunOnWorker(Box::new(move |repo| {
            // The receiver is only gone if the flow was dropped.
            let _ = tx.send(job(repo));
        })))
        .await?;
        rx.await
            .map_err(|_| FlowError::internal(format!("{}: worker job lost its result", self.task)))
    }

    /// [`on_worker`](Self::on_worker) for backend calls that may fail.
    ///
    /// # Errors
    ///
    /// Propagates the backend error as [`FlowError::Repo`].
    pub async fn with_repo<T, F>(&mut self, job: F) -> FlowResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Repository) -> crate::error::RepoResult<T> + Send + 'static,
    {
        Ok(self.on_worker(job).await??)
    }

    /// Runs `job` on the UI context and returns its value.
    ///
    /// # Errors
    ///
    /// Fails if the executor is interrupted.
    pub async fn on_ui<T, F>(&mut self, job: F) -> FlowResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Ui) -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.request(StepRequest::RunOnUi(Box::new(move |ui| {
            let _ = tx.send(job(ui));
        })))
        .await?;
        rx.await
            .map_err(|_| FlowError::internal(format!("{}: ui job lost its result", self.task)))
    }

    /// Asks a question and returns the raw answer, cancellation included.
    ///
    /// # Errors
    ///
    /// Fails if the executor is interrupted.
    pub async fn ask(&mut self, prompt: Prompt) -> FlowResult<Choice> {
        match self.request(StepRequest::AwaitConfirmation(prompt)).await? {
            StepResult::Choice(choice) => Ok(choice),
            other => Err(self.unexpected("choice", &other)),
        }
    }

    /// Asks a question; cancelling aborts the flow silently.
    ///
    /// # Errors
    ///
    /// Returns a silent [`FlowError::Abort`] when the user cancels.
    pub async fn confirm(&mut self, prompt: Prompt) -> FlowResult<Choice> {
        let choice = self.ask(prompt).await?;
        if choice.is_cancelled() {
            return Err(AbortSignal::silent().into());
        }
        Ok(choice)
    }

    /// Shows a form; cancelling aborts the flow silently.
    ///
    /// # Errors
    ///
    /// Returns a silent [`FlowError::Abort`] when the user cancels.
    pub async fn dialog(&mut self, spec: DialogSpec) -> FlowResult<FormResult> {
        match self.request(StepRequest::AwaitDialog(spec)).await? {
            StepResult::Form(form) if form.is_accepted() => Ok(form),
            StepResult::Form(_) => Err(AbortSignal::silent().into()),
            other => Err(self.unexpected("form", &other)),
        }
    }

    /// Runs git off the UI context.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Process`] on a non-zero exit unless the command
    /// allows failure.
    pub async fn run_git(&mut self, command: GitCommand) -> FlowResult<ProcessInvocation> {
        match self.request(StepRequest::InvokeProcess(command)).await? {
            StepResult::Process(invocation) => Ok(invocation),
            other => Err(self.unexpected("process", &other)),
        }
    }

    /// Runs another operation to completion as part of this flow.
    ///
    /// The subtask's prerequisites are not checked. Its effects are merged
    /// into this flow's whether it succeeds or not, and its status and jump
    /// target fill in this flow's if unset.
    ///
    /// # Errors
    ///
    /// Propagates the subtask's abort or error.
    pub async fn subtask(&mut self, task: impl Into<Task>) -> FlowResult<()> {
        match self
            .request(StepRequest::InvokeSubtask(Box::new(task.into())))
            .await?
        {
            StepResult::Subtask(outcome) => {
                self.effects |= outcome.effects;
                if self.status.is_none() {
                    self.status = outcome.status;
                }
                if self.jump_to.is_none() {
                    self.jump_to = outcome.jump_to;
                }
                outcome.result
            }
            other => Err(self.unexpected("subtask", &other)),
        }
    }

    /// Re-checks prerequisites against the current repository state.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::PrereqViolation`] naming the missing conditions.
    pub async fn check_prereqs(&mut self, required: TaskPrereqs) -> FlowResult<()> {
        let state = self.with_repo(|repo| repo.snapshot()).await?;
        check_prereqs(required, &state).map_err(|missing| FlowError::PrereqViolation {
            task: self.task.to_string(),
            missing: missing.describe(),
        })
    }
}
