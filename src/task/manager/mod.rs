// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Flow executor.
//!
//! ```text
//! TaskManager::new(repo, ui, driver)
//!   .with_suppressed_prompts()  .with_cancel_token()
//!   .run(task).await
//!       busy permit --> prereq gate --> drive flow --> report
//!                                           |
//!                   abort: show message     |   error: Taskable::on_error
//!                                           v          (may start a recovery task)
//!                                       TaskReport
//! ```
//!
//! One flow runs at a time per manager; a second `run` while one is in
//! flight is rejected with [`ExecError::Busy`]. Subtasks run inside the
//! parent's execution and do not take the permit again.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, warn};

use crate::error::{AbortSignal, ExecError, FlowError, FlowResult};
use crate::git::backend::Repository;
use crate::logging::task_span;
use crate::ui::{Choice, Message, Ui};
use crate::utility::trash::Trash;

use super::context::{FlowContext, PendingStep, StepRequest, StepResult, SubtaskOutcome};
use super::prereqs::check_prereqs;
use super::tools::ProcessDriver;
use super::tools::git::check_exit;
use super::{JumpTo, Recovery, Task, TaskEffects, TaskOutcome, TaskReport, Taskable};

/// Accumulated results of one driven flow.
struct FlowRun {
    effects: TaskEffects,
    status: Option<String>,
    jump_to: Option<JumpTo>,
    result: FlowResult<()>,
}

/// Manager for running operations against one repository.
pub struct TaskManager {
    repo: Arc<dyn Repository>,
    ui: Arc<dyn Ui>,
    driver: Arc<dyn ProcessDriver>,

    /// Single permit: one flow in flight at a time.
    permit: Semaphore,

    /// Cancellation token for host teardown.
    cancel_token: CancellationToken,

    /// "Don't show again" keys answered without asking.
    suppressed: Mutex<BTreeSet<String>>,

    trash: Option<Trash>,
}

impl TaskManager {
    #[must_use]
    pub fn new(repo: Arc<dyn Repository>, ui: Arc<dyn Ui>, driver: Arc<dyn ProcessDriver>) -> Self {
        Self {
            repo,
            ui,
            driver,
            permit: Semaphore::new(1),
            cancel_token: CancellationToken::new(),
            suppressed: Mutex::new(BTreeSet::new()),
            trash: None,
        }
    }

    /// Enables backups of deleted stashes.
    #[must_use]
    pub fn with_trash(mut self, trash: Trash) -> Self {
        self.trash = Some(trash);
        self
    }

    /// Prompts with these "don't show again" keys are accepted silently.
    #[must_use]
    pub fn with_suppressed_prompts<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut set) = self.suppressed.lock() {
            set.extend(keys.into_iter().map(Into::into));
        }
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Returns the cancellation token for sharing with the host.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Returns whether a flow is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.permit.available_permits() == 0
    }

    /// Keys suppressed so far, from configuration and user ticks.
    #[must_use]
    pub fn suppressed_prompts(&self) -> Vec<String> {
        self.suppressed
            .lock()
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn is_suppressed(&self, key: &str) -> bool {
        self.suppressed
            .lock()
            .is_ok_and(|set| set.contains(key))
    }

    /// Stops the executor from resolving further steps.
    ///
    /// The flow in flight fails with [`FlowError::Interrupted`] at its next
    /// step, or right away if it is waiting for the user. A git process
    /// already running is left to finish.
    pub fn interrupt_all(&self) {
        info!("Interrupting all tasks");
        self.cancel_token.cancel();
    }

    /// Runs an operation to the end.
    ///
    /// Aborts and flow errors are not `Err`: they are presented to the user
    /// and reported in [`TaskReport::outcome`].
    ///
    /// # Errors
    ///
    /// - [`ExecError::Busy`] if another operation is in flight
    /// - [`ExecError::PrereqViolation`] if the declared prerequisites do not
    ///   hold; nothing is executed and nothing is shown
    /// - [`ExecError::Snapshot`] if the repository state cannot be read
    pub async fn run(&self, task: impl Into<Task>) -> Result<TaskReport, ExecError> {
        let task = task.into();
        let Ok(_permit) = self.permit.try_acquire() else {
            warn!(task = task.name(), "rejected: another task is running");
            return Err(ExecError::Busy {
                requested: task.name().to_string(),
            });
        };
        self.run_gated(task).await
    }

    fn run_gated(&self, task: Task) -> BoxFuture<'_, Result<TaskReport, ExecError>> {
        Box::pin(async move {
            self.gate(&task).await?;

            info!(task = task.name(), "Starting task");
            let run = self.drive(&task, 0).await;

            let mut recovery = None;
            let outcome = match run.result {
                Ok(()) => {
                    info!(task = task.name(), effects = %run.effects.describe(), "Task completed");
                    TaskOutcome::Completed
                }
                Err(FlowError::Abort(signal)) => {
                    debug!(task = task.name(), %signal, "Task aborted");
                    if let Some(text) = signal.message()
                        && !self.is_cancelled()
                    {
                        self.ui.show_message(
                            &Message::builder()
                                .title(task.name())
                                .text(text)
                                .severity(signal.severity())
                                .details(signal.details().to_vec())
                                .build(),
                        );
                    }
                    TaskOutcome::Aborted(signal)
                }
                Err(error) => {
                    log_failure(task.name(), &error);
                    if self.is_cancelled() {
                        debug!(task = task.name(), "interrupted, skipping error handler");
                    } else if let Recovery::Invoke(next) = task.on_error(&error, self.ui.as_ref()) {
                        info!(task = task.name(), next = next.name(), "Starting recovery task");
                        match self.run_gated(*next).await {
                            Ok(report) => recovery = Some(Box::new(report)),
                            Err(gate_error) => {
                                error!(task = task.name(), error = %gate_error, "Recovery task did not start");
                            }
                        }
                    }
                    TaskOutcome::Failed(error.to_string())
                }
            };

            Ok(TaskReport {
                task: task.name(),
                effects: run.effects,
                status: run.status,
                jump_to: run.jump_to,
                outcome,
                recovery,
            })
        })
    }

    /// Checks the declared prerequisites against a fresh snapshot.
    async fn gate(&self, task: &Task) -> Result<(), ExecError> {
        let required = task.prereqs();
        if required.is_empty() {
            return Ok(());
        }

        let repo = Arc::clone(&self.repo);
        let state = tokio::task::spawn_blocking(move || repo.snapshot())
            .await
            .map_err(|e| ExecError::Internal(format!("snapshot worker failed: {e}")))??;

        check_prereqs(required, &state).map_err(|missing| {
            error!(task = task.name(), missing = %missing.describe(), "prerequisites not met");
            ExecError::PrereqViolation {
                task: task.name().to_string(),
                missing: missing.describe(),
            }
        })
    }

    /// Drives a flow until it completes, resolving each step it requests.
    fn drive<'a>(&'a self, task: &'a Task, depth: usize) -> BoxFuture<'a, FlowRun> {
        let span = task_span(task.name(), depth);
        Box::pin(
            async move {
                let (sender, mut steps) = mpsc::channel::<PendingStep>(1);
                let mut cx = FlowContext::new(task.name(), sender, self.trash.clone());

                let result = {
                    let mut flow = task.flow(&mut cx);
                    let mut step = 0usize;
                    loop {
                        tokio::select! {
                            result = &mut flow => break result,
                            Some(pending) = steps.recv() => {
                                step += 1;
                                let PendingStep { request, reply } = pending;
                                debug!(
                                    step,
                                    kind = request.kind(),
                                    context = %request.context(),
                                    "resolving step"
                                );
                                let answer = self.resolve(request, depth).await;
                                // The flow only drops the receiver when it is dropped itself.
                                let _ = reply.send(answer);
                            }
                        }
                    }
                };

                let (effects, status, jump_to) = cx.into_parts();
                FlowRun {
                    effects,
                    status,
                    jump_to,
                    result,
                }
            }
            .instrument(span),
        )
    }

    async fn resolve(&self, request: StepRequest, depth: usize) -> StepResult {
        if self.is_cancelled() {
            let what = match &request {
                StepRequest::InvokeSubtask(task) => task.name(),
                _ => "step",
            };
            return StepResult::Failed(FlowError::Interrupted(what.to_string()));
        }

        match request {
            StepRequest::RunOnWorker(job) => {
                let repo = Arc::clone(&self.repo);
                match tokio::task::spawn_blocking(move || job(repo.as_ref())).await {
                    Ok(()) => StepResult::Done,
                    Err(e) => StepResult::Failed(FlowError::internal(format!(
                        "worker job failed: {e}"
                    ))),
                }
            }
            StepRequest::RunOnUi(job) => {
                job(self.ui.as_ref());
                StepResult::Done
            }
            StepRequest::AwaitConfirmation(prompt) => {
                if let Some(key) = &prompt.dont_show_again {
                    if self.is_suppressed(key) {
                        debug!(key = %key, "prompt suppressed, accepting");
                        return StepResult::Choice(Choice::accept_defaults(&prompt));
                    }
                }
                let asked = prompt.clone();
                let choice = match self.ask_ui(move |ui| ui.confirm(&asked)).await {
                    Ok(choice) => choice,
                    Err(error) => return StepResult::Failed(error),
                };
                if choice.dont_show_again && !choice.is_cancelled() {
                    if let (Some(key), Ok(mut set)) =
                        (&prompt.dont_show_again, self.suppressed.lock())
                    {
                        set.insert(key.clone());
                    }
                }
                StepResult::Choice(choice)
            }
            StepRequest::AwaitDialog(spec) => {
                let asked = spec.clone();
                let form = match self.ask_ui(move |ui| ui.dialog(&asked)).await {
                    Ok(form) => form,
                    Err(error) => return StepResult::Failed(error),
                };
                if form.is_accepted() {
                    if let Some((field, problem)) = spec.validate(&form) {
                        return StepResult::Failed(
                            AbortSignal::warning(format!("{field}: {problem}")).into(),
                        );
                    }
                }
                StepResult::Form(form)
            }
            StepRequest::InvokeProcess(command) => {
                match self.driver.invoke(&command).await.and_then(check_exit) {
                    Ok(invocation) => StepResult::Process(invocation),
                    Err(error) => StepResult::Failed(error),
                }
            }
            StepRequest::InvokeSubtask(task) => {
                debug!(parent_depth = depth, subtask = task.name(), "entering subtask");
                let run = self.drive(&task, depth + 1).await;
                StepResult::Subtask(SubtaskOutcome {
                    effects: run.effects,
                    status: run.status,
                    jump_to: run.jump_to,
                    result: run.result,
                })
            }
        }
    }
}

impl TaskManager {
    /// Waits for the user on the blocking pool. Cancellation stops the wait;
    /// the UI call itself is left to return on its own.
    async fn ask_ui<T, F>(&self, ask: F) -> FlowResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Ui) -> T + Send + 'static,
    {
        let ui = Arc::clone(&self.ui);
        let answer = tokio::task::spawn_blocking(move || ask(ui.as_ref()));
        tokio::select! {
            answer = answer => match answer {
                Ok(answer) => Ok(answer),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => Err(FlowError::internal(format!("ui worker failed: {e}"))),
            },
            () = self.cancel_token.cancelled() => {
                info!("interrupted while waiting for the user");
                Err(FlowError::Interrupted("prompt".to_string()))
            }
        }
    }
}

/// Logs a failed flow at the level its kind deserves.
fn log_failure(task: &str, error: &FlowError) {
    match error {
        FlowError::PrereqViolation { .. } | FlowError::Internal(_) => {
            error!(task, error = %error, "Task failed");
        }
        FlowError::Interrupted(_) => info!(task, "Task interrupted"),
        _ => warn!(task, error = %error, "Task failed"),
    }
}
