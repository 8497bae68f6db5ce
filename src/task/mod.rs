// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Task execution system.
//!
//! # Architecture
//!
//! ```text
//! TaskManager::run(task)
//!      |
//!      |  busy permit, prereq gate (RepoState snapshot)
//!      v
//!   Task::flow(&mut FlowContext) ----- StepRequest ----->  executor loop
//!      ^                                                   |  RunOnWorker   -> spawn_blocking(repo)
//!      |                                                   |  RunOnUi       -> ui
//!      +------------------------------ StepResult <-------+  Confirmation  -> ui.confirm
//!                                                          |  Dialog        -> ui.dialog
//!                                                          |  Process       -> ProcessDriver
//!                                                          |  Subtask       -> nested flow
//!      |
//!      v
//!   TaskReport { effects, status, jump_to, outcome }
//! ```
//!
//! # Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`TaskManager`](manager::TaskManager) | Runs one flow at a time and resolves its steps |
//! | [`Task`] | Enum dispatching to the concrete operations |
//! | [`Taskable`] | Trait every operation implements |
//! | [`FlowContext`](context::FlowContext) | The flow's handle for steps and accumulated results |
//! | [`TaskEffects`] | What an operation changed, for cache invalidation |
//! | [`TaskPrereqs`] | Repository conditions an operation needs to start |
//!
//! # The Taskable Pattern
//!
//! Operations implement [`Taskable`]: a name, the prerequisites, the flow and
//! an optional error hook. The [`Task`] enum implements `Taskable` through the
//! `impl_taskable_for_task!` macro, which generates one match arm per variant
//! and a `From` conversion for each operation type.
//!
//! ## Adding a New Operation
//!
//! 1. Create the struct in a `tasks/` module
//! 2. Implement `Taskable` for it
//! 3. Add a variant with the same name to the `Task` enum
//! 4. Add the name to the `impl_taskable_for_task!` invocation

pub mod context;
pub mod helpers;
pub mod manager;
pub mod prereqs;
pub mod tasks;
pub mod tools;

#[cfg(test)]
pub(crate) mod test_utils;

use bitflags::bitflags;
use futures_util::future::BoxFuture;
use serde::Serialize;

use crate::error::{AbortSignal, FlowError, FlowResult, Severity};
use crate::git::types::CommitId;
use crate::ui::{Message, Ui};

use context::FlowContext;
use tasks::branches::{
    DeleteBranch, DeleteBranchFolder, EditUpstreamBranch, NewBranchFromCommit, NewBranchFromHead,
    NewBranchFromRef, RenameBranch, RenameBranchFolder, SwitchBranch,
};
use tasks::history::{FastForwardBranch, MergeBranch, RecallCommit, ResetHead};
use tasks::stash::{ApplyStash, DropStash, NewStash};

bitflags! {
    /// Repository state categories an operation touched.
    ///
    /// Hosts refresh only what the final set names.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct TaskEffects: u8 {
        /// Branches, tags, stashes or their targets.
        const REFS = 0x01;
        /// What HEAD points to.
        const HEAD = 0x02;
        /// Working tree or index contents.
        const WORKDIR = 0x04;
        /// Upstream tracking configuration.
        const UPSTREAMS = 0x08;
    }
}

bitflags! {
    /// Conditions that must hold before an operation starts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct TaskPrereqs: u8 {
        /// No unresolved merge conflicts.
        const NO_CONFLICTS = 0x01;
        /// HEAD has at least one commit.
        const NO_UNBORN = 0x02;
        /// HEAD is a branch.
        const NO_DETACHED = 0x04;
        /// Nothing is staged.
        const NO_STAGED_CHANGES = 0x08;
    }
}

/// Flag names joined by `", "`, or `"none"`.
fn describe_flags(names: impl Iterator<Item = &'static str>) -> String {
    let names: Vec<_> = names.collect();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

impl TaskEffects {
    #[must_use]
    pub fn describe(self) -> String {
        describe_flags(self.iter_names().map(|(name, _)| name))
    }
}

impl TaskPrereqs {
    #[must_use]
    pub fn describe(self) -> String {
        describe_flags(self.iter_names().map(|(name, _)| name))
    }
}

/// Where the host should navigate after the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "lowercase")]
pub enum JumpTo {
    /// A reference, by full name.
    Ref(String),
    /// The working directory view.
    Workdir,
    Commit(CommitId),
}

/// What to do after an operation failed.
#[derive(Debug, Clone)]
pub enum Recovery {
    None,
    /// Start another operation in its place.
    Invoke(Box<Task>),
}

/// How an operation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "lowercase")]
pub enum TaskOutcome {
    Completed,
    Aborted(AbortSignal),
    Failed(String),
}

/// Result of [`TaskManager::run`](manager::TaskManager::run).
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub task: &'static str,
    /// Effects accumulated until the flow stopped, also on abort or failure.
    pub effects: TaskEffects,
    pub status: Option<String>,
    pub jump_to: Option<JumpTo>,
    pub outcome: TaskOutcome,
    /// Report of the operation started by [`Recovery::Invoke`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery: Option<Box<TaskReport>>,
}

impl TaskReport {
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Completed)
    }

    /// Effects of this operation and of its recovery, if any.
    #[must_use]
    pub fn all_effects(&self) -> TaskEffects {
        let recovered = self
            .recovery
            .as_ref()
            .map_or(TaskEffects::empty(), |r| r.all_effects());
        self.effects | recovered
    }
}

/// Trait for operation implementations.
///
/// The flow reads as a straight narrative; every `await` on the
/// [`FlowContext`] is a suspension point resolved by the executor.
///
/// # Example
///
/// ```ignore
/// impl Taskable for DeleteBranch {
///     fn name(&self) -> &'static str { "DeleteBranch" }
///     fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
///         Box::pin(async move {
///             cx.confirm(prompt).await?;
///             cx.add_effects(TaskEffects::REFS);
///             cx.with_repo(move |repo| repo.delete_branch(&name)).await?;
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Taskable {
    /// Operation name, used as message title and in logs.
    fn name(&self) -> &'static str;

    /// Conditions checked before the flow starts.
    fn prereqs(&self) -> TaskPrereqs {
        TaskPrereqs::empty()
    }

    /// The operation's flow.
    fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>>;

    /// Called on the UI context when the flow failed with anything but an
    /// abort. The default shows the error.
    fn on_error(&self, error: &FlowError, ui: &dyn Ui) -> Recovery {
        show_error(self.name(), error, ui);
        Recovery::None
    }
}

/// Presents a failed operation to the user.
pub fn show_error(task: &str, error: &FlowError, ui: &dyn Ui) {
    let (text, details) = match error {
        FlowError::Process(failure) => (
            format!(
                "Operation failed: git exited with code {}.",
                failure.exit_code
            ),
            failure
                .stderr
                .lines()
                .map(ToString::to_string)
                .chain(std::iter::once(failure.command.clone()))
                .collect(),
        ),
        other => (format!("Operation failed: {other}"), Vec::new()),
    };
    ui.show_message(
        &Message::builder()
            .title(task)
            .text(text)
            .severity(Severity::Critical)
            .details(details)
            .build(),
    );
}

/// A repository operation.
///
/// This enum uses compile-time dispatch. New operations are added as
/// variants named after their struct.
#[derive(Debug, Clone)]
pub enum Task {
    SwitchBranch(SwitchBranch),
    RenameBranch(RenameBranch),
    RenameBranchFolder(RenameBranchFolder),
    DeleteBranch(DeleteBranch),
    DeleteBranchFolder(DeleteBranchFolder),
    NewBranchFromCommit(NewBranchFromCommit),
    NewBranchFromHead(NewBranchFromHead),
    NewBranchFromRef(NewBranchFromRef),
    EditUpstreamBranch(EditUpstreamBranch),
    ResetHead(ResetHead),
    FastForwardBranch(FastForwardBranch),
    MergeBranch(MergeBranch),
    RecallCommit(RecallCommit),
    NewStash(NewStash),
    ApplyStash(ApplyStash),
    DropStash(DropStash),
}

/// Macro to implement Taskable for Task enum by delegating to inner types.
macro_rules! impl_taskable_for_task {
    ($($variant:ident),+ $(,)?) => {
        impl Taskable for Task {
            fn name(&self) -> &'static str {
                match self {
                    $(Task::$variant(t) => Taskable::name(t),)+
                }
            }

            fn prereqs(&self) -> TaskPrereqs {
                match self {
                    $(Task::$variant(t) => Taskable::prereqs(t),)+
                }
            }

            fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
                match self {
                    $(Task::$variant(t) => Taskable::flow(t, cx),)+
                }
            }

            fn on_error(&self, error: &FlowError, ui: &dyn Ui) -> Recovery {
                match self {
                    $(Task::$variant(t) => Taskable::on_error(t, error, ui),)+
                }
            }
        }

        $(
            impl From<$variant> for Task {
                fn from(task: $variant) -> Self {
                    Task::$variant(task)
                }
            }
        )+
    };
}

impl_taskable_for_task!(
    SwitchBranch,
    RenameBranch,
    RenameBranchFolder,
    DeleteBranch,
    DeleteBranchFolder,
    NewBranchFromCommit,
    NewBranchFromHead,
    NewBranchFromRef,
    EditUpstreamBranch,
    ResetHead,
    FastForwardBranch,
    MergeBranch,
    RecallCommit,
    NewStash,
    ApplyStash,
    DropStash,
);
