// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Local branch operations.
//!
//! ```text
//! SwitchBranch         confirm --> [detached warning] --> git checkout
//! RenameBranch         dialog(name) --> rename
//! RenameBranchFolder   dialog(folder) --> rename each branch under it
//! DeleteBranch         confirm --> delete
//! DeleteBranchFolder   confirm(list) --> delete each branch under it
//! NewBranchFromCommit  dialog(name, upstream, switch) --> create --> [SwitchBranch]
//! NewBranchFromHead    --> NewBranchFromCommit | NewBranchFromRef
//! NewBranchFromRef     --> NewBranchFromCommit with upstream suggestion
//! EditUpstreamBranch   --> set or clear upstream
//! ```

use futures_util::future::BoxFuture;

use crate::error::{AbortSignal, FlowError, FlowResult, Severity};
use crate::git::types::{Branch, CommitId, HEADS_PREFIX, HeadState, RefKind, split_refname};
use crate::task::context::FlowContext;
use crate::task::helpers::{message_summary, plural, quote, rename_in_folder, with_unique_suffix};
use crate::task::{TaskEffects, TaskPrereqs, Taskable};
use crate::task::tools::git::GitCommand;
use crate::ui::{Checkbox, DialogSpec, Field, Prompt, TextRule};

const NAME_TAKEN: &str = "This name is already taken by another local branch.";

// --- SwitchBranch ---

/// Checks out a local branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchBranch {
    pub branch: String,
    pub ask: bool,
    pub recurse_submodules: bool,
}

impl SwitchBranch {
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            ask: true,
            recurse_submodules: false,
        }
    }

    /// Switches without the confirmation prompt.
    #[must_use]
    pub const fn without_confirmation(mut self, recurse_submodules: bool) -> Self {
        self.ask = false;
        self.recurse_submodules = recurse_submodules;
        self
    }
}

impl Taskable for SwitchBranch {
    fn name(&self) -> &'static str {
        "SwitchBranch"
    }

    fn prereqs(&self) -> TaskPrereqs {
        TaskPrereqs::NO_CONFLICTS
    }

    fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
        Box::pin(async move {
            let name = self.branch.clone();
            let (branch, head, submodules) = cx
                .with_repo(move |repo| {
                    Ok((
                        repo.local_branch(&name)?,
                        repo.head()?,
                        repo.submodule_paths()?,
                    ))
                })
                .await?;

            if branch.checked_out {
                return Err(AbortSignal::information(format!(
                    "Branch {} is already checked out.",
                    quote(&branch.name)
                ))
                .into());
            }

            let mut recurse = self.recurse_submodules;
            if self.ask {
                let checkbox = (!submodules.is_empty()).then(|| Checkbox {
                    label: "Update submodules recursively".to_string(),
                    checked: true,
                });
                let choice = cx
                    .confirm(
                        Prompt::builder()
                            .title(self.name())
                            .text(format!(
                                "Do you want to switch to branch {}?",
                                quote(&branch.name)
                            ))
                            .verb("Switch")
                            .maybe_checkbox(checkbox)
                            .build(),
                    )
                    .await?;
                recurse = choice.checked.unwrap_or(false);
            }

            if let HeadState::Detached { commit } = &head
                && *commit != branch.target
            {
                cx.confirm(
                    Prompt::builder()
                        .title(self.name())
                        .text(format!(
                            "You are in Detached HEAD mode at commit {}. \
                             You might lose track of this commit if you switch to {}.",
                            quote(commit.short()),
                            quote(&branch.name)
                        ))
                        .verb(format!("Switch to {}", quote(&branch.name)))
                        .cancel_label("Don't Switch")
                        .severity(Severity::Warning)
                        .build(),
                )
                .await?;
            }

            cx.add_effects(TaskEffects::REFS | TaskEffects::HEAD);
            cx.run_git(
                GitCommand::new(["checkout", "--progress", "--no-guess"])
                    .arg_if(recurse, "--recurse-submodules")
                    .arg(&branch.name),
            )
            .await?;

            cx.set_status(format!("Switched to branch {}.", quote(&branch.name)));
            Ok(())
        })
    }
}

// --- RenameBranch ---

/// Renames a local branch through a name dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameBranch {
    pub branch: String,
}

impl RenameBranch {
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
        }
    }
}

impl Taskable for RenameBranch {
    fn name(&self) -> &'static str {
        "RenameBranch"
    }

    fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
        Box::pin(async move {
            let old = self.branch.clone();
            let reserved = {
                let old = old.clone();
                cx.with_repo(move |repo| {
                    let mut names = repo.local_branch_names()?;
                    names.retain(|n| *n != old);
                    Ok(names)
                })
                .await?
            };

            let form = cx
                .dialog(
                    DialogSpec::builder()
                        .title("Rename local branch")
                        .text("Enter new name:")
                        .subtitle(format!("Current name: {old}"))
                        .fields(vec![Field::text("name", "Name", &old).with_rule(
                            TextRule::BranchName {
                                reserved,
                                taken_message: NAME_TAKEN.to_string(),
                            },
                        )])
                        .accept_label("Rename")
                        .build(),
                )
                .await?;
            let new = form.text("name").unwrap_or_default().to_string();

            if new == old {
                return Err(AbortSignal::silent().into());
            }

            cx.add_effects(TaskEffects::REFS);
            {
                let (old, new) = (old.clone(), new.clone());
                cx.with_repo(move |repo| repo.rename_branch(&old, &new))
                    .await?;
            }

            cx.set_status(format!(
                "Branch {} renamed to {}.",
                quote(&old),
                quote(&new)
            ));
            Ok(())
        })
    }
}

// --- RenameBranchFolder ---

/// Moves every branch under `folder/` to another folder, or to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameBranchFolder {
    pub folder: String,
}

impl RenameBranchFolder {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Splits local branch names into those under `folder/` and the others.
fn partition_folder(names: Vec<String>, folder: &str) -> (Vec<String>, Vec<String>) {
    let prefix = format!("{folder}/");
    names.into_iter().partition(|n| n.starts_with(&prefix))
}

impl Taskable for RenameBranchFolder {
    fn name(&self) -> &'static str {
        "RenameBranchFolder"
    }

    fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
        Box::pin(async move {
            let old = self.folder.clone();
            let names = cx.with_repo(|repo| repo.local_branch_names()).await?;
            let (branches, reserved) = partition_folder(names, &old);

            let form = cx
                .dialog(
                    DialogSpec::builder()
                        .title("Rename branch folder")
                        .text("Enter new name:")
                        .subtitle(format!(
                            "Folder {} contains {}.",
                            quote(&old),
                            plural(branches.len(), "branch", "branches")
                        ))
                        .fields(vec![
                            Field::text("name", "Name", &old)
                                .with_placeholder(
                                    "Leave blank to move the branches to the root folder.",
                                )
                                .with_rule(TextRule::BranchFolder {
                                    old_folder: old.clone(),
                                    branches: branches.clone(),
                                    reserved,
                                }),
                        ])
                        .accept_label("Rename")
                        .build(),
                )
                .await?;
            let new = form.text("name").unwrap_or_default().to_string();

            if new == old {
                return Err(AbortSignal::silent().into());
            }

            cx.add_effects(TaskEffects::REFS);
            let count = branches.len();
            {
                let (old, new) = (old.clone(), new.clone());
                cx.with_repo(move |repo| {
                    for branch in &branches {
                        repo.rename_branch(branch, &rename_in_folder(branch, &old, &new))?;
                    }
                    Ok(())
                })
                .await?;
            }

            cx.set_status(format!(
                "Branch folder {} renamed to {}. {} affected.",
                quote(&old),
                quote(&new),
                plural(count, "branch", "branches")
            ));
            Ok(())
        })
    }
}

// --- DeleteBranch ---

/// Deletes a local branch that is not checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteBranch {
    pub branch: String,
}

impl DeleteBranch {
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
        }
    }
}

impl Taskable for DeleteBranch {
    fn name(&self) -> &'static str {
        "DeleteBranch"
    }

    fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
        Box::pin(async move {
            let name = self.branch.clone();
            let head = cx.with_repo(|repo| repo.head()).await?;

            if head.branch_name() == Some(name.as_str()) {
                return Err(AbortSignal::warning(format!(
                    "Cannot delete {} because it is the current branch. \
                     Before you try again, switch to another branch.",
                    quote(&name)
                ))
                .into());
            }

            cx.confirm(
                Prompt::builder()
                    .title(self.name())
                    .text(format!(
                        "Really delete local branch {}? This cannot be undone!",
                        quote(&name)
                    ))
                    .verb("Delete branch")
                    .build(),
            )
            .await?;

            cx.add_effects(TaskEffects::REFS);
            let target = {
                let name = name.clone();
                cx.with_repo(move |repo| {
                    let target = repo.local_branch(&name)?.target;
                    repo.delete_branch(&name)?;
                    Ok(target)
                })
                .await?
            };

            cx.set_status(format!(
                "Branch {} deleted (commit at tip was {}).",
                quote(&name),
                quote(target.short())
            ));
            Ok(())
        })
    }
}

// --- DeleteBranchFolder ---

/// Deletes every branch under `folder/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteBranchFolder {
    pub folder: String,
}

impl DeleteBranchFolder {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Taskable for DeleteBranchFolder {
    fn name(&self) -> &'static str {
        "DeleteBranchFolder"
    }

    fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
        Box::pin(async move {
            let folder = self.folder.clone();
            let (head, names) = cx
                .with_repo(|repo| Ok((repo.head()?, repo.local_branch_names()?)))
                .await?;

            if let Some(current) = head.branch_name()
                && current.starts_with(&format!("{folder}/"))
            {
                return Err(AbortSignal::warning(format!(
                    "Cannot delete folder {} because it contains the current branch {}. \
                     Before you try again, switch to another branch.",
                    quote(&folder),
                    quote(current)
                ))
                .into());
            }

            let (branches, _) = partition_folder(names, &folder);

            cx.confirm(
                Prompt::builder()
                    .title("Delete branch folder")
                    .text(format!(
                        "Really delete local branch folder {}? {} will be deleted. \
                         This cannot be undone!",
                        quote(&folder),
                        plural(branches.len(), "branch", "branches")
                    ))
                    .details(branches.clone())
                    .verb("Delete folder")
                    .build(),
            )
            .await?;

            cx.add_effects(TaskEffects::REFS);
            let count = branches.len();
            cx.with_repo(move |repo| {
                for branch in &branches {
                    repo.delete_branch(branch)?;
                }
                Ok(())
            })
            .await?;

            cx.set_status(format!(
                "{} deleted in folder {}.",
                plural(count, "branch", "branches"),
                quote(&folder)
            ));
            Ok(())
        })
    }
}

// --- NewBranchFromCommit ---

/// Creates a branch on a commit, optionally tracking an upstream and
/// switching to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBranchFromCommit {
    pub tip: CommitId,
    /// Suggested name; derived from refs at the tip when empty.
    pub name: String,
    /// Upstream shorthand to preselect, if offered.
    pub suggest_upstream: String,
    pub check_upstream: bool,
}

impl NewBranchFromCommit {
    pub fn new(tip: CommitId) -> Self {
        Self {
            tip,
            name: String::new(),
            suggest_upstream: String::new(),
            check_upstream: false,
        }
    }
}

/// Repository facts gathered before the new branch dialog.
struct NewBranchFacts {
    head: HeadState,
    refs: Vec<String>,
    branches: Vec<Branch>,
    summary: String,
    has_submodules: bool,
    conflicts: bool,
}

/// Suggested name and candidate upstreams from the refs pointing at the tip.
fn suggest_from_refs(mut name: String, refs: &[String], branches: &[Branch]) -> (String, Vec<String>) {
    let mut upstreams: Vec<String> = Vec::new();
    for refname in refs {
        match split_refname(refname) {
            (RefKind::Local, short) => {
                if name.is_empty() {
                    name = short.to_string();
                }
                if let Some(upstream) = branches
                    .iter()
                    .find(|b| b.name == short)
                    .and_then(Branch::upstream_shorthand)
                {
                    upstreams.push(upstream.to_string());
                }
            }
            (RefKind::Remote, short) => {
                if name.is_empty() {
                    name = short.split_once('/').map_or(short, |(_, b)| b).to_string();
                }
                upstreams.push(short.to_string());
            }
            (RefKind::Other, _) => {}
        }
    }

    let mut seen = std::collections::HashSet::new();
    upstreams.retain(|u| seen.insert(u.clone()));
    (name, upstreams)
}

impl Taskable for NewBranchFromCommit {
    fn name(&self) -> &'static str {
        "NewBranchFromCommit"
    }

    fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
        Box::pin(async move {
            let tip = self.tip.clone();
            let facts = {
                let tip = tip.clone();
                cx.with_repo(move |repo| {
                    let status = repo.status()?;
                    Ok(NewBranchFacts {
                        head: repo.head()?,
                        refs: repo.refs_pointing_at(&tip)?,
                        branches: repo.local_branches()?,
                        summary: message_summary(&repo.commit_message(&tip)?).0,
                        has_submodules: !repo.submodule_paths()?.is_empty(),
                        conflicts: status.iter().any(|f| f.is_conflicted()),
                    })
                })
                .await?
            };

            let mut tip_text = tip.short().to_string();
            let mut name = self.name.clone();
            if let HeadState::Branch {
                name: head_name,
                commit,
            } = &facts.head
                && *commit == tip
            {
                tip_text = format!("HEAD ({tip_text})");
                if name.is_empty() {
                    name = head_name.clone();
                }
            }

            let (name, upstreams) = suggest_from_refs(name, &facts.refs, &facts.branches);
            let reserved: Vec<String> = facts.branches.iter().map(|b| b.name.clone()).collect();
            let name = with_unique_suffix(&name, &reserved);

            let mut fields = vec![Field::text("name", "Name", name).with_rule(TextRule::BranchName {
                reserved,
                taken_message: NAME_TAKEN.to_string(),
            })];
            if !upstreams.is_empty() {
                let suggested = upstreams.iter().position(|u| *u == self.suggest_upstream);
                fields.push(Field::checkbox(
                    "track",
                    "Track upstream branch",
                    suggested.is_some() && self.check_upstream,
                ));
                fields.push(Field::choice(
                    "upstream",
                    "Upstream branch",
                    upstreams.clone(),
                    suggested.unwrap_or(0),
                ));
            }
            let switch = Field::checkbox("switch", "Switch to branch after creating", !facts.conflicts);
            fields.push(if facts.conflicts { switch.disabled() } else { switch });
            if facts.has_submodules {
                fields.push(Field::checkbox("recurse", "Update submodules recursively", true));
            }

            let form = cx
                .dialog(
                    DialogSpec::builder()
                        .title("New branch")
                        .text(format!("Create a local branch on commit {tip_text}."))
                        .subtitle(facts.summary)
                        .fields(fields)
                        .accept_label("Create")
                        .build(),
                )
                .await?;

            let name = form.text("name").unwrap_or_default().to_string();
            let switch_to = form.checked("switch").unwrap_or(false) && !facts.conflicts;
            let recurse = form.checked("recurse").unwrap_or(false);
            let track = if form.checked("track").unwrap_or(false) {
                form.selection("upstream")
                    .and_then(|i| upstreams.get(i))
                    .cloned()
            } else {
                None
            };

            {
                let (name, tip) = (name.clone(), tip.clone());
                cx.with_repo(move |repo| repo.create_branch(&name, &tip))
                    .await?;
            }
            cx.add_effects(TaskEffects::REFS | TaskEffects::UPSTREAMS);
            cx.set_status(format!(
                "Branch {} created on commit {}.",
                quote(&name),
                quote(tip.short())
            ));

            if let Some(upstream) = track {
                let name = name.clone();
                cx.with_repo(move |repo| repo.set_upstream(&name, Some(&upstream)))
                    .await?;
            }

            if switch_to {
                cx.add_effects(TaskEffects::HEAD);
                cx.subtask(SwitchBranch::new(name).without_confirmation(recurse))
                    .await?;
            }
            Ok(())
        })
    }
}

// --- NewBranchFromHead ---

/// Creates a branch at HEAD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NewBranchFromHead;

impl Taskable for NewBranchFromHead {
    fn name(&self) -> &'static str {
        "NewBranchFromHead"
    }

    fn prereqs(&self) -> TaskPrereqs {
        TaskPrereqs::NO_UNBORN
    }

    fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
        Box::pin(async move {
            match cx.with_repo(|repo| repo.head()).await? {
                HeadState::Detached { commit } => {
                    cx.subtask(NewBranchFromCommit::new(commit)).await
                }
                HeadState::Branch { name, .. } => {
                    cx.subtask(NewBranchFromRef::new(format!("{HEADS_PREFIX}{name}")))
                        .await
                }
                HeadState::Unborn { branch } => Err(FlowError::internal(format!(
                    "HEAD is unborn on '{branch}'"
                ))),
            }
        })
    }
}

// --- NewBranchFromRef ---

/// Creates a branch on the tip of a local or remote branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBranchFromRef {
    /// Full refname (`refs/heads/...` or `refs/remotes/...`).
    pub refname: String,
}

impl NewBranchFromRef {
    pub fn new(refname: impl Into<String>) -> Self {
        Self {
            refname: refname.into(),
        }
    }
}

impl Taskable for NewBranchFromRef {
    fn name(&self) -> &'static str {
        "NewBranchFromRef"
    }

    fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
        Box::pin(async move {
            let next = match split_refname(&self.refname) {
                (RefKind::Local, short) => {
                    let short = short.to_string();
                    let branch = cx.with_repo(move |repo| repo.local_branch(&short)).await?;
                    NewBranchFromCommit {
                        suggest_upstream: branch.upstream_shorthand().unwrap_or_default().to_string(),
                        tip: branch.target,
                        name: branch.name,
                        check_upstream: false,
                    }
                }
                (RefKind::Remote, short) => {
                    let short = short.to_string();
                    let branch = cx.with_repo(move |repo| repo.remote_branch(&short)).await?;
                    NewBranchFromCommit {
                        name: branch.branch_name().to_string(),
                        suggest_upstream: branch.shorthand,
                        tip: branch.target,
                        check_upstream: true,
                    }
                }
                (RefKind::Other, _) => {
                    return Err(FlowError::internal(format!(
                        "Unsupported prefix for refname '{}'",
                        self.refname
                    )));
                }
            };
            cx.subtask(next).await
        })
    }
}

// --- EditUpstreamBranch ---

/// Sets or clears the upstream of a local branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditUpstreamBranch {
    pub branch: String,
    /// Remote branch shorthand (`origin/main`); `None` clears the upstream.
    pub upstream: Option<String>,
}

impl EditUpstreamBranch {
    pub fn new(branch: impl Into<String>, upstream: Option<String>) -> Self {
        Self {
            branch: branch.into(),
            upstream,
        }
    }
}

impl Taskable for EditUpstreamBranch {
    fn name(&self) -> &'static str {
        "EditUpstreamBranch"
    }

    fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
        Box::pin(async move {
            let name = self.branch.clone();
            let branch = cx.with_repo(move |repo| repo.local_branch(&name)).await?;

            if branch.upstream_shorthand() == self.upstream.as_deref() {
                return Err(AbortSignal::silent().into());
            }

            cx.add_effects(TaskEffects::UPSTREAMS);
            {
                let (name, upstream) = (self.branch.clone(), self.upstream.clone());
                cx.with_repo(move |repo| repo.set_upstream(&name, upstream.as_deref()))
                    .await?;
            }

            cx.set_status(match &self.upstream {
                Some(upstream) => format!(
                    "Branch {} now tracks {}.",
                    quote(&self.branch),
                    quote(upstream)
                ),
                None => format!("Branch {} now tracks no upstream.", quote(&self.branch)),
            });
            Ok(())
        })
    }
}
