// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Operations that move branch tips.
//!
//! ```text
//! ResetHead          dialog(mode) --> git reset --<mode> <onto>
//! FastForwardBranch  analysis --> git merge --ff-only | git push . up:branch
//!                    on divergence: offer MergeBranch(upstream)
//! MergeBranch        analysis --> confirm --> [auto stash] --> git merge --> [ApplyStash]
//! RecallCommit       dialog(hash) --> create recall-<hash>
//! ```

use futures_util::future::BoxFuture;
use tracing::{info, warn};

use crate::error::{AbortSignal, FlowError, FlowResult, RepoError, Severity};
use crate::git::types::{CommitId, MergeAnalysis, RefKind, split_refname};
use crate::task::context::FlowContext;
use crate::task::helpers::{message_summary, quote, with_unique_suffix};
use crate::task::tasks::stash::ApplyStash;
use crate::task::tools::git::GitCommand;
use crate::task::{JumpTo, Recovery, TaskEffects, TaskPrereqs, Taskable, show_error};
use crate::ui::{Action, DialogSpec, Field, Message, Prompt, TextRule, Ui};

// --- ResetHead ---

/// How far `git reset` goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetMode {
    Soft,
    #[default]
    Mixed,
    Hard,
}

impl ResetMode {
    pub const ALL: [Self; 3] = [Self::Soft, Self::Mixed, Self::Hard];

    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::Soft => "--soft",
            Self::Mixed => "--mixed",
            Self::Hard => "--hard",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Soft => "Soft: keep index and working directory",
            Self::Mixed => "Mixed: keep working directory, reset index",
            Self::Hard => "Hard: discard all changes",
        }
    }
}

/// Points the current branch at another commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetHead {
    pub onto: CommitId,
}

impl ResetHead {
    #[must_use]
    pub const fn new(onto: CommitId) -> Self {
        Self { onto }
    }
}

impl Taskable for ResetHead {
    fn name(&self) -> &'static str {
        "ResetHead"
    }

    fn prereqs(&self) -> TaskPrereqs {
        TaskPrereqs::NO_UNBORN | TaskPrereqs::NO_DETACHED
    }

    fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
        Box::pin(async move {
            let onto = self.onto.clone();
            let (head, message, submodules) = cx
                .with_repo(move |repo| {
                    Ok((
                        repo.head()?,
                        repo.commit_message(&onto)?,
                        repo.submodule_paths()?,
                    ))
                })
                .await?;
            let branch = head.branch_name().unwrap_or("HEAD").to_string();

            let mut fields = vec![Field::choice(
                "mode",
                "Reset mode",
                ResetMode::ALL.iter().map(|m| m.label().to_string()).collect(),
                1,
            )];
            if !submodules.is_empty() {
                fields.push(Field::checkbox("recurse", "Recurse into submodules", false));
            }

            let form = cx
                .dialog(
                    DialogSpec::builder()
                        .title("Reset HEAD")
                        .text(format!(
                            "Reset branch {} to commit {}?",
                            quote(&branch),
                            quote(self.onto.short())
                        ))
                        .subtitle(message_summary(&message).0)
                        .fields(fields)
                        .accept_label("Reset")
                        .build(),
                )
                .await?;
            let mode = form
                .selection("mode")
                .and_then(|i| ResetMode::ALL.get(i).copied())
                .unwrap_or_default();
            let recurse = form.checked("recurse").unwrap_or(false);

            cx.add_effects(TaskEffects::REFS | TaskEffects::WORKDIR);
            cx.run_git(
                GitCommand::new(["reset", mode.flag()])
                    .arg_if(recurse, "--recurse-submodules")
                    .arg(self.onto.as_str()),
            )
            .await?;

            cx.set_status(format!(
                "Branch {} was reset to {} ({}).",
                quote(&branch),
                quote(self.onto.short()),
                mode.flag()
            ));
            Ok(())
        })
    }
}

// --- FastForwardBranch ---

/// Advances a branch to its upstream when no merge commit is needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FastForwardBranch {
    /// Local branch; the checked-out branch when `None`.
    pub branch: Option<String>,
}

impl FastForwardBranch {
    #[must_use]
    pub const fn new(branch: Option<String>) -> Self {
        Self { branch }
    }
}

const MERGE_ACTION: &str = "merge";

impl Taskable for FastForwardBranch {
    fn name(&self) -> &'static str {
        "FastForwardBranch"
    }

    fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
        Box::pin(async move {
            let name = match &self.branch {
                Some(name) => name.clone(),
                None => {
                    cx.check_prereqs(TaskPrereqs::NO_UNBORN | TaskPrereqs::NO_DETACHED)
                        .await?;
                    cx.with_repo(|repo| repo.head())
                        .await?
                        .branch_name()
                        .unwrap_or_default()
                        .to_string()
                }
            };

            let branch = cx.with_repo(move |repo| repo.local_branch(&name)).await?;
            let Some(upstream_ref) = branch.upstream.clone() else {
                return Err(AbortSignal::warning(format!(
                    "Can't fast-forward {} because it isn't tracking an upstream branch.",
                    quote(&branch.name)
                ))
                .into());
            };
            let upstream = split_refname(&upstream_ref).1.to_string();
            let local_ref = branch.refname();

            let (theirs, analysis) = {
                let (upstream_ref, local_ref) = (upstream_ref.clone(), local_ref.clone());
                cx.with_repo(move |repo| {
                    let theirs = repo.resolve_commit(&upstream_ref)?;
                    let analysis = repo.merge_analysis(&theirs, Some(&local_ref))?;
                    Ok((theirs, analysis))
                })
                .await?
            };
            info!(branch = %branch.name, ?analysis, "merge analysis");

            let divergent = || RepoError::DivergentBranches {
                local: branch.name.clone(),
                upstream: upstream_ref.clone(),
                checked_out: branch.checked_out,
            };

            let up_to_date = if analysis.contains(MergeAnalysis::UP_TO_DATE) {
                true
            } else if analysis == MergeAnalysis::NORMAL | MergeAnalysis::FASTFORWARD {
                cx.add_effects(TaskEffects::REFS);
                let command = if branch.checked_out {
                    cx.add_effects(TaskEffects::HEAD);
                    GitCommand::new(["merge", "--ff-only", "--progress"]).arg(&upstream_ref)
                } else {
                    GitCommand::new(["push", "."]).arg(format!("{upstream_ref}:{local_ref}"))
                };
                let invocation = cx.run_git(command.allow_failure()).await?;
                if !invocation.success() {
                    return Err(divergent().into());
                }
                false
            } else if analysis == MergeAnalysis::NORMAL {
                return Err(divergent().into());
            } else {
                return Err(RepoError::UnsupportedMergeAnalysis(format!("{analysis:?}")).into());
            };

            cx.jump_to(JumpTo::Ref(local_ref));

            if up_to_date {
                let detail = if theirs == branch.target {
                    format!(
                        "Your local branch {} is already up to date with {}.",
                        quote(&branch.name),
                        quote(&upstream)
                    )
                } else {
                    format!(
                        "Your local branch {} is ahead of {}.",
                        quote(&branch.name),
                        quote(&upstream)
                    )
                };
                let text = format!("No fast-forwarding necessary. {detail}");
                cx.set_status(text.clone());
                cx.confirm(
                    Prompt::builder()
                        .title(self.name())
                        .text(text)
                        .can_cancel(false)
                        .dont_show_again("NoFastForwardingNecessary")
                        .build(),
                )
                .await?;
            }
            Ok(())
        })
    }

    fn on_error(&self, error: &FlowError, ui: &dyn Ui) -> Recovery {
        let FlowError::Repo(RepoError::DivergentBranches {
            local,
            upstream,
            checked_out,
        }) = error
        else {
            show_error(self.name(), error, ui);
            return Recovery::None;
        };

        let actions = if *checked_out {
            vec![Action::new(
                MERGE_ACTION,
                format!("Merge into {}", quote(local)),
            )]
        } else {
            Vec::new()
        };
        let pressed = ui.show_message(
            &Message::builder()
                .title(self.name())
                .text(format!(
                    "Can't fast-forward {} to {}. The branches are divergent.",
                    quote(local),
                    quote(split_refname(upstream).1)
                ))
                .severity(Severity::Warning)
                .actions(actions)
                .build(),
        );

        if pressed.as_deref() == Some(MERGE_ACTION) {
            Recovery::Invoke(Box::new(MergeBranch::new(upstream.clone()).into()))
        } else {
            Recovery::None
        }
    }
}

// --- MergeBranch ---

/// Merges another branch into HEAD, fast-forwarding when possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeBranch {
    /// Full refname of the branch to merge.
    pub them: String,
    /// Fast-forward without asking; offers to stash unstaged files first.
    pub silent_fast_forward: bool,
}

impl MergeBranch {
    pub fn new(them: impl Into<String>) -> Self {
        Self {
            them: them.into(),
            silent_fast_forward: false,
        }
    }

    #[must_use]
    pub const fn silent_fast_forward(mut self) -> Self {
        self.silent_fast_forward = true;
        self
    }
}

const MERGE_COMMIT_ACTION: &str = "merge-commit";

/// Repository facts gathered before deciding how to merge.
struct MergeFacts {
    target: CommitId,
    analysis: MergeAnalysis,
    ours: String,
    conflicts: bool,
    staged: bool,
    unstaged: bool,
    /// Every path with a status, for the auto stash.
    dirty: Vec<String>,
}

impl MergeBranch {
    /// Asks whether to fast-forward. Returns true for a merge commit instead.
    async fn confirm_fast_forward(
        &self,
        cx: &mut FlowContext,
        ours: &str,
        theirs: &str,
        target: &CommitId,
    ) -> FlowResult<bool> {
        let choice = cx
            .confirm(
                Prompt::builder()
                    .title("Fast-forwarding possible")
                    .text(format!(
                        "Your branch {} can simply be fast-forwarded to {}.",
                        quote(ours),
                        quote(theirs)
                    ))
                    .verb("Fast-Forward")
                    .action(Action::new(MERGE_COMMIT_ACTION, "Create Merge Commit"))
                    .help(format!(
                        "Fast-forwarding means that the tip of your branch will be moved to a \
                         more recent commit in a linear path, without the need to create a \
                         merge commit. In this case, {} will be fast-forwarded to {}.",
                        quote(ours),
                        quote(target.short())
                    ))
                    .build(),
            )
            .await?;
        Ok(choice.is_action(MERGE_COMMIT_ACTION))
    }
}

impl Taskable for MergeBranch {
    fn name(&self) -> &'static str {
        "MergeBranch"
    }

    fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
        Box::pin(async move {
            let (kind, theirs) = split_refname(&self.them);
            if kind == RefKind::Other {
                return Err(FlowError::internal(format!(
                    "Unsupported prefix for refname '{}'",
                    self.them
                )));
            }
            let theirs = theirs.to_string();

            let facts = {
                let theirs = theirs.clone();
                cx.with_repo(move |repo| {
                    let target = if kind == RefKind::Local {
                        repo.local_branch(&theirs)?.target
                    } else {
                        repo.remote_branch(&theirs)?.target
                    };
                    let status = repo.status()?;
                    Ok(MergeFacts {
                        analysis: repo.merge_analysis(&target, None)?,
                        ours: repo.head()?.branch_name().unwrap_or("HEAD").to_string(),
                        conflicts: status.iter().any(|f| f.is_conflicted()),
                        staged: status.iter().any(|f| f.is_staged()),
                        unstaged: status.iter().any(|f| f.is_unstaged()),
                        dirty: status.into_iter().map(|f| f.path).collect(),
                        target,
                    })
                })
                .await?
            };
            info!(them = %self.them, analysis = ?facts.analysis, "merge analysis");
            let ours = facts.ours.as_str();

            let mut want_merge_commit = true;
            let mut stash_and_reapply = false;

            if facts.conflicts {
                return Err(AbortSignal::warning(
                    "Merging is not possible right now because you have unresolved conflicts. \
                     Fix the conflicts to proceed.",
                )
                .into());
            } else if facts.staged {
                return Err(AbortSignal::warning(
                    "Merging is not possible right now because you have staged changes. \
                     Commit your changes or stash them to proceed.",
                )
                .into());
            } else if facts.analysis == MergeAnalysis::UP_TO_DATE {
                return Err(AbortSignal::information(format!(
                    "No merge is necessary. Your branch {} is already up to date with {}.",
                    quote(ours),
                    quote(&theirs)
                ))
                .into());
            } else if facts.analysis == MergeAnalysis::UNBORN {
                return Err(AbortSignal::warning("Cannot merge into an unborn head.").into());
            } else if facts.analysis == MergeAnalysis::FASTFORWARD | MergeAnalysis::NORMAL {
                if self.silent_fast_forward {
                    want_merge_commit = false;
                    if facts.unstaged {
                        let choice = cx
                            .ask(
                                Prompt::builder()
                                    .title("Unstaged files!")
                                    .text("Do you want to stash and reapply unstaged files?")
                                    .verb("Yes")
                                    .build(),
                            )
                            .await?;
                        if choice.is_cancelled() {
                            return Ok(());
                        }
                        stash_and_reapply = true;
                    }
                } else {
                    want_merge_commit = self
                        .confirm_fast_forward(cx, ours, &theirs, &facts.target)
                        .await?;
                }
            } else if facts.analysis == MergeAnalysis::NORMAL {
                cx.confirm(
                    Prompt::builder()
                        .title("Merging may cause conflicts")
                        .text(format!(
                            "Merging {} into {} may cause conflicts. You will need to fix the \
                             conflicts, if any. Then, commit the result to conclude the merge.",
                            quote(&theirs),
                            quote(ours)
                        ))
                        .verb("Merge")
                        .dont_show_again("MergeMayCauseConflicts")
                        .build(),
                )
                .await?;
            } else {
                return Err(
                    RepoError::UnsupportedMergeAnalysis(format!("{:?}", facts.analysis)).into(),
                );
            }

            let stash = if stash_and_reapply {
                let files = facts.dirty.clone();
                let id = cx
                    .with_repo(move |repo| {
                        let id = repo.create_stash("auto stash", &files)?;
                        repo.restore_files_from_head(&files)?;
                        Ok(id)
                    })
                    .await?;
                Some(id)
            } else {
                None
            };

            cx.add_effects(TaskEffects::REFS | TaskEffects::WORKDIR);
            let invocation = cx
                .run_git(
                    GitCommand::new(["merge", "--no-commit", "--no-edit", "--progress", "--verbose"])
                        .arg_if(want_merge_commit, "--no-ff")
                        .arg_if(!want_merge_commit, "--ff-only")
                        .arg(&theirs)
                        .allow_failure(),
                )
                .await?;
            if !invocation.success() {
                warn!(stderr = %invocation.stderr.trim(), "git merge exited with code {}", invocation.exit_code);
            }

            if let Some(id) = stash {
                ApplyStash::silent(id).apply(cx).await?;
            }

            if want_merge_commit {
                cx.jump_to(JumpTo::Workdir);
                cx.set_status(format!("Merging {} into {}.", quote(&theirs), quote(ours)));
            } else {
                cx.set_status(format!(
                    "Branch {} fast-forwarded to {}.",
                    quote(ours),
                    quote(&theirs)
                ));
            }
            Ok(())
        })
    }
}

// --- RecallCommit ---

/// Creates a branch on a commit that no branch reaches anymore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecallCommit {
    /// Hash prefilled in the dialog.
    pub hash: String,
}

impl RecallCommit {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }
}

impl Taskable for RecallCommit {
    fn name(&self) -> &'static str {
        "RecallCommit"
    }

    fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
        Box::pin(async move {
            let form = cx
                .dialog(
                    DialogSpec::builder()
                        .title("Recall lost commit")
                        .text(
                            "If you know the hash of a commit that isn't part of any branches \
                             anymore, repotask will try to recall it for you.",
                        )
                        .fields(vec![
                            Field::text("hash", "Commit hash", &self.hash).with_rule(TextRule::NonEmpty),
                        ])
                        .accept_label("Recall")
                        .build(),
                )
                .await?;
            let needle = form.text("hash").unwrap_or_default().trim().to_string();

            cx.add_effects(TaskEffects::REFS);
            let (commit, branch) = cx
                .with_repo(move |repo| {
                    let commit = repo.resolve_commit(&needle)?;
                    let branch = with_unique_suffix(
                        &format!("recall-{}", commit.short()),
                        &repo.local_branch_names()?,
                    );
                    repo.create_branch(&branch, &commit)?;
                    Ok((commit, branch))
                })
                .await?;

            cx.set_status(format!(
                "Branch {} created on commit {}.",
                quote(&branch),
                quote(commit.short())
            ));
            cx.jump_to(JumpTo::Commit(commit));
            Ok(())
        })
    }
}
