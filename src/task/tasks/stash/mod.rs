// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Stash operations.
//!
//! ```text
//! NewStash    dialog(message, files, keep) --> create stash --> [restore files]
//! ApplyStash  confirm(delete?) --> [backup] --> git stash pop|apply --index <n>
//! DropStash   confirm --> backup --> git stash drop stash@{n}
//! ```
//!
//! Stashes are deleted only after a copy of their id and message has been
//! written to the trash, so that [`RecallCommit`](super::history::RecallCommit)
//! can bring them back.

use futures_util::future::BoxFuture;

use crate::error::{AbortSignal, FlowResult, Severity};
use crate::git::types::CommitId;
use crate::task::context::FlowContext;
use crate::task::helpers::{plural, quote, strip_stash_message};
use crate::task::tools::git::GitCommand;
use crate::task::{JumpTo, TaskEffects, TaskPrereqs, Taskable};
use crate::ui::{Checkbox, DialogSpec, Field, Message, Prompt};

/// Trash file name stem for stash backups.
const BACKUP_NAME: &str = "DELETED_STASH";

/// Contents of a stash backup file.
#[must_use]
pub fn backup_text(stash: &CommitId, message: &str) -> String {
    format!(
        "To recover this stash, paste the hash below into Recall Lost Commit:\n\
         \n\
         {stash}\n\
         \n\
         ----------------------------------------\n\
         \n\
         Original stash message below:\n\
         \n\
         {message}\n"
    )
}

/// Writes a recovery note for `stash` to the trash. No-op without a trash.
async fn backup_stash(cx: &mut FlowContext, stash: &CommitId) -> FlowResult<()> {
    let Some(trash) = cx.trash() else {
        return Ok(());
    };
    let stash = stash.clone();
    cx.with_repo(move |repo| {
        let message = repo.commit_message(&stash)?;
        trash.write_file(BACKUP_NAME, ".txt", &backup_text(&stash, message.trim_end()))?;
        Ok(())
    })
    .await
}

/// Stash message without its `On branch:` prefix.
async fn stash_message(cx: &mut FlowContext, stash: &CommitId) -> FlowResult<String> {
    let stash = stash.clone();
    let message = cx.with_repo(move |repo| repo.commit_message(&stash)).await?;
    Ok(strip_stash_message(&message))
}

// --- NewStash ---

/// Stashes some or all uncommitted changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewStash {
    /// Files to preselect; all files when empty.
    pub paths: Vec<String>,
}

impl NewStash {
    #[must_use]
    pub const fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }
}

impl Taskable for NewStash {
    fn name(&self) -> &'static str {
        "NewStash"
    }

    fn prereqs(&self) -> TaskPrereqs {
        TaskPrereqs::NO_CONFLICTS | TaskPrereqs::NO_UNBORN
    }

    fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
        Box::pin(async move {
            let (status, submodules) = cx
                .with_repo(|repo| Ok((repo.status()?, repo.submodule_paths()?)))
                .await?;

            if status.is_empty() {
                return Err(
                    AbortSignal::information("There are no uncommitted changes to stash.").into(),
                );
            }

            let files: Vec<String> = status
                .into_iter()
                .map(|f| f.path)
                .filter(|path| !submodules.contains(path))
                .collect();
            if files.is_empty() {
                return Err(AbortSignal::information(
                    "There are no uncommitted changes to stash (submodules cannot be stashed).",
                )
                .into());
            }

            let preselected: Vec<usize> = if self.paths.is_empty() {
                (0..files.len()).collect()
            } else {
                (0..files.len())
                    .filter(|&i| self.paths.contains(&files[i]))
                    .collect()
            };

            let form = cx
                .dialog(
                    DialogSpec::builder()
                        .title("New stash")
                        .fields(vec![
                            Field::text("message", "Message", ""),
                            Field::multi_select("files", "Files to stash", files.clone())
                                .with_selection(preselected),
                            Field::checkbox("keep", "Keep changes in working directory", false),
                        ])
                        .accept_label("Stash")
                        .build(),
                )
                .await?;

            let ticked: Vec<String> = form
                .selections("files")
                .unwrap_or_default()
                .iter()
                .filter_map(|&i| files.get(i).cloned())
                .collect();
            if ticked.is_empty() {
                return Err(AbortSignal::information("No files were selected for stashing.").into());
            }
            let message = form.text("message").unwrap_or_default().to_string();
            let keep = form.checked("keep").unwrap_or(false);

            cx.add_effects(TaskEffects::REFS);
            {
                let ticked = ticked.clone();
                cx.with_repo(move |repo| repo.create_stash(&message, &ticked).map(|_| ()))
                    .await?;
            }

            if !keep {
                cx.add_effects(TaskEffects::WORKDIR);
                let ticked = ticked.clone();
                cx.with_repo(move |repo| repo.restore_files_from_head(&ticked))
                    .await?;
            }

            cx.set_status(if ticked.len() == 1 {
                "File stashed.".to_string()
            } else {
                format!("{} stashed.", plural(ticked.len(), "file", "files"))
            });
            Ok(())
        })
    }
}

// --- ApplyStash ---

/// Applies a stash to the working directory, deleting it if it applies
/// cleanly and the user agrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyStash {
    pub stash: CommitId,
    /// Initial state of the "delete" checkbox.
    pub tick_delete: bool,
    /// Apply and delete without asking.
    pub silent: bool,
}

impl ApplyStash {
    #[must_use]
    pub const fn new(stash: CommitId) -> Self {
        Self {
            stash,
            tick_delete: true,
            silent: false,
        }
    }

    /// Applies and deletes without asking.
    #[must_use]
    pub const fn silent(stash: CommitId) -> Self {
        Self {
            stash,
            tick_delete: true,
            silent: true,
        }
    }

    #[must_use]
    pub const fn keep_by_default(mut self) -> Self {
        self.tick_delete = false;
        self
    }

    /// The flow body, also run inline by `MergeBranch` after an auto stash.
    pub(crate) async fn apply(&self, cx: &mut FlowContext) -> FlowResult<()> {
        let message = stash_message(cx, &self.stash).await?;

        let delete = if self.silent {
            true
        } else {
            let choice = cx
                .confirm(
                    Prompt::builder()
                        .title(self.name())
                        .text(format!(
                            "Do you want to apply the changes stashed in {} to your working directory?",
                            quote(&message)
                        ))
                        .verb(if self.tick_delete {
                            "Apply & Delete"
                        } else {
                            "Apply & Keep"
                        })
                        .checkbox(Checkbox {
                            label: "Delete the stash if it applies cleanly".to_string(),
                            checked: self.tick_delete,
                        })
                        .build(),
                )
                .await?;
            choice.checked.unwrap_or(self.tick_delete)
        };

        cx.jump_to(JumpTo::Workdir);
        cx.add_effects(TaskEffects::WORKDIR);

        if delete {
            cx.add_effects(TaskEffects::REFS);
            backup_stash(cx, &self.stash).await?;
        }

        let index = {
            let stash = self.stash.clone();
            cx.with_repo(move |repo| repo.find_stash_index(&stash))
                .await?
        };
        let invocation = cx
            .run_git(
                GitCommand::new(["stash", if delete { "pop" } else { "apply" }, "--index"])
                    .arg(index.to_string())
                    .allow_failure(),
            )
            .await?;

        let conflicts = cx
            .with_repo(|repo| Ok(repo.status()?.iter().any(|f| f.is_conflicted())))
            .await?;
        let kept = if delete {
            " The stash wasn't deleted in case you need to re-apply it later."
        } else {
            ""
        };

        if invocation.success() {
            cx.set_status(if delete {
                format!("Stash {} applied and deleted.", quote(&message))
            } else {
                format!("Stash {} applied.", quote(&message))
            });
        } else if conflicts {
            cx.set_status(format!("Stash {} applied, with conflicts.", quote(&message)));
            let text = format!(
                "Applying the stash {} has caused merge conflicts because your files have \
                 diverged since they were stashed.{kept}",
                quote(&message)
            );
            cx.on_ui(move |ui| {
                ui.show_message(
                    &Message::builder()
                        .title("Conflicts caused by stash application")
                        .text(text)
                        .severity(Severity::Warning)
                        .build(),
                );
            })
            .await?;
        } else {
            let status = format!("Stash {} couldn't be applied.", quote(&message));
            cx.set_status(status.clone());
            return Err(AbortSignal::warning(format!("{status}{kept}"))
                .with_details(
                    invocation
                        .stderr_lines()
                        .map(ToString::to_string)
                        .chain(std::iter::once(invocation.command.clone())),
                )
                .into());
        }
        Ok(())
    }
}

impl Taskable for ApplyStash {
    fn name(&self) -> &'static str {
        "ApplyStash"
    }

    fn prereqs(&self) -> TaskPrereqs {
        TaskPrereqs::NO_CONFLICTS | TaskPrereqs::NO_STAGED_CHANGES
    }

    fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
        Box::pin(self.apply(cx))
    }
}

// --- DropStash ---

/// Deletes a stash after backing it up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropStash {
    pub stash: CommitId,
}

impl DropStash {
    #[must_use]
    pub const fn new(stash: CommitId) -> Self {
        Self { stash }
    }
}

impl Taskable for DropStash {
    fn name(&self) -> &'static str {
        "DropStash"
    }

    fn flow<'a>(&'a self, cx: &'a mut FlowContext) -> BoxFuture<'a, FlowResult<()>> {
        Box::pin(async move {
            let message = stash_message(cx, &self.stash).await?;

            cx.confirm(
                Prompt::builder()
                    .title(self.name())
                    .text(format!("Really delete stash {}?", quote(&message)))
                    .verb("Delete stash")
                    .build(),
            )
            .await?;

            backup_stash(cx, &self.stash).await?;

            cx.add_effects(TaskEffects::REFS);
            let index = {
                let stash = self.stash.clone();
                cx.with_repo(move |repo| repo.find_stash_index(&stash))
                    .await?
            };
            cx.run_git(GitCommand::new(["stash", "drop"]).arg(format!("stash@{{{index}}}")))
                .await?;

            cx.set_status(format!("Stash {} deleted.", quote(&message)));
            Ok(())
        })
    }
}
