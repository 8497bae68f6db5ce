// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory collaborators for driving flows in tests.
//!
//! ```text
//! FakeRepo        branches, HEAD, status, stashes in a Mutex; records mutations
//! ScriptedUi      queued answers for prompts and dialogs; records what it saw
//! ScriptedDriver  queued git exit codes with optional side effects
//! Harness         the three above plus a TaskManager wired to them
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::BoxFuture;

use crate::error::{FlowResult, RepoError, RepoResult};
use crate::git::backend::Repository;
use crate::git::types::{
    Branch, CommitId, FileStatus, HEADS_PREFIX, HeadState, MergeAnalysis, REMOTES_PREFIX,
    RemoteBranch,
};
use crate::task::manager::TaskManager;
use crate::task::tools::ProcessDriver;
use crate::task::tools::git::{GitCommand, ProcessInvocation};
use crate::ui::{Choice, DialogSpec, FormResult, Message, Prompt, Ui};

/// A 40-character id made of `c`.
pub(crate) fn oid(c: char) -> CommitId {
    CommitId::new(c.to_string().repeat(40))
}

// --- FakeRepo ---

struct FakeState {
    head_branch: Option<String>,
    detached: Option<CommitId>,
    branches: BTreeMap<String, (CommitId, Option<String>)>,
    remotes: BTreeMap<String, CommitId>,
    status: Vec<FileStatus>,
    commits: BTreeMap<CommitId, String>,
    analysis: MergeAnalysis,
    stashes: Vec<(CommitId, String)>,
    submodules: Vec<String>,
    calls: Vec<String>,
    stash_counter: u32,
}

/// Repository kept in memory.
///
/// Starts on branch `main` at `oid('a')` with a clean worktree.
pub(crate) struct FakeRepo {
    workdir: PathBuf,
    git_dir: PathBuf,
    state: Mutex<FakeState>,
    /// Blocks the next `status` call until a message arrives.
    pause: Mutex<Option<Receiver<()>>>,
}

impl FakeRepo {
    pub(crate) fn new() -> Self {
        let mut branches = BTreeMap::new();
        branches.insert("main".to_string(), (oid('a'), None));
        let mut commits = BTreeMap::new();
        commits.insert(oid('a'), "Initial commit\n".to_string());
        Self {
            workdir: PathBuf::from("/fake"),
            git_dir: PathBuf::from("/fake/.git"),
            state: Mutex::new(FakeState {
                head_branch: Some("main".to_string()),
                detached: None,
                branches,
                remotes: BTreeMap::new(),
                status: Vec::new(),
                commits,
                analysis: MergeAnalysis::UP_TO_DATE,
                stashes: Vec::new(),
                submodules: Vec::new(),
                calls: Vec::new(),
                stash_counter: 0,
            }),
            pause: Mutex::new(None),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn edit(mut self, f: impl FnOnce(&mut FakeState)) -> Self {
        f(self.state.get_mut().unwrap());
        self
    }

    pub(crate) fn with_branch(self, name: &str, target: CommitId) -> Self {
        self.edit(|s| {
            s.commits
                .entry(target.clone())
                .or_insert_with(|| format!("Tip of {name}\n"));
            s.branches.insert(name.to_string(), (target, None));
        })
    }

    /// Sets the upstream of `local` to a full refname.
    pub(crate) fn with_upstream(self, local: &str, upstream: &str) -> Self {
        self.edit(|s| {
            if let Some(entry) = s.branches.get_mut(local) {
                entry.1 = Some(upstream.to_string());
            }
        })
    }

    pub(crate) fn with_remote_branch(self, shorthand: &str, target: CommitId) -> Self {
        self.edit(|s| {
            s.commits
                .entry(target.clone())
                .or_insert_with(|| format!("Tip of {shorthand}\n"));
            s.remotes.insert(shorthand.to_string(), target);
        })
    }

    pub(crate) fn with_status(self, path: &str, index: char, worktree: char) -> Self {
        self.edit(|s| s.status.push(file(path, index, worktree)))
    }

    pub(crate) fn on_branch(self, name: &str) -> Self {
        self.edit(|s| {
            s.head_branch = Some(name.to_string());
            s.detached = None;
        })
    }

    pub(crate) fn detached_at(self, commit: CommitId) -> Self {
        self.edit(|s| {
            s.commits
                .entry(commit.clone())
                .or_insert_with(|| "Detached commit\n".to_string());
            s.head_branch = None;
            s.detached = Some(commit);
        })
    }

    /// HEAD on a branch with no commits; removes all branches.
    pub(crate) fn unborn(self) -> Self {
        self.edit(|s| {
            s.branches.clear();
            s.head_branch = Some("main".to_string());
            s.detached = None;
        })
    }

    pub(crate) fn with_analysis(self, analysis: MergeAnalysis) -> Self {
        self.edit(|s| s.analysis = analysis)
    }

    pub(crate) fn with_commit(self, id: CommitId, message: &str) -> Self {
        self.edit(|s| {
            s.commits.insert(id, message.to_string());
        })
    }

    /// Pushes a stash on top of the stash list.
    pub(crate) fn with_stash(self, id: CommitId, message: &str) -> Self {
        self.edit(|s| {
            s.commits.insert(id.clone(), message.to_string());
            s.stashes.insert(0, (id, message.to_string()));
        })
    }

    pub(crate) fn with_submodule(self, path: &str) -> Self {
        self.edit(|s| s.submodules.push(path.to_string()))
    }

    /// Holds the next `status` call on its worker thread until `release` fires.
    pub(crate) fn paused_until(self, release: Receiver<()>) -> Self {
        *self.pause.lock().unwrap() = Some(release);
        self
    }

    /// Replaces the worktree status, e.g. from a driver side effect.
    pub(crate) fn set_status(&self, status: Vec<FileStatus>) {
        self.state().status = status;
    }

    /// Mutating calls, in order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub(crate) fn branch_names(&self) -> Vec<String> {
        self.state().branches.keys().cloned().collect()
    }

    pub(crate) fn upstream_of(&self, local: &str) -> Option<String> {
        self.state().branches.get(local).and_then(|b| b.1.clone())
    }

    pub(crate) fn stash_ids(&self) -> Vec<CommitId> {
        self.state().stashes.iter().map(|s| s.0.clone()).collect()
    }
}

pub(crate) fn file(path: &str, index: char, worktree: char) -> FileStatus {
    FileStatus {
        path: path.to_string(),
        index,
        worktree,
    }
}

fn not_found(name: &str) -> RepoError {
    RepoError::BranchNotFound {
        branch: name.to_string(),
    }
}

impl Repository for FakeRepo {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn head(&self) -> RepoResult<HeadState> {
        let s = self.state();
        if let Some(commit) = &s.detached {
            return Ok(HeadState::Detached {
                commit: commit.clone(),
            });
        }
        let name = s.head_branch.clone().unwrap_or_else(|| "main".to_string());
        Ok(match s.branches.get(&name) {
            Some((commit, _)) => HeadState::Branch {
                name,
                commit: commit.clone(),
            },
            None => HeadState::Unborn { branch: name },
        })
    }

    fn status(&self) -> RepoResult<Vec<FileStatus>> {
        let release = self.pause.lock().unwrap().take();
        if let Some(release) = release {
            let _ = release.recv();
        }
        Ok(self.state().status.clone())
    }

    fn local_branches(&self) -> RepoResult<Vec<Branch>> {
        let s = self.state();
        Ok(s.branches
            .iter()
            .map(|(name, (target, upstream))| Branch {
                name: name.clone(),
                target: target.clone(),
                upstream: upstream.clone(),
                checked_out: s.detached.is_none() && s.head_branch.as_deref() == Some(name),
            })
            .collect())
    }

    fn remote_branch(&self, shorthand: &str) -> RepoResult<RemoteBranch> {
        let s = self.state();
        let target = s.remotes.get(shorthand).ok_or_else(|| not_found(shorthand))?;
        let remote = shorthand.split_once('/').map_or(shorthand, |(r, _)| r);
        Ok(RemoteBranch {
            shorthand: shorthand.to_string(),
            remote: remote.to_string(),
            target: target.clone(),
        })
    }

    fn refs_pointing_at(&self, commit: &CommitId) -> RepoResult<Vec<String>> {
        let s = self.state();
        let locals = s
            .branches
            .iter()
            .filter(|(_, (target, _))| target == commit)
            .map(|(name, _)| format!("{HEADS_PREFIX}{name}"));
        let remotes = s
            .remotes
            .iter()
            .filter(|(_, target)| *target == commit)
            .map(|(name, _)| format!("{REMOTES_PREFIX}{name}"));
        Ok(locals.chain(remotes).collect())
    }

    fn resolve_commit(&self, needle: &str) -> RepoResult<CommitId> {
        let s = self.state();
        let short = needle
            .strip_prefix(HEADS_PREFIX)
            .or_else(|| needle.strip_prefix(REMOTES_PREFIX));
        if let Some(short) = short {
            if let Some((target, _)) = s.branches.get(short) {
                return Ok(target.clone());
            }
            if let Some(target) = s.remotes.get(short) {
                return Ok(target.clone());
            }
        }
        s.commits
            .keys()
            .find(|id| !needle.is_empty() && id.as_str().starts_with(needle))
            .cloned()
            .ok_or_else(|| RepoError::InvalidObject {
                needle: needle.to_string(),
            })
    }

    fn commit_message(&self, commit: &CommitId) -> RepoResult<String> {
        self.state()
            .commits
            .get(commit)
            .cloned()
            .ok_or_else(|| RepoError::InvalidObject {
                needle: commit.to_string(),
            })
    }

    fn merge_analysis(
        &self,
        theirs: &CommitId,
        our_ref: Option<&str>,
    ) -> RepoResult<MergeAnalysis> {
        let mut s = self.state();
        s.calls
            .push(format!("analysis {} {}", theirs.short(), our_ref.unwrap_or("HEAD")));
        Ok(s.analysis)
    }

    fn submodule_paths(&self) -> RepoResult<Vec<String>> {
        Ok(self.state().submodules.clone())
    }

    fn find_stash_index(&self, stash: &CommitId) -> RepoResult<usize> {
        self.state()
            .stashes
            .iter()
            .position(|(id, _)| id == stash)
            .ok_or_else(|| RepoError::StashNotFound {
                id: stash.to_string(),
            })
    }

    fn rename_branch(&self, old: &str, new: &str) -> RepoResult<()> {
        let mut s = self.state();
        s.calls.push(format!("rename {old} {new}"));
        let entry = s.branches.remove(old).ok_or_else(|| not_found(old))?;
        s.branches.insert(new.to_string(), entry);
        if s.head_branch.as_deref() == Some(old) {
            s.head_branch = Some(new.to_string());
        }
        Ok(())
    }

    fn delete_branch(&self, name: &str) -> RepoResult<()> {
        let mut s = self.state();
        s.calls.push(format!("delete {name}"));
        s.branches.remove(name).map(|_| ()).ok_or_else(|| not_found(name))
    }

    fn create_branch(&self, name: &str, target: &CommitId) -> RepoResult<()> {
        let mut s = self.state();
        s.calls.push(format!("create {name} {}", target.short()));
        if s.branches.contains_key(name) {
            return Err(RepoError::CommandFailed {
                command: format!("git branch {name}"),
                message: "already exists".to_string(),
            });
        }
        s.branches.insert(name.to_string(), (target.clone(), None));
        Ok(())
    }

    fn set_upstream(&self, local: &str, upstream: Option<&str>) -> RepoResult<()> {
        let mut s = self.state();
        s.calls
            .push(format!("upstream {local} {}", upstream.unwrap_or("-")));
        let entry = s.branches.get_mut(local).ok_or_else(|| not_found(local))?;
        entry.1 = upstream.map(|u| format!("{REMOTES_PREFIX}{u}"));
        Ok(())
    }

    fn create_stash(&self, message: &str, paths: &[String]) -> RepoResult<CommitId> {
        let mut s = self.state();
        s.calls
            .push(format!("stash {message:?} {}", paths.join(",")));
        s.stash_counter += 1;
        let id = CommitId::new(format!("{:040x}", 0x5000 + s.stash_counter));
        s.commits.insert(id.clone(), format!("On main: {message}"));
        s.stashes
            .insert(0, (id.clone(), format!("On main: {message}")));
        Ok(id)
    }

    fn restore_files_from_head(&self, paths: &[String]) -> RepoResult<()> {
        let mut s = self.state();
        s.calls.push(format!("restore {}", paths.join(",")));
        s.status.retain(|f| !paths.contains(&f.path));
        Ok(())
    }
}

// --- ScriptedUi ---

type DialogScript = Box<dyn FnOnce(&DialogSpec) -> FormResult + Send>;

/// UI answering from queues. An unexpected prompt or dialog panics.
#[derive(Default)]
pub(crate) struct ScriptedUi {
    confirms: Mutex<VecDeque<Choice>>,
    dialogs: Mutex<VecDeque<DialogScript>>,
    message_actions: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<Prompt>>,
    forms: Mutex<Vec<DialogSpec>>,
    messages: Mutex<Vec<Message>>,
}

impl ScriptedUi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn answer(self, choice: Choice) -> Self {
        self.confirms.lock().unwrap().push_back(choice);
        self
    }

    pub(crate) fn fill(
        self,
        script: impl FnOnce(&DialogSpec) -> FormResult + Send + 'static,
    ) -> Self {
        self.dialogs.lock().unwrap().push_back(Box::new(script));
        self
    }

    /// Accepts the next dialog with its defaults.
    pub(crate) fn fill_defaults(self) -> Self {
        self.fill(FormResult::accept_defaults)
    }

    pub(crate) fn press(self, action: &str) -> Self {
        self.message_actions
            .lock()
            .unwrap()
            .push_back(Some(action.to_string()));
        self
    }

    pub(crate) fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }

    pub(crate) fn forms(&self) -> Vec<DialogSpec> {
        self.forms.lock().unwrap().clone()
    }

    pub(crate) fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    /// Nothing at all was shown.
    pub(crate) fn untouched(&self) -> bool {
        self.prompts().is_empty() && self.forms().is_empty() && self.messages().is_empty()
    }
}

impl Ui for ScriptedUi {
    fn confirm(&self, prompt: &Prompt) -> Choice {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.confirms
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected prompt: {}", prompt.text))
    }

    fn dialog(&self, spec: &DialogSpec) -> FormResult {
        self.forms.lock().unwrap().push(spec.clone());
        let script = self
            .dialogs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected dialog: {}", spec.title));
        script(spec)
    }

    fn show_message(&self, message: &Message) -> Option<String> {
        self.messages.lock().unwrap().push(message.clone());
        self.message_actions.lock().unwrap().pop_front().flatten()
    }
}

// --- ScriptedDriver ---

type Effect = Box<dyn FnOnce() + Send>;

struct Scripted {
    exit_code: i32,
    stderr: String,
    effect: Option<Effect>,
}

/// Process driver replaying queued exit codes. Unscripted runs exit 0.
#[derive(Default)]
pub(crate) struct ScriptedDriver {
    responses: Mutex<VecDeque<Scripted>>,
    commands: Mutex<Vec<String>>,
}

impl ScriptedDriver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn exit(self, exit_code: i32, stderr: &str) -> Self {
        self.responses.lock().unwrap().push_back(Scripted {
            exit_code,
            stderr: stderr.to_string(),
            effect: None,
        });
        self
    }

    /// Like [`exit`](Self::exit), running `effect` when the command runs.
    pub(crate) fn exit_with(
        self,
        exit_code: i32,
        stderr: &str,
        effect: impl FnOnce() + Send + 'static,
    ) -> Self {
        self.responses.lock().unwrap().push_back(Scripted {
            exit_code,
            stderr: stderr.to_string(),
            effect: Some(Box::new(effect)),
        });
        self
    }

    /// Command lines run so far.
    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl ProcessDriver for ScriptedDriver {
    fn name(&self) -> &str {
        "scripted"
    }

    fn invoke<'a>(&'a self, command: &'a GitCommand) -> BoxFuture<'a, FlowResult<ProcessInvocation>> {
        Box::pin(async move {
            self.commands.lock().unwrap().push(command.command_line());
            let scripted = self.responses.lock().unwrap().pop_front();
            let (exit_code, stderr) = match scripted {
                Some(Scripted {
                    exit_code,
                    stderr,
                    effect,
                }) => {
                    if let Some(effect) = effect {
                        effect();
                    }
                    (exit_code, stderr)
                }
                None => (0, String::new()),
            };
            Ok(ProcessInvocation {
                command: command.command_line(),
                exit_code,
                stdout: String::new(),
                stderr,
                fail_on_nonzero: command.fail_on_nonzero(),
            })
        })
    }
}

// --- Harness ---

pub(crate) struct Harness {
    pub(crate) repo: Arc<FakeRepo>,
    pub(crate) ui: Arc<ScriptedUi>,
    pub(crate) driver: Arc<ScriptedDriver>,
    pub(crate) manager: TaskManager,
}

impl Harness {
    pub(crate) fn new(repo: FakeRepo, ui: ScriptedUi) -> Self {
        Self::with_driver(repo, ui, ScriptedDriver::new())
    }

    pub(crate) fn with_driver(repo: FakeRepo, ui: ScriptedUi, driver: ScriptedDriver) -> Self {
        Self::from_arcs(Arc::new(repo), ui, driver)
    }

    /// For tests whose driver effects need a handle on the repository.
    pub(crate) fn from_arcs(repo: Arc<FakeRepo>, ui: ScriptedUi, driver: ScriptedDriver) -> Self {
        let ui = Arc::new(ui);
        let driver = Arc::new(driver);
        let manager = TaskManager::new(
            Arc::clone(&repo) as Arc<dyn Repository>,
            Arc::clone(&ui) as Arc<dyn Ui>,
            Arc::clone(&driver) as Arc<dyn ProcessDriver>,
        );
        Self {
            repo,
            ui,
            driver,
            manager,
        }
    }

    pub(crate) fn with_trash(mut self, trash: crate::utility::trash::Trash) -> Self {
        self.manager = self.manager.with_trash(trash);
        self
    }

    pub(crate) fn with_suppressed(mut self, keys: &[&str]) -> Self {
        self.manager = self.manager.with_suppressed_prompts(keys.iter().copied());
        self
    }
}
