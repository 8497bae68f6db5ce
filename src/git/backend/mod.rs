// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Repository backend.
//!
//! ```text
//! Repository (trait, sync, Send + Sync)
//!      |
//!      v
//! GitRepository
//!   gix  --> discover, head name     (no subprocess)
//!   git  --> refs, status, merge-base, branch/stash writes
//! ```
//!
//! Every method may block. The executor only calls them from the
//! worker context (tokio's blocking pool).

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::config::types::GitConfig;
use crate::error::{GixError, RepoError, RepoResult};

use super::types::{
    Branch, CommitId, FileStatus, HeadState, MergeAnalysis, REMOTES_PREFIX, RemoteBranch,
    RepoState,
};

// --- Repository Trait ---

/// Synchronous repository API consumed by task flows.
pub trait Repository: Send + Sync {
    /// Root of the working tree.
    fn workdir(&self) -> &Path;

    /// The `.git` directory.
    fn git_dir(&self) -> &Path;

    /// Where HEAD points.
    ///
    /// # Errors
    ///
    /// Returns a `RepoError` if HEAD cannot be read.
    fn head(&self) -> RepoResult<HeadState>;

    /// Porcelain status, untracked files included.
    ///
    /// # Errors
    ///
    /// Returns a `RepoError` if `git status` fails.
    fn status(&self) -> RepoResult<Vec<FileStatus>>;

    /// Facts for the prerequisite gate.
    ///
    /// # Errors
    ///
    /// Returns a `RepoError` if HEAD or status cannot be read.
    fn snapshot(&self) -> RepoResult<RepoState> {
        let head = self.head()?;
        let status = self.status()?;
        Ok(RepoState {
            head,
            conflicts: status.iter().any(FileStatus::is_conflicted),
            staged_changes: status.iter().any(FileStatus::is_staged),
        })
    }

    /// All local branches, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns a `RepoError` if references cannot be listed.
    fn local_branches(&self) -> RepoResult<Vec<Branch>>;

    /// # Errors
    ///
    /// Returns `RepoError::BranchNotFound` if there is no such local branch.
    fn local_branch(&self, name: &str) -> RepoResult<Branch> {
        self.local_branches()?
            .into_iter()
            .find(|b| b.name == name)
            .ok_or_else(|| RepoError::BranchNotFound {
                branch: name.to_string(),
            })
    }

    /// # Errors
    ///
    /// Returns a `RepoError` if references cannot be listed.
    fn local_branch_names(&self) -> RepoResult<Vec<String>> {
        Ok(self.local_branches()?.into_iter().map(|b| b.name).collect())
    }

    /// Looks up a remote-tracking branch by shorthand (`origin/main`).
    ///
    /// # Errors
    ///
    /// Returns `RepoError::BranchNotFound` if there is no such remote branch.
    fn remote_branch(&self, shorthand: &str) -> RepoResult<RemoteBranch>;

    /// Full refnames of all branches whose tip is `commit`.
    ///
    /// # Errors
    ///
    /// Returns a `RepoError` if references cannot be listed.
    fn refs_pointing_at(&self, commit: &CommitId) -> RepoResult<Vec<String>>;

    /// Resolves a hash, possibly abbreviated, or revision to a commit.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::InvalidObject` if nothing matches.
    fn resolve_commit(&self, needle: &str) -> RepoResult<CommitId>;

    /// # Errors
    ///
    /// Returns a `RepoError` if the commit does not exist.
    fn commit_message(&self, commit: &CommitId) -> RepoResult<String>;

    /// Compares `theirs` against `our_ref` (HEAD when `None`).
    ///
    /// # Errors
    ///
    /// Returns a `RepoError` if either side cannot be resolved.
    fn merge_analysis(&self, theirs: &CommitId, our_ref: Option<&str>)
    -> RepoResult<MergeAnalysis>;

    /// Paths of registered submodules.
    ///
    /// # Errors
    ///
    /// Returns a `RepoError` if `.gitmodules` exists but cannot be read.
    fn submodule_paths(&self) -> RepoResult<Vec<String>>;

    /// Position of a stash commit in the stash list (`stash@{n}`).
    ///
    /// # Errors
    ///
    /// Returns `RepoError::StashNotFound` if the commit is not a stash.
    fn find_stash_index(&self, stash: &CommitId) -> RepoResult<usize>;

    /// # Errors
    ///
    /// Returns a `RepoError` if the branch cannot be renamed.
    fn rename_branch(&self, old: &str, new: &str) -> RepoResult<()>;

    /// # Errors
    ///
    /// Returns a `RepoError` if the branch cannot be deleted.
    fn delete_branch(&self, name: &str) -> RepoResult<()>;

    /// # Errors
    ///
    /// Returns a `RepoError` if the name is taken or invalid.
    fn create_branch(&self, name: &str, target: &CommitId) -> RepoResult<()>;

    /// Sets (`Some("origin/main")`) or clears (`None`) the upstream.
    ///
    /// # Errors
    ///
    /// Returns a `RepoError` if the branch or upstream does not exist.
    fn set_upstream(&self, local: &str, upstream: Option<&str>) -> RepoResult<()>;

    /// Stashes `paths` without touching the working tree.
    ///
    /// # Errors
    ///
    /// Returns a `RepoError` if the stash cannot be created.
    fn create_stash(&self, message: &str, paths: &[String]) -> RepoResult<CommitId>;

    /// Reverts `paths` to their HEAD state. Files absent from HEAD are removed.
    ///
    /// # Errors
    ///
    /// Returns a `RepoError` if a checkout or removal fails.
    fn restore_files_from_head(&self, paths: &[String]) -> RepoResult<()>;
}

// --- GitRepository ---

/// Repository backed by gix for discovery and the git CLI for the rest.
#[derive(Debug, Clone)]
pub struct GitRepository {
    workdir: PathBuf,
    git_dir: PathBuf,
    executable: PathBuf,
    env: Vec<(String, String)>,
}

impl GitRepository {
    /// Opens the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns a `RepoError` if no repository is found or it is bare.
    pub fn open(path: &Path, config: &GitConfig) -> RepoResult<Self> {
        let repo = gix::discover(path).map_err(|e| GixError::Discover(Box::new(e)))?;
        let workdir = repo.workdir().ok_or(GixError::BareRepository)?;
        let workdir = std::fs::canonicalize(workdir)?;
        let git_dir = std::fs::canonicalize(repo.git_dir())?;

        Ok(Self {
            workdir,
            git_dir,
            executable: config.executable.clone(),
            env: config
                .env
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }

    /// Returns true if `path` is inside a git work tree.
    #[must_use]
    pub fn is_git_repo(path: &Path) -> bool {
        gix::discover(path).is_ok()
    }

    fn run(&self, args: &[&str]) -> RepoResult<Output> {
        Command::new(&self.executable)
            .args(args)
            .current_dir(&self.workdir)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .env("GCM_INTERACTIVE", "never")
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(|e| {
                std::io::Error::new(e.kind(), format!("failed to execute git: {e}")).into()
            })
    }

    fn failed(args: &[&str], output: &Output) -> RepoError {
        RepoError::CommandFailed {
            command: format!("git {}", args.join(" ")),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    /// Runs git, failing on non-zero exit. Output is not trimmed.
    fn git_raw(&self, args: &[&str]) -> RepoResult<String> {
        let output = self.run(args)?;
        if !output.status.success() {
            return Err(Self::failed(args, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Runs git and returns trimmed stdout.
    fn git_command(&self, args: &[&str]) -> RepoResult<String> {
        self.git_raw(args).map(|s| s.trim().to_string())
    }

    /// Runs a git predicate: exit 0 is true, exit 1 is false.
    fn git_check(&self, args: &[&str]) -> RepoResult<bool> {
        let output = self.run(args)?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(Self::failed(args, &output)),
        }
    }

    fn rev_parse(&self, rev: &str) -> RepoResult<Option<CommitId>> {
        let spec = format!("{rev}^{{commit}}");
        let output = self.run(&["rev-parse", "--verify", "--quiet", &spec])?;
        if !output.status.success() {
            return Ok(None);
        }
        let hex = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Some(CommitId::new(hex)))
    }

    fn remotes(&self) -> RepoResult<Vec<String>> {
        Ok(self
            .git_command(&["remote"])?
            .lines()
            .map(str::to_string)
            .collect())
    }
}

/// Parses `git status --porcelain=v1 -z` output.
///
/// Rename and copy records are followed by their source path, which is skipped.
pub(crate) fn parse_porcelain_z(raw: &str) -> Vec<FileStatus> {
    let mut entries = Vec::new();
    let mut records = raw.split('\0').filter(|r| !r.is_empty());

    while let Some(record) = records.next() {
        let mut chars = record.chars();
        let (Some(index), Some(worktree)) = (chars.next(), chars.next()) else {
            continue;
        };
        let path = record.get(3..).unwrap_or_default().to_string();
        if matches!(index, 'R' | 'C') {
            records.next();
        }
        entries.push(FileStatus {
            path,
            index,
            worktree,
        });
    }

    entries
}

impl Repository for GitRepository {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn head(&self) -> RepoResult<HeadState> {
        let repo = gix::discover(&self.workdir).map_err(|e| GixError::Discover(Box::new(e)))?;
        let head_name = repo.head_name().map_err(GixError::Head)?;

        match head_name {
            Some(name) => {
                let branch = name.shorten().to_string();
                Ok(match self.rev_parse("HEAD")? {
                    Some(commit) => HeadState::Branch {
                        name: branch,
                        commit,
                    },
                    None => HeadState::Unborn { branch },
                })
            }
            None => {
                let commit = self
                    .rev_parse("HEAD")?
                    .ok_or_else(|| RepoError::RefNotFound {
                        refname: "HEAD".to_string(),
                    })?;
                Ok(HeadState::Detached { commit })
            }
        }
    }

    fn status(&self) -> RepoResult<Vec<FileStatus>> {
        let raw = self.git_raw(&["status", "--porcelain=v1", "-z", "--untracked-files=all"])?;
        Ok(parse_porcelain_z(&raw))
    }

    fn local_branches(&self) -> RepoResult<Vec<Branch>> {
        let out = self.git_command(&[
            "for-each-ref",
            "--format=%(refname:strip=2)%00%(objectname)%00%(upstream)%00%(HEAD)",
            "refs/heads",
        ])?;

        let mut branches: Vec<Branch> = out
            .lines()
            .filter_map(|line| {
                let mut fields = line.split('\0');
                let name = fields.next()?.to_string();
                let target = CommitId::new(fields.next()?);
                let upstream = fields.next().filter(|u| !u.is_empty()).map(str::to_string);
                let checked_out = fields.next() == Some("*");
                Some(Branch {
                    name,
                    target,
                    upstream,
                    checked_out,
                })
            })
            .collect();
        branches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(branches)
    }

    fn remote_branch(&self, shorthand: &str) -> RepoResult<RemoteBranch> {
        let not_found = || RepoError::BranchNotFound {
            branch: shorthand.to_string(),
        };
        let target = self
            .rev_parse(&format!("{REMOTES_PREFIX}{shorthand}"))?
            .ok_or_else(not_found)?;
        let remote = self
            .remotes()?
            .into_iter()
            .filter(|r| shorthand.starts_with(&format!("{r}/")))
            .max_by_key(String::len)
            .ok_or_else(not_found)?;

        Ok(RemoteBranch {
            shorthand: shorthand.to_string(),
            remote,
            target,
        })
    }

    fn refs_pointing_at(&self, commit: &CommitId) -> RepoResult<Vec<String>> {
        let points_at = format!("--points-at={commit}");
        let out = self.git_command(&[
            "for-each-ref",
            &points_at,
            "--format=%(refname)",
            "refs/heads",
            "refs/remotes",
        ])?;
        Ok(out
            .lines()
            .filter(|r| !r.ends_with("/HEAD"))
            .map(str::to_string)
            .collect())
    }

    fn resolve_commit(&self, needle: &str) -> RepoResult<CommitId> {
        let needle = needle.trim();
        if needle.is_empty() || needle.starts_with('-') {
            return Err(RepoError::InvalidObject {
                needle: needle.to_string(),
            });
        }
        self.rev_parse(needle)?
            .ok_or_else(|| RepoError::InvalidObject {
                needle: needle.to_string(),
            })
    }

    fn commit_message(&self, commit: &CommitId) -> RepoResult<String> {
        self.git_command(&["log", "-1", "--format=%B", commit.as_str()])
    }

    fn merge_analysis(
        &self,
        theirs: &CommitId,
        our_ref: Option<&str>,
    ) -> RepoResult<MergeAnalysis> {
        let Some(ours) = self.rev_parse(our_ref.unwrap_or("HEAD"))? else {
            return Ok(MergeAnalysis::UNBORN);
        };

        if &ours == theirs
            || self.git_check(&["merge-base", "--is-ancestor", theirs.as_str(), ours.as_str()])?
        {
            Ok(MergeAnalysis::UP_TO_DATE)
        } else if self.git_check(&["merge-base", "--is-ancestor", ours.as_str(), theirs.as_str()])? {
            Ok(MergeAnalysis::FASTFORWARD | MergeAnalysis::NORMAL)
        } else {
            Ok(MergeAnalysis::NORMAL)
        }
    }

    fn submodule_paths(&self) -> RepoResult<Vec<String>> {
        if !self.workdir.join(".gitmodules").is_file() {
            return Ok(Vec::new());
        }
        let args = [
            "config",
            "--file",
            ".gitmodules",
            "--get-regexp",
            r"^submodule\..*\.path$",
        ];
        if !self.git_check(&args)? {
            return Ok(Vec::new());
        }
        let out = self.git_command(&args)?;
        Ok(out
            .lines()
            .filter_map(|line| line.split_once(' ').map(|(_, path)| path.to_string()))
            .collect())
    }

    fn find_stash_index(&self, stash: &CommitId) -> RepoResult<usize> {
        let out = self.git_command(&["stash", "list", "--format=%H"])?;
        out.lines()
            .position(|id| id == stash.as_str())
            .ok_or_else(|| RepoError::StashNotFound {
                id: stash.to_string(),
            })
    }

    fn rename_branch(&self, old: &str, new: &str) -> RepoResult<()> {
        self.git_command(&["branch", "-m", old, new])?;
        Ok(())
    }

    fn delete_branch(&self, name: &str) -> RepoResult<()> {
        self.git_command(&["branch", "-D", name])?;
        Ok(())
    }

    fn create_branch(&self, name: &str, target: &CommitId) -> RepoResult<()> {
        self.git_command(&["branch", name, target.as_str()])?;
        Ok(())
    }

    fn set_upstream(&self, local: &str, upstream: Option<&str>) -> RepoResult<()> {
        match upstream {
            Some(upstream) => {
                let flag = format!("--set-upstream-to={upstream}");
                self.git_command(&["branch", &flag, local])?
            }
            None => self.git_command(&["branch", "--unset-upstream", local])?,
        };
        Ok(())
    }

    fn create_stash(&self, message: &str, paths: &[String]) -> RepoResult<CommitId> {
        let mut args = vec!["stash", "push", "--include-untracked", "-m", message, "--"];
        args.extend(paths.iter().map(String::as_str));
        self.git_command(&args)?;

        // `stash push` cleans the stashed paths; put them back.
        self.git_command(&["stash", "apply", "--index", "stash@{0}"])?;

        self.rev_parse("stash@{0}")?
            .ok_or_else(|| RepoError::RefNotFound {
                refname: "refs/stash".to_string(),
            })
    }

    fn restore_files_from_head(&self, paths: &[String]) -> RepoResult<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let mut args = vec!["ls-tree", "--name-only", "-z", "-r", "HEAD", "--"];
        args.extend(paths.iter().map(String::as_str));
        let raw = self.git_raw(&args)?;
        let in_head: Vec<&str> = raw.split('\0').filter(|p| !p.is_empty()).collect();

        if !in_head.is_empty() {
            let mut args = vec!["checkout", "HEAD", "--"];
            args.extend(in_head.iter().copied());
            self.git_command(&args)?;
        }

        for path in paths.iter().filter(|p| !in_head.contains(&p.as_str())) {
            self.git_command(&["rm", "--cached", "--quiet", "--ignore-unmatch", "--", path])?;
            let full = self.workdir.join(path);
            if full.is_file() {
                std::fs::remove_file(&full)?;
            }
        }
        Ok(())
    }
}
