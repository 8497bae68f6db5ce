// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Backup files for destructive operations.
//!
//! ```text
//! <trash dir>/
//!   000001767225600-DELETED_STASH-a1B2c3.txt   (oldest pruned beyond max_files)
//! ```
//!
//! File names start with a zero-padded timestamp so that name order is age
//! order.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

/// Directory of backup files with a size cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trash {
    dir: PathBuf,
    max_files: usize,
}

impl Trash {
    /// Creates a trash that keeps at most `max_files` backups, and never
    /// fewer than one.
    pub fn new(dir: impl Into<PathBuf>, max_files: usize) -> Self {
        Self {
            dir: dir.into(),
            max_files: max_files.max(1),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub const fn max_files(&self) -> usize {
        self.max_files
    }

    /// Writes `contents` to a new file named after `original_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the file cannot be written.
    pub fn write_file(&self, original_name: &str, ext: &str, contents: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        let (mut file, path) = tempfile::Builder::new()
            .prefix(&format!("{stamp:015}-{original_name}-"))
            .suffix(ext)
            .tempfile_in(&self.dir)?
            .keep()?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;
        info!(path = %path.display(), "saved backup to trash");

        self.prune_keeping(Some(&path))?;
        Ok(path)
    }

    /// Removes the oldest files beyond `max_files`. Returns how many went.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or a file removed.
    pub fn prune(&self) -> io::Result<usize> {
        self.prune_keeping(None)
    }

    /// Same as [`Trash::prune`], but `keep` survives even when it sorts
    /// among the oldest.
    fn prune_keeping(&self, keep: Option<&Path>) -> io::Result<usize> {
        let mut files = self.files()?;
        if files.len() <= self.max_files {
            return Ok(0);
        }
        let excess = files.len() - self.max_files;
        files.retain(|f| Some(f.as_path()) != keep);
        for path in files.drain(..excess) {
            debug!(path = %path.display(), "pruning trash");
            fs::remove_file(path)?;
        }
        Ok(excess)
    }

    /// Files in the trash, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn files(&self) -> io::Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}
