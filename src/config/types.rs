// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration sections.
//!
//! ```text
//! Config
//!   [global]   log_level, file_log_level, log_file, json_log
//!   [git]      executable, env
//!   [prompts]  suppressed
//!   [trash]    enabled, dir, max_files
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{ConfigError, Result};
use crate::logging::LogLevel;

/// Global configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Log level for console output (0-5).
    pub log_level: LogLevel,
    /// Log level for file output (0-5).
    pub file_log_level: LogLevel,
    /// Path to log file. No file log when unset.
    pub log_file: Option<PathBuf>,
    /// Write the file log as JSON lines.
    pub json_log: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::WARN,
            file_log_level: LogLevel::DEBUG,
            log_file: None,
            json_log: false,
        }
    }
}

/// Git executable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitConfig {
    /// Git executable, resolved through `PATH` when not absolute.
    pub executable: PathBuf,
    /// Extra environment variables for every git invocation.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("git"),
            env: BTreeMap::new(),
        }
    }
}

impl GitConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.executable.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                section: "git".to_string(),
                key: "executable".to_string(),
                message: "must not be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// "Don't show again" prompt keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PromptsConfig {
    /// Prompts with these keys are accepted without asking.
    pub suppressed: Vec<String>,
}

impl PromptsConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.suppressed.iter().any(|key| key.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                section: "prompts".to_string(),
                key: "suppressed".to_string(),
                message: "prompt keys must not be blank".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Backups of dropped stashes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrashConfig {
    /// Write a backup file before a stash is deleted.
    pub enabled: bool,
    /// Trash directory. Defaults to `<git dir>/repotask-trash`.
    pub dir: Option<PathBuf>,
    /// Oldest backups are removed beyond this count.
    pub max_files: usize,
}

impl Default for TrashConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            max_files: 250,
        }
    }
}

impl TrashConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_files == 0 {
            return Err(ConfigError::InvalidValue {
                section: "trash".to_string(),
                key: "max_files".to_string(),
                message: "must keep at least one backup".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
