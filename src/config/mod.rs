// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for repotask.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. repotask.toml (cwd, optional)
//! 3. --ini files
//! 4. REPOTASK_* env vars
//! 5. CLI overrides (-s section.key=value)
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! REPOTASK_GLOBAL__LOG_LEVEL=4       → global.log_level = 4
//! REPOTASK_GIT__EXECUTABLE=/bin/git  → git.executable = "/bin/git"
//! REPOTASK_TRASH__ENABLED=false      → trash.enabled = false
//! ```
//!
//! # Suppressed Prompts
//!
//! ```toml
//! [prompts]
//! suppressed = ["MergeMayCauseConflicts"]
//! ```

pub mod loader;
pub mod types;


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;

use loader::ConfigLoader;
use types::{GitConfig, GlobalConfig, PromptsConfig, TrashConfig};

const UNSET: &str = "<unset>";

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Global options.
    pub global: GlobalConfig,
    /// Git executable and environment.
    pub git: GitConfig,
    /// Prompts the user asked not to see again.
    pub prompts: PromptsConfig,
    /// Stash backups.
    pub trash: TrashConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use repotask::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file_optional("repotask.toml")
    ///     .with_env_prefix("REPOTASK")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Checks values that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error if the git executable is empty, a suppressed
    /// prompt key is blank, or the trash keeps no backups.
    pub fn validate(&self) -> Result<()> {
        self.git.validate()?;
        self.prompts.validate()?;
        self.trash.validate()?;
        Ok(())
    }

    /// Format configuration options for display, one `key = value` per line.
    ///
    /// Output is deterministically ordered using `BTreeMap`.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();

        options.insert(
            "global.log_level".to_string(),
            self.global.log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level".to_string(),
            self.global.file_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.log_file".to_string(),
            self.global
                .log_file
                .as_ref()
                .map_or_else(|| UNSET.to_string(), |p| p.display().to_string()),
        );
        options.insert(
            "global.json_log".to_string(),
            self.global.json_log.to_string(),
        );

        options.insert(
            "git.executable".to_string(),
            self.git.executable.display().to_string(),
        );
        for (key, value) in &self.git.env {
            options.insert(format!("git.env.{key}"), value.clone());
        }

        options.insert(
            "prompts.suppressed".to_string(),
            self.prompts.suppressed.join(", "),
        );

        options.insert("trash.enabled".to_string(), self.trash.enabled.to_string());
        options.insert(
            "trash.dir".to_string(),
            self.trash
                .dir
                .as_ref()
                .map_or_else(|| UNSET.to_string(), |p| p.display().to_string()),
        );
        options.insert(
            "trash.max_files".to_string(),
            self.trash.max_files.to_string(),
        );

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }
}
