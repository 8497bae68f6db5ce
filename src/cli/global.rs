// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Global CLI options available for all commands.
//!
//! # Option Precedence
//!
//! ```text
//! --ini FILE          <- Additional config files (can repeat)
//! --log-level N       <- Console verbosity (0-5)
//! --file-log-level N  <- File verbosity (overrides --log-level)
//! --log-file FILE     <- global.log_file override
//! --set KEY=VAL       <- Direct config override (section.key=value)
//! -C DIR              <- Repository to operate on
//! --yes / --json      <- Host behavior, not configuration
//!
//! Precedence: CLI flags > --set > REPOTASK_* > --ini > repotask.toml > defaults
//! ```

use clap::Args;
use std::path::PathBuf;

/// Global options available for all commands.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalOptions {
    /// Path to additional TOML configuration file(s).
    /// Can be specified multiple times.
    #[arg(short = 'i', long = "ini", value_name = "FILE", action = clap::ArgAction::Append, global = true)]
    pub inis: Vec<PathBuf>,

    /// Console log level (0=silent, 1=errors, 2=warnings, 3=info, 4=debug, 5=trace).
    #[arg(
        short = 'l',
        long = "log-level",
        value_name = "LEVEL",
        value_parser = clap::value_parser!(u8).range(0..=5),
        global = true
    )]
    pub log_level: Option<u8>,

    /// File log level, overrides --log-level for the log file.
    #[arg(
        long = "file-log-level",
        value_name = "LEVEL",
        value_parser = clap::value_parser!(u8).range(0..=5),
        global = true
    )]
    pub file_log_level: Option<u8>,

    /// Path to log file.
    #[arg(long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Sets an option, such as 'trash.max_files=50'.
    /// Can be specified multiple times.
    #[arg(
        short = 's',
        long = "set",
        value_name = "OPTION",
        value_parser = parse_override,
        action = clap::ArgAction::Append,
        global = true
    )]
    pub options: Vec<(String, String)>,

    /// Runs as if started in DIR.
    #[arg(short = 'C', value_name = "DIR", global = true)]
    pub repo: Option<PathBuf>,

    /// Accepts every prompt and form with its defaults.
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Prints the task report as JSON.
    #[arg(long, global = true)]
    pub json: bool,
}

impl GlobalOptions {
    /// Converts command-line options to configuration overrides.
    ///
    /// Explicit flags come after `--set` values so that they win.
    #[must_use]
    pub fn to_config_overrides(&self) -> Vec<(String, String)> {
        let mut overrides = self.options.clone();

        if let Some(level) = self.log_level {
            overrides.push(("global.log_level".to_string(), level.to_string()));
        }

        // file_log_level falls back to log_level if not specified
        if let Some(level) = self.file_log_level.or(self.log_level) {
            overrides.push(("global.file_log_level".to_string(), level.to_string()));
        }

        if let Some(ref path) = self.log_file {
            overrides.push(("global.log_file".to_string(), path.display().to_string()));
        }

        overrides
    }

    /// Directory the repository is discovered from.
    #[must_use]
    pub fn repo_dir(&self) -> PathBuf {
        self.repo.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Parses `section.key=value`.
///
/// # Errors
///
/// Returns a message if there is no `=`, no section or an empty key.
pub fn parse_override(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    match key.split_once('.') {
        Some((section, name)) if !section.is_empty() && !name.is_empty() => {
            Ok((key.to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected 'section.key', got '{key}'")),
    }
}
