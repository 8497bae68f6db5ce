// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for configuration loading.
//!
//! Command-line options travel as strings through `--set` and the global
//! flags; these tests check they land in the typed sections.

use clap::Parser;
use repotask::cli::Cli;
use repotask::config::Config;
use repotask::config::loader::ConfigLoader;
use repotask::logging::LogLevel;

fn load(args: &[&str], loader: ConfigLoader) -> repotask::error::Result<Config> {
    let cli = Cli::try_parse_from(std::iter::once("repotask").chain(args.iter().copied()))?;
    let mut loader = loader;
    for (key, value) in cli.global.to_config_overrides() {
        loader = loader.set(&key, value)?;
    }
    loader.build()
}

#[test]
fn config_defaults_without_options() {
    let config = load(&["options"], ConfigLoader::new()).unwrap();

    assert_eq!(config.global.log_level, LogLevel::WARN);
    assert!(config.trash.enabled);
    assert_eq!(config.trash.max_files, 250);
    assert!(config.prompts.suppressed.is_empty());
}

#[test]
fn config_string_overrides_are_typed() {
    let config = load(
        &[
            "-s",
            "trash.max_files=5",
            "-s",
            "trash.enabled=false",
            "-s",
            "git.executable=/opt/git/bin/git",
            "options",
        ],
        ConfigLoader::new(),
    )
    .unwrap();

    assert_eq!(config.trash.max_files, 5);
    assert!(!config.trash.enabled);
    assert_eq!(
        config.git.executable,
        std::path::PathBuf::from("/opt/git/bin/git")
    );
}

#[test]
fn config_log_flags_beat_files() {
    let loader = ConfigLoader::new().add_toml_str(
        r"
[global]
log_level = 1
file_log_level = 1
",
    );

    let config = load(&["-l", "4", "options"], loader).unwrap();

    assert_eq!(config.global.log_level, LogLevel::DEBUG);
    assert_eq!(config.global.file_log_level, LogLevel::DEBUG);
}

#[test]
fn config_file_log_level_is_separate() {
    let config = load(
        &["-l", "1", "--file-log-level", "5", "options"],
        ConfigLoader::new(),
    )
    .unwrap();

    assert_eq!(config.global.log_level, LogLevel::ERROR);
    assert_eq!(config.global.file_log_level, LogLevel::TRACE);
}

#[test]
fn config_ini_file_layers() {
    let dir = tempfile::tempdir().unwrap();
    let ini = dir.path().join("extra.toml");
    std::fs::write(
        &ini,
        r#"
[prompts]
suppressed = ["MergeMayCauseConflicts"]

[trash]
max_files = 7
"#,
    )
    .unwrap();

    let loader = ConfigLoader::new()
        .add_toml_str("[trash]\nmax_files = 3\n")
        .add_toml_file(&ini);
    let sources = loader.format_sources();
    let config = load(&["options"], loader).unwrap();

    assert_eq!(config.trash.max_files, 7);
    assert_eq!(config.prompts.suppressed, ["MergeMayCauseConflicts"]);
    assert_eq!(sources.len(), 2);
    assert!(sources[1].starts_with("2. [file] "));
}

#[test]
fn config_invalid_override_is_rejected() {
    let result = load(&["-s", "trash.max_files=lots", "options"], ConfigLoader::new());
    assert!(result.is_err());
}
