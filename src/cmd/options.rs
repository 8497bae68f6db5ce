// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! The `options` command.

use crate::config::Config;

/// Lines printed by `repotask options`: every option, then the sources.
#[must_use]
pub fn options_lines(config: &Config, sources: &[String]) -> Vec<String> {
    let mut lines = config.format_options();
    lines.push(String::new());
    if sources.is_empty() {
        lines.push("No configuration files loaded".to_string());
    } else {
        lines.push("Configuration files:".to_string());
        lines.extend(sources.iter().map(|s| format!("  {s}")));
    }
    lines
}

/// Display current configuration options and where they came from.
pub fn run_options_command(config: &Config, sources: &[String]) {
    for line in options_lines(config, sources) {
        println!("{line}");
    }
}
