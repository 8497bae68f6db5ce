// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Naming and message helpers shared by the task flows.
//!
//! # Functions
//!
//! | Function | Purpose |
//! |----------|---------|
//! | [`branch_name_error`] | Validate a branch name the way `git check-ref-format` does |
//! | [`branch_folder_error`] | Validate the new name of a branch folder |
//! | [`rename_in_folder`] | Move a branch name from one folder to another |
//! | [`with_unique_suffix`] | Append `-2`, `-3`... until a name is free |
//! | [`strip_stash_message`] | Drop the `On branch:` prefix git adds to stash messages |
//! | [`message_summary`] | First line of a commit message |
//! | [`quote`] / [`plural`] | Message formatting |

use regex::Regex;
use std::sync::LazyLock;

/// Characters git refuses anywhere in a reference name.
const FORBIDDEN_CHARS: &[char] = &[' ', '~', '^', ':', '?', '*', '[', '\\'];

/// Sequences git refuses anywhere in a reference name.
const FORBIDDEN_SEQUENCES: &[&str] = &["..", "@{", "//", "/."];

/// Longest commit summary shown in dialogs.
const SUMMARY_MAX_CHARS: usize = 200;

static STASH_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?:WIP on|On) (?:\(no branch\)|[^\s:]+): ").ok());

/// Wraps a name in single quotes for messages.
#[must_use]
pub fn quote(name: &str) -> String {
    format!("'{name}'")
}

/// `"1 branch"` / `"3 branches"`.
#[must_use]
pub fn plural(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

/// Returns why `name` cannot be used as a new branch name, or `None` if it can.
///
/// `reserved` holds the names of existing branches; a clash is reported with
/// `taken_message`.
#[must_use]
pub fn branch_name_error(name: &str, reserved: &[String], taken_message: &str) -> Option<String> {
    if name.is_empty() {
        return Some("Cannot be empty.".to_string());
    }
    if name == "@" || name == "HEAD" {
        return Some("Illegal name.".to_string());
    }
    if name.starts_with(['/', '.', '-']) {
        return Some("Illegal prefix.".to_string());
    }
    if name.ends_with(['/', '.']) || name.ends_with(".lock") {
        return Some("Illegal suffix.".to_string());
    }
    if name
        .chars()
        .any(|c| c.is_ascii_control() || FORBIDDEN_CHARS.contains(&c))
    {
        return Some("Contains a disallowed character.".to_string());
    }
    if FORBIDDEN_SEQUENCES.iter().any(|seq| name.contains(seq))
        || name.split('/').any(|part| part.ends_with(".lock"))
    {
        return Some("Contains a disallowed character sequence.".to_string());
    }
    if reserved.iter().any(|r| r == name) {
        return Some(taken_message.to_string());
    }
    None
}

/// Rebases `branch` from `old_folder` onto `new_folder` (empty = root).
///
/// `feature/x` moved from `feature` to `topic` becomes `topic/x`, and to the
/// root becomes `x`.
#[must_use]
pub fn rename_in_folder(branch: &str, old_folder: &str, new_folder: &str) -> String {
    let rest = branch.strip_prefix(old_folder).unwrap_or(branch);
    let renamed = format!("{new_folder}{rest}");
    renamed.strip_prefix('/').unwrap_or(&renamed).to_string()
}

/// Returns why the branches of `old_folder` cannot move to `new_folder`.
///
/// An empty `new_folder` moves the branches to the root and is valid unless
/// it causes a clash.
#[must_use]
pub fn branch_folder_error(
    new_folder: &str,
    old_folder: &str,
    branches: &[String],
    reserved: &[String],
) -> Option<String> {
    for branch in branches {
        let renamed = rename_in_folder(branch, old_folder, new_folder);
        if reserved.contains(&renamed) {
            return Some(format!(
                "This name clashes with existing branch {}.",
                quote(&renamed)
            ));
        }
    }
    if new_folder.is_empty() {
        return None;
    }
    branch_name_error(new_folder, &[], "")
}

/// Returns `name`, or `name-2`, `name-3`... whichever is not in `taken`.
#[must_use]
pub fn with_unique_suffix(name: &str, taken: &[String]) -> String {
    if !taken.iter().any(|t| t == name) {
        return name.to_string();
    }
    (2..)
        .map(|i| format!("{name}-{i}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// Removes the `On main: ` / `WIP on main: ` prefix of a stash message.
#[must_use]
pub fn strip_stash_message(message: &str) -> String {
    let message = message.trim_end();
    match STASH_PREFIX.as_ref() {
        Some(re) => re.replace(message, "").into_owned(),
        None => message.to_string(),
    }
}

/// First line of a commit message, and whether anything was left out.
#[must_use]
pub fn message_summary(message: &str) -> (String, bool) {
    let trimmed = message.trim();
    let mut lines = trimmed.lines();
    let first = lines.next().unwrap_or_default();
    let more_lines = lines.any(|l| !l.trim().is_empty());

    if first.chars().count() > SUMMARY_MAX_CHARS {
        let cut: String = first.chars().take(SUMMARY_MAX_CHARS).collect();
        (format!("{cut}\u{2026}"), true)
    } else {
        (first.to_string(), more_lines)
    }
}
