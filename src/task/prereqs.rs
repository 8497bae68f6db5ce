// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Precondition gate.

use crate::git::types::RepoState;

use super::TaskPrereqs;

/// Checks `required` against a repository snapshot.
///
/// Flags absent from `required` are not checked.
///
/// # Errors
///
/// Returns the set of required flags that do not hold.
pub fn check_prereqs(required: TaskPrereqs, state: &RepoState) -> Result<(), TaskPrereqs> {
    let mut missing = TaskPrereqs::empty();

    if required.contains(TaskPrereqs::NO_CONFLICTS) && state.conflicts {
        missing |= TaskPrereqs::NO_CONFLICTS;
    }
    if required.contains(TaskPrereqs::NO_UNBORN) && state.head.is_unborn() {
        missing |= TaskPrereqs::NO_UNBORN;
    }
    if required.contains(TaskPrereqs::NO_DETACHED) && state.head.is_detached() {
        missing |= TaskPrereqs::NO_DETACHED;
    }
    if required.contains(TaskPrereqs::NO_STAGED_CHANGES) && state.staged_changes {
        missing |= TaskPrereqs::NO_STAGED_CHANGES;
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing)
    }
}
