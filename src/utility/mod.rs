// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Utility modules.
//!
//! ```text
//! trash
//!   Trash            backup directory capped at max_files
//!   write_file()     timestamped file, then prune()
//! ```

pub mod trash;
