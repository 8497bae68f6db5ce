// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Core infrastructure shared by the task engine.
//!
//! ```text
//!        core
//!         |
//!         v
//!      process
//!         |
//!   ProcessBuilder --> tokio::process::Command
//!   ProcessOutput  <-- exit code + captured lines
//! ```

pub mod process;
