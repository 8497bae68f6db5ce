// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command implementations.
//!
//! ```text
//! CLI args --> cmd handlers
//!   options              config dump
//!   everything else      task: build Task, run, print report
//! ```

pub mod options;
pub mod task;
