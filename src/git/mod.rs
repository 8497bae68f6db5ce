// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git repository access.
//!
//! ```text
//!      task flows (worker context)
//!                |
//!                v
//!     ,----------------------,
//!     | Repository (trait)   |
//!     '----------+-----------'
//!                |
//!                v
//!          GitRepository
//!         gix: discover, HEAD
//!         git: refs, status, writes
//! ```
//!
//! Flows only see domain values from [`types`]; the process bridge used for
//! user-visible git commands lives in `task::tools::git`.

pub mod backend;
pub mod types;
