// SPDX-License-Identifier: MIT OR Apache-2.0

//! codeseek - incremental source sync and line-level code search
//!
//! Shared modules for the codeseek CLI: the remote store client, the
//! change-detection indexer, query assembly, and match-window highlighting.

pub mod config;
pub mod errors;
pub mod indexer;
pub mod output;
pub mod query;
pub mod store;
