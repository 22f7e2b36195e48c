// SPDX-License-Identifier: MIT OR Apache-2.0

//! Indexer module - scanning, change-detection sync and the status record

pub mod scanner;
pub mod status;
pub mod sync;

pub use scanner::FileScanner;
pub use sync::{BatchReport, Indexer, SyncReport};
