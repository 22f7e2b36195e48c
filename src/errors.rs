// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types with helpful suggestions
//!
//! Library errors are `thiserror` enums; the helpers at the bottom wrap them
//! into user-facing messages with actionable suggestions.

use std::fmt;
use thiserror::Error;

/// Failure talking to the remote search engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection refused, timeout, non-success HTTP status.
    #[error("transport failure talking to {host}: {message}")]
    Transport {
        host: String,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The engine answered with an `exception` payload instead of results.
    #[error("engine rejected the request: {message}")]
    Rejected {
        message: String,
        trace: Vec<String>,
    },

    /// The engine answered with something that is not the expected JSON.
    #[error("failed to decode engine response: {message}")]
    Decode {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl StoreError {
    /// Diagnostic trace lines attached by the engine, if any.
    pub fn trace(&self) -> &[String] {
        match self {
            StoreError::Rejected { trace, .. } => trace,
            _ => &[],
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// Failure of an indexing run. Batches submitted before the failure stay
/// submitted.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to scan {root}: {message}")]
    Scan { root: String, message: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("batch {batch} failed after {submitted_batches} batch(es) were submitted: {source}")]
    Batch {
        batch: usize,
        submitted_batches: usize,
        #[source]
        source: StoreError,
    },
}

/// Error indicating the remote engine could not be reached
#[derive(Debug)]
pub struct EngineUnreachableError {
    pub host: String,
}

impl fmt::Display for EngineUnreachableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Search engine not reachable at '{}'\n\n\
             Suggestion: start the engine or point codeseek at it.\n\
             Example: CODESEEK_HOST=http://localhost:3000 codeseek index\n\
             Or set `host` in .codeseekrc.toml",
            self.host
        )
    }
}

impl std::error::Error for EngineUnreachableError {}

/// Error indicating the source root to index does not exist
#[derive(Debug)]
pub struct SourceRootNotFoundError {
    pub root: String,
}

impl fmt::Display for SourceRootNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Source root not found at '{}'\n\n\
             Suggestion: pass the directory to index explicitly.\n\
             Example: codeseek index /path/to/sources\n\
             Or set `source_root` in .codeseekrc.toml",
            self.root
        )
    }
}

impl std::error::Error for SourceRootNotFoundError {}

/// Helper functions for creating helpful error messages
pub mod suggestions {
    /// Placeholder shown when the sync status record cannot be read
    pub fn status_unavailable_message() -> &'static str {
        ".. unable to open the status file .."
    }

    /// Get suggestion for an empty result page
    pub fn no_results_suggestion(query: &str) -> String {
        format!(
            "No results found for '{}'\n\n\
             Try:\n\
             - Fewer or different tokens (matching is case sensitive)\n\
             - Restricting by file name with @token, e.g. '@malloc realloc'\n\
             - Running 'codeseek index' to sync recent changes",
            query
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_error_keeps_trace() {
        let err = StoreError::Rejected {
            message: "boom".to_string(),
            trace: vec!["at Query.parse".to_string()],
        };
        assert_eq!(err.trace(), ["at Query.parse".to_string()]);
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn batch_error_names_batch_and_progress() {
        let err = SyncError::Batch {
            batch: 3,
            submitted_batches: 2,
            source: StoreError::Rejected {
                message: "index closed".to_string(),
                trace: Vec::new(),
            },
        };
        let text = err.to_string();
        assert!(text.contains("batch 3"));
        assert!(text.contains("2 batch(es)"));
    }
}
