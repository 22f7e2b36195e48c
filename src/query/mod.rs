// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query module - query assembly, excerpt highlighting and the search pipeline

pub mod assemble;
pub mod highlight;
pub mod search;

pub use assemble::{assemble, assemble_with_id, Clause, SearchQuery};
pub use highlight::{HighlightOptions, RenderLine, RenderPlan};
pub use search::{search, SearchHit, SearchPage, SearchRequest};
