// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search pipeline: assemble, query the engine, highlight every hit.
//!
//! A search never fails outward. Engine problems come back as a page with
//! `total = -1` and a readable error.

use chrono::DateTime;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::StoreError;
use crate::query::assemble::{assemble_with_id, SearchQuery};
use crate::query::highlight::{plan, HighlightOptions, RenderPlan};
use crate::store::wire::{Hit, FIELD_CONTENT};
use crate::store::{Engine, QueryOptions, StoreClient};

/// One search request as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    /// Restrict to one document and show it whole.
    pub id: Option<String>,
    pub page: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    fn id_filter(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// RFC 3339 time of the run that stored this version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Matched line entries reported by the engine.
    pub matches: usize,
    pub first_match: Option<usize>,
    pub excerpt: RenderPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub page: usize,
    pub pages: i64,
    /// `-1` when the request failed.
    pub total: i64,
    pub took: i64,
    pub hits: Vec<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchPage {
    fn empty(request: &SearchRequest) -> Self {
        Self {
            query: request.query.clone(),
            id: request.id_filter().map(str::to_string),
            page: request.page,
            pages: 0,
            total: 0,
            took: 0,
            hits: Vec::new(),
            error: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.total < 0
    }
}

/// Run a search. Whitespace-only input makes no request.
pub fn search<E: Engine>(
    client: &StoreClient<E>,
    config: &Config,
    request: &SearchRequest,
) -> SearchPage {
    let mut page = SearchPage::empty(request);
    if request.query.trim().is_empty() {
        return page;
    }

    let started = Instant::now();
    let query = assemble_with_id(&request.query, request.id_filter());
    match fetch(client, config, request, &query, &mut page) {
        Ok(()) => debug!(
            total = page.total,
            hits = page.hits.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search finished"
        ),
        Err(err) => {
            warn!(error = %err, "search failed");
            page.total = -1;
            page.pages = 0;
            page.hits.clear();
            page.error = Some(describe(&err));
        }
    }
    page
}

fn fetch<E: Engine>(
    client: &StoreClient<E>,
    config: &Config,
    request: &SearchRequest,
    query: &SearchQuery,
    page: &mut SearchPage,
) -> Result<(), StoreError> {
    let per_page = config.per_page.max(1);
    let options = QueryOptions {
        page: request.page,
        page_size: per_page,
        // Matched lines only come back as result state when explaining.
        explain: true,
        ..QueryOptions::default()
    };
    let response = client.query(&query.to_wire(), &options)?;

    let highlight = HighlightOptions {
        budget: config.show_lines_per_item,
        radius: config.context_radius,
        full_document: request.id_filter().is_some(),
    };

    page.total = response.total.max(0);
    page.took = response.took;
    page.pages = page.total / per_page as i64;
    page.hits = response
        .hits
        .iter()
        .map(|hit| to_search_hit(hit, &highlight))
        .collect();
    Ok(())
}

fn to_search_hit(hit: &Hit, options: &HighlightOptions) -> SearchHit {
    let matched = hit.matched_lines();
    let content = hit.field_str(FIELD_CONTENT).unwrap_or_default();
    let excerpt = plan(content, &matched, options);
    SearchHit {
        id: hit.id().unwrap_or_default().to_string(),
        score: hit.score,
        explanation: hit.explanation_text(),
        updated_at: hit
            .stamp()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|time| time.to_rfc3339()),
        matches: hit.result_state_len(),
        first_match: excerpt.first_match,
        excerpt,
    }
}

/// Message followed by the engine's diagnostic trace, if any.
fn describe(err: &StoreError) -> String {
    let mut text = err.to_string();
    for line in err.trace() {
        text.push('\n');
        text.push_str(line);
    }
    text
}
