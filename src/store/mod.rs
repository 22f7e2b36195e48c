// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fingerprint store client.
//!
//! Thin, synchronous layer over a remote full-text engine: existence checks
//! by `(id, fingerprint)`, document submission, read queries, deletes and
//! engine statistics. Failures are surfaced to the caller, never retried.

pub mod fingerprint;
pub mod http;
pub mod wire;

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::config::Config;
use crate::errors::StoreError;
use wire::{
    DeleteRequest, FindRequest, FindResponse, QueryNode, WireDocument, WriteRequest, FIELD_HASH,
    FIELD_ID,
};

pub use fingerprint::{fingerprint, normalize_utf8};
pub use http::HttpEngine;

/// Transport seam to the engine. `HttpEngine` is the production
/// implementation; tests plug in an in-memory one.
pub trait Engine {
    fn find(&self, request: &FindRequest<'_>) -> Result<FindResponse, StoreError>;
    fn index(&self, request: &WriteRequest<'_>) -> Result<Value, StoreError>;
    fn delete(&self, request: &DeleteRequest<'_>) -> Result<Value, StoreError>;
    fn stat(&self) -> Result<Value, StoreError>;
}

impl<E: Engine + ?Sized> Engine for &E {
    fn find(&self, request: &FindRequest<'_>) -> Result<FindResponse, StoreError> {
        (**self).find(request)
    }

    fn index(&self, request: &WriteRequest<'_>) -> Result<Value, StoreError> {
        (**self).index(request)
    }

    fn delete(&self, request: &DeleteRequest<'_>) -> Result<Value, StoreError> {
        (**self).delete(request)
    }

    fn stat(&self) -> Result<Value, StoreError> {
        (**self).stat()
    }
}

/// A source file ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Root-relative path with a leading `/`; stable across runs.
    pub id: String,
    pub path: String,
    pub content: String,
    pub fingerprint: String,
    /// Unix seconds of the run that built this document.
    pub indexed_at: i64,
}

impl Document {
    /// Build a document from raw file bytes. The fingerprint covers the raw
    /// bytes; the content is normalized to valid UTF-8.
    pub fn from_bytes(id: impl Into<String>, bytes: &[u8], indexed_at: i64) -> Self {
        let id = id.into();
        Self {
            path: id.clone(),
            id,
            content: normalize_utf8(bytes),
            fingerprint: fingerprint(bytes),
            indexed_at,
        }
    }

    fn to_wire(&self) -> WireDocument {
        WireDocument {
            id: self.id.clone(),
            filename: self.path.clone(),
            content: self.content.clone(),
            hash: self.fingerprint.clone(),
            stamp: self.indexed_at,
        }
    }
}

/// Read query options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub page: usize,
    pub page_size: usize,
    pub explain: bool,
    pub refresh: bool,
    /// Restrict returned stored fields; `None` returns all of them.
    pub fields: Option<Vec<String>>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: 15,
            explain: false,
            refresh: false,
            fields: None,
        }
    }
}

/// Client bound to one engine index.
pub struct StoreClient<E> {
    engine: E,
    index: String,
    lookup_batch_size: usize,
    force_merge: u32,
}

impl<E: Engine> StoreClient<E> {
    pub fn new(engine: E, index: impl Into<String>) -> Self {
        Self {
            engine,
            index: index.into(),
            lookup_batch_size: 512,
            force_merge: 0,
        }
    }

    pub fn from_config(engine: E, config: &Config) -> Self {
        Self::new(engine, config.index.clone())
            .with_lookup_batch_size(config.lookup_batch_size)
            .with_force_merge(config.force_merge)
    }

    /// Maximum number of documents per existence-check request (at least 1).
    pub fn with_lookup_batch_size(mut self, size: usize) -> Self {
        self.lookup_batch_size = size.max(1);
        self
    }

    pub fn with_force_merge(mut self, force_merge: u32) -> Self {
        self.force_merge = force_merge;
        self
    }

    /// Ids whose `(id, fingerprint)` pair is already stored unchanged.
    ///
    /// Empty input makes no request. Larger inputs are split into lookups of
    /// at most `lookup_batch_size` pairs, issued sequentially.
    pub fn check_existing(&self, pairs: &[(String, String)]) -> Result<BTreeSet<String>, StoreError> {
        let mut unchanged = BTreeSet::new();
        for slice in pairs.chunks(self.lookup_batch_size) {
            let query = QueryNode::should(
                slice
                    .iter()
                    .map(|(id, hash)| {
                        QueryNode::must(vec![
                            QueryNode::term(FIELD_ID, id.as_str()),
                            QueryNode::term(FIELD_HASH, hash.as_str()),
                        ])
                    })
                    .collect(),
            );
            let mut fields = BTreeMap::new();
            fields.insert(FIELD_ID.to_string(), true);
            let request = FindRequest {
                index: &self.index,
                query: &query,
                fields: Some(fields),
                analyzer: wire::analyzer(),
                explain: false,
                page: 0,
                size: slice.len(),
                refresh: false,
            };
            let response = self.checked_find(&request)?;
            debug!(
                lookups = slice.len(),
                hits = response.hits.len(),
                "existence check"
            );
            unchanged.extend(response.hits.iter().filter_map(|hit| hit.id().map(str::to_string)));
        }
        Ok(unchanged)
    }

    /// Send documents to the engine; returns what was sent.
    pub fn submit(&self, documents: Vec<Document>) -> Result<Vec<Document>, StoreError> {
        if documents.is_empty() {
            return Ok(documents);
        }
        let wire_docs: Vec<WireDocument> = documents.iter().map(Document::to_wire).collect();
        let request = WriteRequest {
            index: &self.index,
            documents: &wire_docs,
            analyzer: wire::analyzer(),
            force_merge: self.force_merge,
        };
        let response = self.engine.index(&request)?;
        wire::ensure_accepted(response)?;
        debug!(documents = documents.len(), "submitted");
        Ok(documents)
    }

    /// Read query.
    pub fn query(&self, query: &QueryNode, options: &QueryOptions) -> Result<FindResponse, StoreError> {
        let fields = options.fields.as_ref().map(|names| {
            names
                .iter()
                .map(|name| (name.clone(), true))
                .collect::<BTreeMap<_, _>>()
        });
        let request = FindRequest {
            index: &self.index,
            query,
            fields,
            analyzer: wire::analyzer(),
            explain: options.explain,
            page: options.page,
            size: options.page_size,
            refresh: options.refresh,
        };
        self.checked_find(&request)
    }

    /// Remove every document matching `query`.
    pub fn delete(&self, query: &QueryNode) -> Result<Value, StoreError> {
        let request = DeleteRequest {
            index: &self.index,
            query,
        };
        let response = self.engine.delete(&request)?;
        wire::ensure_accepted(response)
    }

    /// Engine statistics, as reported.
    pub fn stat(&self) -> Result<Value, StoreError> {
        wire::ensure_accepted(self.engine.stat()?)
    }

    fn checked_find(&self, request: &FindRequest<'_>) -> Result<FindResponse, StoreError> {
        let response = self.engine.find(request)?;
        if let Some(err) = response.exception.as_ref().and_then(wire::rejection) {
            return Err(err);
        }
        Ok(response)
    }
}
