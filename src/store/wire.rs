// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON wire format spoken with the search engine.
//!
//! Field names and key spellings (`minimum-should-match`, `force-merge`,
//! `line-offset`) are what the engine expects and must not change.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::errors::StoreError;

pub const FIELD_ID: &str = "id";
pub const FIELD_CONTENT: &str = "content_no_norms";
pub const FIELD_FILENAME: &str = "filename_no_norms_no_store";
pub const FIELD_HASH: &str = "hash";
pub const FIELD_STAMP: &str = "stamp_long";

/// Trace lines kept from an engine exception.
pub const MAX_TRACE_LINES: usize = 10;

/// A query tree node, serialized as `{"<kind>": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryNode {
    Term(TermQuery),
    Bool(BoolQuery),
    TermPayloadScore(PayloadScoreQuery),
}

impl QueryNode {
    pub fn term(field: &str, value: impl Into<String>) -> Self {
        QueryNode::Term(TermQuery {
            field: field.to_string(),
            value: value.into(),
        })
    }

    pub fn must(clauses: Vec<QueryNode>) -> Self {
        QueryNode::Bool(BoolQuery {
            must: clauses,
            ..BoolQuery::default()
        })
    }

    pub fn should(clauses: Vec<QueryNode>) -> Self {
        QueryNode::Bool(BoolQuery {
            should: clauses,
            ..BoolQuery::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermQuery {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolQuery {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<QueryNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<QueryNode>,
    #[serde(
        rename = "minimum-should-match",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub minimum_should_match: Option<usize>,
}

/// Tokenized match on a payload-carrying field, scored by a named engine
/// function. Only parameters travel over the wire, never code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadScoreQuery {
    pub field: String,
    pub value: String,
    pub tokenize: bool,
    #[serde(rename = "match-all-if-empty")]
    pub match_all_if_empty: bool,
    #[serde(rename = "no-zero")]
    pub no_zero: bool,
    pub scoring: ScoringFunction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "kebab-case")]
pub enum ScoringFunction {
    /// 0 unless every token is present and at least one line holds them all;
    /// otherwise summed term weights plus `all_tokens_match_score` per line.
    AllTokensLineCardinality {
        version: u32,
        all_tokens_match_score: u32,
    },
    /// Flat score with an explanation note.
    ConstantBonus {
        version: u32,
        score: u32,
        note: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAnalyzer {
    #[serde(rename = "type")]
    pub kind: String,
    pub tokenizer: String,
    #[serde(rename = "line-offset", default, skip_serializing_if = "Option::is_none")]
    pub line_offset: Option<u32>,
}

/// Per-field analyzer sent with every read and write.
pub fn analyzer() -> BTreeMap<String, FieldAnalyzer> {
    let mut fields = BTreeMap::new();
    fields.insert(
        FIELD_CONTENT.to_string(),
        FieldAnalyzer {
            kind: "custom".to_string(),
            tokenizer: "code".to_string(),
            line_offset: None,
        },
    );
    fields.insert(
        FIELD_FILENAME.to_string(),
        FieldAnalyzer {
            kind: "custom".to_string(),
            tokenizer: "code".to_string(),
            line_offset: Some(100_000),
        },
    );
    fields
}

#[derive(Debug, Clone, Serialize)]
pub struct FindRequest<'a> {
    pub index: &'a str,
    pub query: &'a QueryNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, bool>>,
    pub analyzer: BTreeMap<String, FieldAnalyzer>,
    pub explain: bool,
    pub page: usize,
    pub size: usize,
    pub refresh: bool,
}

/// One document as stored by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDocument {
    pub id: String,
    #[serde(rename = "filename_no_norms_no_store")]
    pub filename: String,
    #[serde(rename = "content_no_norms")]
    pub content: String,
    pub hash: String,
    #[serde(rename = "stamp_long")]
    pub stamp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteRequest<'a> {
    pub index: &'a str,
    pub documents: &'a [WireDocument],
    pub analyzer: BTreeMap<String, FieldAnalyzer>,
    #[serde(rename = "force-merge")]
    pub force_merge: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteRequest<'a> {
    pub index: &'a str,
    pub query: &'a QueryNode,
}

/// Response to a read query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindResponse {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub took: i64,
    #[serde(default)]
    pub hits: Vec<Hit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<Value>,
}

/// One search hit: engine metadata plus whatever stored fields were returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    #[serde(rename = "_score", default)]
    pub score: f64,
    #[serde(rename = "_explain", default, skip_serializing_if = "Option::is_none")]
    pub explain: Option<Value>,
    #[serde(
        rename = "_result_state",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub result_state: Option<Value>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Hit {
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.field_str(FIELD_ID)
    }

    /// Stored stamp (unix seconds). Engines may return it as a number or a string.
    pub fn stamp(&self) -> Option<i64> {
        match self.fields.get(FIELD_STAMP)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Result state flattened into the set of matched line indexes.
    pub fn matched_lines(&self) -> BTreeSet<usize> {
        let mut lines = BTreeSet::new();
        if let Some(state) = &self.result_state {
            collect_line_indexes(state, &mut lines);
        }
        lines
    }

    /// Number of line entries in the result state, duplicates included.
    pub fn result_state_len(&self) -> usize {
        fn count(value: &Value) -> usize {
            match value {
                Value::Array(items) => items.iter().map(count).sum(),
                Value::Number(_) => 1,
                _ => 0,
            }
        }
        self.result_state.as_ref().map(count).unwrap_or(0)
    }

    pub fn explanation_text(&self) -> Option<String> {
        match self.explain.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => serde_json::to_string_pretty(other).ok(),
        }
    }
}

fn collect_line_indexes(value: &Value, out: &mut BTreeSet<usize>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_line_indexes(item, out)),
        Value::Number(n) => {
            if let Some(line) = n.as_u64() {
                out.insert(line as usize);
            }
        }
        _ => {}
    }
}

/// Turn an `exception` payload into a rejection error, if present.
///
/// The engine reports either a bare message string, a list whose head is the
/// message, or an object with `message` and `trace`/`stack` entries.
pub fn rejection(exception: &Value) -> Option<StoreError> {
    let (message, trace) = match exception {
        Value::Null | Value::Bool(false) => return None,
        Value::String(s) => split_message(s),
        Value::Array(items) => {
            let mut lines = items.iter().map(value_line);
            let message = lines.next().unwrap_or_default();
            (message, lines.collect())
        }
        Value::Object(map) => {
            let message = map
                .get("message")
                .map(value_line)
                .unwrap_or_else(|| exception.to_string());
            let trace = map
                .get("trace")
                .or_else(|| map.get("stack"))
                .map(|value| match value {
                    Value::Array(items) => items.iter().map(value_line).collect(),
                    Value::String(s) => s.lines().map(str::to_string).collect(),
                    other => vec![other.to_string()],
                })
                .unwrap_or_default();
            (message, trace)
        }
        other => (other.to_string(), Vec::new()),
    };
    Some(StoreError::Rejected {
        message,
        trace: trace.into_iter().take(MAX_TRACE_LINES).collect(),
    })
}

/// Check a write/delete/stat response for an engine exception.
pub fn ensure_accepted(body: Value) -> Result<Value, StoreError> {
    let rejected = body.get("exception").and_then(rejection);
    match rejected {
        Some(err) => Err(err),
        None => Ok(body),
    }
}

fn split_message(text: &str) -> (String, Vec<String>) {
    let mut lines = text.lines().map(str::to_string);
    let message = lines.next().unwrap_or_default();
    (message, lines.collect())
}

fn value_line(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
