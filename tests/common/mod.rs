// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory engine used by the integration tests.
//!
//! Interprets the wire query tree with a simple code tokenizer: identifiers
//! are runs of alphanumerics and `_`, case sensitive, one position per line.

#![allow(dead_code)]

use serde_json::{json, Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use codeseek::errors::StoreError;
use codeseek::store::wire::{
    BoolQuery, DeleteRequest, FindRequest, FindResponse, Hit, PayloadScoreQuery, QueryNode,
    ScoringFunction, TermQuery, WireDocument, WriteRequest, FIELD_CONTENT, FIELD_FILENAME,
    FIELD_HASH, FIELD_ID, FIELD_STAMP,
};
use codeseek::store::Engine;

#[derive(Default)]
pub struct MemoryEngine {
    docs: RefCell<BTreeMap<String, WireDocument>>,
    /// Documents per write call, in call order.
    pub writes: RefCell<Vec<Vec<String>>>,
    pub find_calls: Cell<usize>,
    /// 1-based write call that fails with a transport error.
    pub fail_write: Cell<Option<usize>>,
    pub fail_finds: Cell<bool>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.borrow().len()
    }

    pub fn document(&self, id: &str) -> Option<WireDocument> {
        self.docs.borrow().get(id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        self.docs.borrow().keys().cloned().collect()
    }

    pub fn submitted_ids(&self) -> Vec<String> {
        self.writes.borrow().iter().flatten().cloned().collect()
    }

    fn transport(message: &str) -> StoreError {
        StoreError::Transport {
            host: "memory://engine".to_string(),
            message: message.to_string(),
            source: None,
        }
    }
}

/// Score of a document against a query node, with matched content lines.
struct Scored {
    score: f64,
    lines: BTreeSet<usize>,
}

fn tokens(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .collect()
}

fn field_text<'a>(doc: &'a WireDocument, field: &str) -> &'a str {
    match field {
        FIELD_ID => &doc.id,
        FIELD_HASH => &doc.hash,
        FIELD_FILENAME => &doc.filename,
        FIELD_CONTENT => &doc.content,
        _ => "",
    }
}

fn evaluate(node: &QueryNode, doc: &WireDocument) -> Option<Scored> {
    match node {
        QueryNode::Term(term) => evaluate_term(term, doc),
        QueryNode::Bool(query) => evaluate_bool(query, doc),
        QueryNode::TermPayloadScore(query) => evaluate_payload(query, doc),
    }
}

fn evaluate_term(term: &TermQuery, doc: &WireDocument) -> Option<Scored> {
    let hit = match term.field.as_str() {
        FIELD_ID | FIELD_HASH => field_text(doc, &term.field) == term.value,
        field => tokens(field_text(doc, field)).contains(&term.value.as_str()),
    };
    hit.then(|| Scored {
        score: 1.0,
        lines: BTreeSet::new(),
    })
}

fn evaluate_bool(query: &BoolQuery, doc: &WireDocument) -> Option<Scored> {
    let mut total = Scored {
        score: 0.0,
        lines: BTreeSet::new(),
    };
    for clause in &query.must {
        let scored = evaluate(clause, doc)?;
        total.score += scored.score;
        total.lines.extend(scored.lines);
    }
    let mut should_hits = 0;
    for clause in &query.should {
        if let Some(scored) = evaluate(clause, doc) {
            should_hits += 1;
            total.score += scored.score;
            total.lines.extend(scored.lines);
        }
    }
    let required = query
        .minimum_should_match
        .unwrap_or(if query.must.is_empty() { 1 } else { 0 });
    (should_hits >= required).then_some(total)
}

fn evaluate_payload(query: &PayloadScoreQuery, doc: &WireDocument) -> Option<Scored> {
    let wanted = tokens(&query.value);
    if wanted.is_empty() && !query.match_all_if_empty {
        return None;
    }
    let text = field_text(doc, &query.field);

    let scored = match &query.scoring {
        ScoringFunction::AllTokensLineCardinality {
            all_tokens_match_score,
            ..
        } => {
            let doc_tokens: BTreeSet<&str> = tokens(text).into_iter().collect();
            let mut lines = BTreeSet::new();
            let mut score = 0.0;
            if wanted.iter().all(|token| doc_tokens.contains(token)) {
                for (index, line) in text.lines().enumerate() {
                    let line_tokens = tokens(line);
                    if wanted.iter().all(|token| line_tokens.contains(token)) {
                        lines.insert(index);
                    }
                }
                if !lines.is_empty() {
                    let weights = wanted.len() as f64;
                    score = weights + f64::from(*all_tokens_match_score) * lines.len() as f64;
                }
            }
            Scored { score, lines }
        }
        ScoringFunction::ConstantBonus { score, .. } => {
            let path_tokens = tokens(text);
            let matched = wanted.iter().any(|token| path_tokens.contains(token));
            Scored {
                score: if matched { f64::from(*score) } else { 0.0 },
                lines: BTreeSet::new(),
            }
        }
    };

    if scored.score == 0.0 && query.no_zero {
        return None;
    }
    Some(scored)
}

fn stored_fields(doc: &WireDocument, wanted: Option<&BTreeMap<String, bool>>) -> BTreeMap<String, Value> {
    let mut all = BTreeMap::new();
    all.insert(FIELD_ID.to_string(), json!(doc.id));
    all.insert(FIELD_CONTENT.to_string(), json!(doc.content));
    all.insert(FIELD_HASH.to_string(), json!(doc.hash));
    all.insert(FIELD_STAMP.to_string(), json!(doc.stamp));
    match wanted {
        Some(fields) => all
            .into_iter()
            .filter(|(name, _)| fields.get(name).copied().unwrap_or(false))
            .collect(),
        None => all,
    }
}

impl Engine for MemoryEngine {
    fn find(&self, request: &FindRequest<'_>) -> Result<FindResponse, StoreError> {
        self.find_calls.set(self.find_calls.get() + 1);
        if self.fail_finds.get() {
            return Err(Self::transport("connection refused"));
        }

        let docs = self.docs.borrow();
        let mut matches: Vec<(&WireDocument, Scored)> = docs
            .values()
            .filter_map(|doc| evaluate(request.query, doc).map(|scored| (doc, scored)))
            .collect();
        matches.sort_by(|a, b| {
            b.1.score
                .partial_cmp(&a.1.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.id.cmp(&b.0.id))
        });

        let total = matches.len() as i64;
        let hits = matches
            .into_iter()
            .skip(request.page * request.size)
            .take(request.size)
            .map(|(doc, scored)| Hit {
                score: scored.score,
                explain: request
                    .explain
                    .then(|| json!(format!("{} lines matching all terms", scored.lines.len()))),
                result_state: (request.explain && !scored.lines.is_empty())
                    .then(|| json!([scored.lines.iter().collect::<Vec<_>>()])),
                fields: stored_fields(doc, request.fields.as_ref()),
            })
            .collect();

        Ok(FindResponse {
            total,
            took: 1,
            hits,
            exception: None,
        })
    }

    fn index(&self, request: &WriteRequest<'_>) -> Result<Value, StoreError> {
        let call = self.writes.borrow().len() + 1;
        if self.fail_write.get() == Some(call) {
            return Err(Self::transport("write timed out"));
        }
        let mut docs = self.docs.borrow_mut();
        for doc in request.documents {
            docs.insert(doc.id.clone(), doc.clone());
        }
        self.writes
            .borrow_mut()
            .push(request.documents.iter().map(|doc| doc.id.clone()).collect());
        Ok(json!({ "index": request.index, "documents": request.documents.len() }))
    }

    fn delete(&self, request: &DeleteRequest<'_>) -> Result<Value, StoreError> {
        let mut docs = self.docs.borrow_mut();
        let doomed: Vec<String> = docs
            .values()
            .filter(|doc| evaluate(request.query, doc).is_some())
            .map(|doc| doc.id.clone())
            .collect();
        for id in &doomed {
            docs.remove(id);
        }
        Ok(json!({ "deleted": doomed.len() }))
    }

    fn stat(&self) -> Result<Value, StoreError> {
        let mut stat = Map::new();
        stat.insert("documents".to_string(), json!(self.docs.borrow().len()));
        Ok(Value::Object(stat))
    }
}

/// Write `files` (relative path, content) under `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, content).expect("write file");
    }
}
