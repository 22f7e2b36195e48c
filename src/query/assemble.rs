// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw search string to scored boolean query.
//!
//! `@word` directives become exact filename filters; the rest of the string
//! is matched token-wise against content, with a flat bonus when the same
//! tokens appear in the file path.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::store::wire::{
    BoolQuery, PayloadScoreQuery, QueryNode, ScoringFunction, FIELD_CONTENT, FIELD_FILENAME,
    FIELD_ID,
};

pub const ALL_TOKENS_MATCH_SCORE: u32 = 10;
pub const FILEPATH_MATCH_SCORE: u32 = 2000;
pub const SCORING_VERSION: u32 = 1;
pub const PATH_BONUS_NOTE: &str = "token matching in file path";

/// `@` not preceded by a word character, followed by a word.
static FILE_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\B@\w+").expect("file directive pattern compiles"));

/// One clause of a [`SearchQuery`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Clause {
    /// Exact term on a field.
    ExactTerm { field: String, value: String },
    /// Tokenized match scored by the line-cardinality function.
    TokenMatch {
        field: String,
        value: String,
        scoring: ScoringFunction,
        match_all_if_empty: bool,
        no_zero_score: bool,
    },
    /// Flat bonus when the tokens match the field.
    PathBonus {
        field: String,
        value: String,
        bonus: u32,
        note: String,
        no_zero_score: bool,
    },
}

impl Clause {
    pub fn field(&self) -> &str {
        match self {
            Clause::ExactTerm { field, .. }
            | Clause::TokenMatch { field, .. }
            | Clause::PathBonus { field, .. } => field,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Clause::ExactTerm { value, .. }
            | Clause::TokenMatch { value, .. }
            | Clause::PathBonus { value, .. } => value,
        }
    }

    pub fn to_wire(&self) -> QueryNode {
        match self {
            Clause::ExactTerm { field, value } => QueryNode::term(field, value.as_str()),
            Clause::TokenMatch {
                field,
                value,
                scoring,
                match_all_if_empty,
                no_zero_score,
            } => QueryNode::TermPayloadScore(PayloadScoreQuery {
                field: field.clone(),
                value: value.clone(),
                tokenize: true,
                match_all_if_empty: *match_all_if_empty,
                no_zero: *no_zero_score,
                scoring: scoring.clone(),
            }),
            Clause::PathBonus {
                field,
                value,
                bonus,
                note,
                no_zero_score,
            } => QueryNode::TermPayloadScore(PayloadScoreQuery {
                field: field.clone(),
                value: value.clone(),
                tokenize: true,
                match_all_if_empty: false,
                no_zero: *no_zero_score,
                scoring: ScoringFunction::ConstantBonus {
                    version: SCORING_VERSION,
                    score: *bonus,
                    note: note.clone(),
                },
            }),
        }
    }
}

/// Assembled query. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    must: Vec<Clause>,
    should: Vec<Clause>,
    minimum_should_match: usize,
}

impl SearchQuery {
    pub fn must(&self) -> &[Clause] {
        &self.must
    }

    pub fn should(&self) -> &[Clause] {
        &self.should
    }

    pub fn minimum_should_match(&self) -> usize {
        self.minimum_should_match
    }

    /// Residual free text the content clause was built from.
    pub fn residual(&self) -> &str {
        self.must
            .iter()
            .find(|clause| matches!(clause, Clause::TokenMatch { .. }))
            .map(Clause::value)
            .unwrap_or("")
    }

    pub fn to_wire(&self) -> QueryNode {
        QueryNode::Bool(BoolQuery {
            must: self.must.iter().map(Clause::to_wire).collect(),
            should: self.should.iter().map(Clause::to_wire).collect(),
            minimum_should_match: Some(self.minimum_should_match),
        })
    }
}

/// Filename directives in order of appearance, without the `@`.
pub fn file_directives(raw: &str) -> Vec<String> {
    FILE_DIRECTIVE
        .find_iter(raw)
        .map(|m| m.as_str().trim_start_matches('@').to_string())
        .collect()
}

/// Input with directives removed and whitespace collapsed.
pub fn residual(raw: &str) -> String {
    FILE_DIRECTIVE
        .replace_all(raw, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the query for a raw search string.
pub fn assemble(raw: &str) -> SearchQuery {
    assemble_with_id(raw, None)
}

/// Build the query, optionally pinned to one document id (listed first).
pub fn assemble_with_id(raw: &str, id: Option<&str>) -> SearchQuery {
    let mut must = Vec::new();

    if let Some(id) = id.map(str::trim).filter(|id| !id.is_empty()) {
        must.push(Clause::ExactTerm {
            field: FIELD_ID.to_string(),
            value: id.to_string(),
        });
    }

    must.extend(file_directives(raw).into_iter().map(|word| Clause::ExactTerm {
        field: FIELD_FILENAME.to_string(),
        value: word,
    }));

    let text = residual(raw);
    must.push(Clause::TokenMatch {
        field: FIELD_CONTENT.to_string(),
        value: text.clone(),
        scoring: ScoringFunction::AllTokensLineCardinality {
            version: SCORING_VERSION,
            all_tokens_match_score: ALL_TOKENS_MATCH_SCORE,
        },
        match_all_if_empty: false,
        no_zero_score: true,
    });

    let should = vec![Clause::PathBonus {
        field: FIELD_FILENAME.to_string(),
        value: text,
        bonus: FILEPATH_MATCH_SCORE,
        note: PATH_BONUS_NOTE.to_string(),
        no_zero_score: false,
    }];

    SearchQuery {
        must,
        should,
        minimum_should_match: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn directives_become_filename_filters() {
        let query = assemble("@glibc @malloc realloc");
        let must = query.must();
        assert_eq!(must.len(), 3);
        assert_eq!(
            must[0],
            Clause::ExactTerm {
                field: FIELD_FILENAME.to_string(),
                value: "glibc".to_string()
            }
        );
        assert_eq!(must[1].value(), "malloc");
        assert!(matches!(must[2], Clause::TokenMatch { .. }));
        assert_eq!(must[2].field(), FIELD_CONTENT);
        assert_eq!(query.residual(), "realloc");
        assert_eq!(query.should().len(), 1);
        assert_eq!(query.should()[0].value(), "realloc");
        assert_eq!(query.minimum_should_match(), 0);
    }

    #[test]
    fn embedded_at_is_not_a_directive() {
        assert!(file_directives("user@example").is_empty());
        assert_eq!(residual("user@example  foo"), "user@example foo");
        assert_eq!(file_directives("(@sds) x"), vec!["sds"]);
    }

    #[test]
    fn empty_residual_keeps_filters_and_matches_nothing() {
        let query = assemble("  @malloc  ");
        assert_eq!(query.must().len(), 2);
        assert_eq!(query.residual(), "");
        match &query.must()[1] {
            Clause::TokenMatch {
                value,
                match_all_if_empty,
                no_zero_score,
                ..
            } => {
                assert!(value.is_empty());
                assert!(!match_all_if_empty);
                assert!(no_zero_score);
            }
            other => panic!("unexpected clause {other:?}"),
        }
    }

    #[test]
    fn id_filter_comes_first() {
        let query = assemble_with_id("@sds sdsnew", Some("/sds/sds.c"));
        assert_eq!(query.must()[0].field(), FIELD_ID);
        assert_eq!(query.must()[0].value(), "/sds/sds.c");
        assert_eq!(query.must()[1].value(), "sds");
        assert_eq!(assemble_with_id("x", Some("  ")).must().len(), 1);
    }

    #[test]
    fn wire_form_carries_parameters_only() {
        let wire = serde_json::to_value(assemble("@sds (fn [] 1)").to_wire()).expect("serialize");
        let bool_query = &wire["bool"];
        assert_eq!(bool_query["minimum-should-match"], 0);
        assert_eq!(
            bool_query["must"][0],
            json!({"term": {"field": FIELD_FILENAME, "value": "sds"}})
        );
        let content = &bool_query["must"][1]["term-payload-score"];
        assert_eq!(content["value"], "(fn [] 1)");
        assert_eq!(
            content["scoring"],
            json!({
                "function": "all-tokens-line-cardinality",
                "version": 1,
                "all_tokens_match_score": 10
            })
        );
        let bonus = &bool_query["should"][0]["term-payload-score"];
        assert_eq!(bonus["no-zero"], false);
        assert_eq!(bonus["scoring"]["score"], 2000);
        assert_eq!(bonus["scoring"]["note"], PATH_BONUS_NOTE);
    }
}
