//! Field predicate combinators.
//!
//! A [`Filter`] is a conjunction of per-field predicates. The category
//! "contains one of several keywords" test is an explicit combinator
//! ([`Predicate::ContainsAny`], a logical OR of case-sensitive substring
//! tests) rather than a raw pattern string, so it can be validated and
//! tested on its own.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::{f64_field, str_field, Document};
use serde_json::Value;

/// A malformed predicate, reported before any document is scanned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidFilter {
    #[error("predicate references an empty field name")]
    EmptyField,
    #[error("substring predicate on '{0}' has no keywords")]
    EmptyKeywordSet(String),
}

/// A single field predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Predicate {
    /// Field value equals the given value. Numbers compare by magnitude,
    /// so `4` matches `4.0`.
    Eq { field: String, value: Value },
    /// Numeric field strictly greater than the threshold.
    Gt { field: String, threshold: f64 },
    /// Numeric field greater than or equal to the threshold.
    Gte { field: String, threshold: f64 },
    /// Numeric field strictly less than the threshold.
    Lt { field: String, threshold: f64 },
    /// String field contains at least one of the keywords (case-sensitive).
    ContainsAny { field: String, keywords: Vec<String> },
}

impl Predicate {
    pub fn eq(field: &str, value: Value) -> Self {
        Self::Eq { field: field.to_string(), value }
    }

    pub fn gt(field: &str, threshold: f64) -> Self {
        Self::Gt { field: field.to_string(), threshold }
    }

    pub fn gte(field: &str, threshold: f64) -> Self {
        Self::Gte { field: field.to_string(), threshold }
    }

    pub fn lt(field: &str, threshold: f64) -> Self {
        Self::Lt { field: field.to_string(), threshold }
    }

    pub fn contains_any(field: &str, keywords: &[&str]) -> Self {
        Self::ContainsAny {
            field: field.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn field(&self) -> &str {
        match self {
            Self::Eq { field, .. }
            | Self::Gt { field, .. }
            | Self::Gte { field, .. }
            | Self::Lt { field, .. }
            | Self::ContainsAny { field, .. } => field,
        }
    }

    fn validate(&self) -> Result<(), InvalidFilter> {
        if self.field().is_empty() {
            return Err(InvalidFilter::EmptyField);
        }
        if let Self::ContainsAny { field, keywords } = self {
            if keywords.is_empty() || keywords.iter().any(String::is_empty) {
                return Err(InvalidFilter::EmptyKeywordSet(field.clone()));
            }
        }
        Ok(())
    }

    fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::Eq { field, value } => match (doc.get(field), value) {
                (Some(Value::Number(a)), Value::Number(b)) => {
                    a.as_f64().unwrap_or(0.0) == b.as_f64().unwrap_or(0.0)
                }
                (Some(actual), expected) => actual == expected,
                (None, _) => false,
            },
            Self::Gt { field, threshold } => {
                doc.get(field).is_some() && f64_field(doc, field) > *threshold
            }
            Self::Gte { field, threshold } => {
                doc.get(field).is_some() && f64_field(doc, field) >= *threshold
            }
            Self::Lt { field, threshold } => {
                doc.get(field).is_some() && f64_field(doc, field) < *threshold
            }
            Self::ContainsAny { field, keywords } => {
                let text = str_field(doc, field);
                keywords.iter().any(|k| text.contains(k.as_str()))
            }
        }
    }
}

/// A conjunction of field predicates. The empty filter matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a predicate to the conjunction.
    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Checks every predicate is well formed. Stores call this before
    /// scanning so a malformed filter never touches a document.
    pub fn validate(&self) -> Result<(), InvalidFilter> {
        self.predicates.iter().try_for_each(Predicate::validate)
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.predicates.iter().all(|p| p.matches(doc))
    }
}
