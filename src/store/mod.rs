//! Document store adapter.
//!
//! This module defines the [`DocumentStore`] trait, the read contract the
//! aggregation engine is written against, plus the projection type used to
//! reshape join output. Backends implement the trait; the engine owns no
//! knowledge of how documents are held.
//!
//! The adapter is read-mostly: `insert` exists only for the bulk loader,
//! and none of the read primitives mutate a collection.

pub mod memory;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::document::Document;
use crate::filter::{Filter, InvalidFilter};

/// Failures surfaced by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store cannot be reached. The in-flight operation aborts;
    /// nothing is retried.
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    /// A filter failed validation before any document was scanned.
    #[error(transparent)]
    InvalidFilter(#[from] InvalidFilter),
}

/// One group produced by [`DocumentStore::group_count`]: the distinct
/// combination of group-key values and the number of documents sharing it.
#[derive(Debug, Clone, Serialize)]
pub struct GroupCount {
    /// Group-key field name to value.
    pub key: Document,
    pub count: u64,
}

/// Which side of a join a projected field reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSide {
    Left,
    Right,
}

/// One output field of a join projection.
#[derive(Debug, Clone)]
pub struct ProjectedField {
    /// Field name in the emitted document.
    pub output: String,
    pub side: JoinSide,
    /// Field name read from the source document.
    pub source: String,
    /// Substituted when the source field is absent or null.
    pub default: Option<Value>,
}

/// Shapes each surviving (left, right) pair of a join into one output
/// document. Default substitution happens here, at projection time, rather
/// than relying on implicit absence handling downstream.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    pub fields: Vec<ProjectedField>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Projects a right-side field under its own name.
    pub fn right(self, field: &str) -> Self {
        self.push(field, JoinSide::Right, field, None)
    }

    /// Projects a right-side field under a new name, substituting a default
    /// when the source is absent or null.
    pub fn right_or(self, output: &str, source: &str, default: Value) -> Self {
        self.push(output, JoinSide::Right, source, Some(default))
    }

    /// Projects a left-side field under its own name.
    pub fn left(self, field: &str) -> Self {
        self.push(field, JoinSide::Left, field, None)
    }

    fn push(mut self, output: &str, side: JoinSide, source: &str, default: Option<Value>) -> Self {
        self.fields.push(ProjectedField {
            output: output.to_string(),
            side,
            source: source.to_string(),
            default,
        });
        self
    }

    /// Builds the output document for one joined pair.
    pub fn apply(&self, left: &Document, right: &Document) -> Document {
        let mut out = Document::new();
        for field in &self.fields {
            let source = match field.side {
                JoinSide::Left => left,
                JoinSide::Right => right,
            };
            let value = match source.get(&field.source) {
                Some(Value::Null) | None => field.default.clone().unwrap_or(Value::Null),
                Some(v) => v.clone(),
            };
            out.insert(field.output.clone(), value);
        }
        out
    }
}

/// Read contract over named document collections.
///
/// All operations take the filter as a conjunction of field predicates and
/// report [`StoreError::InvalidFilter`] before scanning when a predicate is
/// malformed. Read primitives have no side effects.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Inserts one document into a collection. Consumed by the bulk loader
    /// only; the analytic operations never write.
    async fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError>;

    /// Returns the documents of `collection` matching `filter`.
    async fn scan(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    /// Counts matching documents per distinct combination of `group_keys`
    /// values, sorted ascending by `sort_keys` (lexicographic for strings,
    /// by magnitude for numbers).
    async fn group_count(
        &self,
        collection: &str,
        filter: &Filter,
        group_keys: &[String],
        sort_keys: &[String],
    ) -> Result<Vec<GroupCount>, StoreError>;

    /// Inner one-to-many join: for every left document passing
    /// `left_filter`, emits one projected document per right document whose
    /// `join_field` equals the left document's and which passes
    /// `right_filter`. A left document with zero surviving matches
    /// contributes nothing. `limit` caps total emitted rows; `None` emits
    /// every surviving pair.
    ///
    /// The returned stream is lazy: dropping it abandons remaining
    /// iteration without error.
    async fn join_one_to_many(
        &self,
        left: &str,
        left_filter: &Filter,
        right: &str,
        join_field: &str,
        right_filter: &Filter,
        projection: &Projection,
        limit: Option<usize>,
    ) -> Result<BoxStream<'static, Document>, StoreError>;
}
