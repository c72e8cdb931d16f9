//! In-memory store backend.
//!
//! Collections are plain vectors of documents behind a shared
//! `tokio::sync::RwLock`. Reads take a snapshot under the read lock, so an
//! analytic operation observes one consistent state and concurrent requests
//! need no further coordination.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_stream::stream;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{value_cmp, Document};
use crate::filter::Filter;
use crate::store::{DocumentStore, GroupCount, Projection, StoreError};

/// In-memory document store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map_or(0, Vec::len)
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

/// Join-key rendering: joins match on string or numeric field values;
/// documents without a usable key are excluded (inner join semantics).
fn join_key(doc: &Document, field: &str) -> Option<String> {
    match doc.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections.entry(collection.to_string()).or_default().push(document);
        Ok(())
    }

    async fn scan(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        filter.validate()?;
        let collections = self.collections.read().await;
        let docs = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();
        Ok(docs)
    }

    async fn group_count(
        &self,
        collection: &str,
        filter: &Filter,
        group_keys: &[String],
        sort_keys: &[String],
    ) -> Result<Vec<GroupCount>, StoreError> {
        filter.validate()?;
        let collections = self.collections.read().await;
        let empty = Vec::new();
        let docs = collections.get(collection).unwrap_or(&empty);

        // Group on a canonical rendering of the key values so `4` and `4.0`
        // land in the same group; sort on the values themselves.
        let mut groups: HashMap<String, (Vec<Value>, u64)> = HashMap::new();
        for doc in docs.iter().filter(|d| filter.matches(d)) {
            let key: Vec<Value> = group_keys
                .iter()
                .map(|k| doc.get(k).cloned().unwrap_or(Value::Null))
                .collect();
            let rendered = key
                .iter()
                .map(|v| match v {
                    Value::Number(n) => format!("n:{}", n.as_f64().unwrap_or(0.0)),
                    other => format!("v:{other}"),
                })
                .collect::<Vec<_>>()
                .join("\u{1f}");
            let entry = groups.entry(rendered).or_insert((key, 0));
            entry.1 += 1;
        }

        let mut results: Vec<GroupCount> = groups
            .into_values()
            .map(|(key, count)| GroupCount {
                key: group_keys.iter().cloned().zip(key).collect::<Document>(),
                count,
            })
            .collect();

        results.sort_by(|a, b| {
            sort_keys
                .iter()
                .map(|k| {
                    let x = a.key.get(k).unwrap_or(&Value::Null);
                    let y = b.key.get(k).unwrap_or(&Value::Null);
                    value_cmp(x, y)
                })
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        debug!(collection, groups = results.len(), "group count evaluated");
        Ok(results)
    }

    async fn join_one_to_many(
        &self,
        left: &str,
        left_filter: &Filter,
        right: &str,
        join_field: &str,
        right_filter: &Filter,
        projection: &Projection,
        limit: Option<usize>,
    ) -> Result<BoxStream<'static, Document>, StoreError> {
        left_filter.validate()?;
        right_filter.validate()?;

        // Snapshot both sides under one read lock so the join sees a single
        // consistent state, then iterate outside the lock.
        let (lefts, right_index) = {
            let collections = self.collections.read().await;
            let empty = Vec::new();

            let lefts: Vec<Document> = collections
                .get(left)
                .unwrap_or(&empty)
                .iter()
                .filter(|d| left_filter.matches(d))
                .cloned()
                .collect();

            let mut right_index: HashMap<String, Vec<Document>> = HashMap::new();
            for doc in collections.get(right).unwrap_or(&empty) {
                if !right_filter.matches(doc) {
                    continue;
                }
                if let Some(key) = join_key(doc, join_field) {
                    right_index.entry(key).or_default().push(doc.clone());
                }
            }
            (lefts, right_index)
        };

        let join_field = join_field.to_string();
        let projection = projection.clone();

        let rows = stream! {
            let mut emitted = 0usize;
            for left_doc in lefts {
                let Some(key) = join_key(&left_doc, &join_field) else {
                    continue;
                };
                let Some(matches) = right_index.get(&key) else {
                    continue;
                };
                for right_doc in matches {
                    if limit.is_some_and(|cap| emitted >= cap) {
                        debug!(cap = limit, "join row cap reached");
                        return;
                    }
                    emitted += 1;
                    yield projection.apply(&left_doc, right_doc);
                }
            }
        };

        Ok(Box::pin(rows))
    }
}
