//! Bulk line-oriented loader.
//!
//! Reads a file of one JSON object per line and inserts each into a named
//! collection. Lines are independent: there is no batch transaction, so a
//! failure partway through leaves prior lines committed. Malformed lines
//! are skipped with a warning and counted in the report.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use crate::store::{DocumentStore, StoreError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of one bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Imports a JSON-lines file into `collection`. Blank lines are ignored;
/// lines that do not parse as a JSON object are skipped and counted.
pub async fn import_json_lines(
    store: &dyn DocumentStore,
    path: &Path,
    collection: &str,
) -> Result<LoadReport, LoadError> {
    let file = File::open(path).await.map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut lines = LinesStream::new(BufReader::new(file).lines());

    let mut report = LoadReport::default();
    let mut line_no = 0usize;
    while let Some(line) = lines.next().await {
        let line = line.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(doc)) => {
                store.insert(collection, doc).await?;
                report.inserted += 1;
            }
            Ok(_) => {
                warn!(line = line_no, collection, "skipping non-object line");
                report.skipped += 1;
            }
            Err(e) => {
                warn!(line = line_no, collection, error = %e, "skipping malformed line");
                report.skipped += 1;
            }
        }
    }

    info!(
        collection,
        inserted = report.inserted,
        skipped = report.skipped,
        "bulk load finished"
    );
    Ok(report)
}
