//! Result export: materialization, incremental JSON array framing, and the
//! tabular side-file.
//!
//! The streaming path never buffers the full result set. The wrapper tracks
//! whether the first element has been emitted to decide separator emission,
//! so the output is a syntactically valid array even though the total count
//! is unknown up front. It is restartable only by re-running the underlying
//! query; a consumer that disconnects mid-stream simply drops it and the
//! remaining iteration is abandoned.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use async_stream::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Serialize;
use tracing::warn;

use crate::engine::ReviewRow;

/// Fixed column order of the review extract side-files.
pub const CSV_COLUMNS: [&str; 4] = ["review_id", "business_id", "stars", "review_text"];

/// Collects a row stream eagerly into memory.
pub async fn materialize<T>(rows: BoxStream<'static, T>) -> Vec<T> {
    rows.collect().await
}

/// Wraps a row stream into an incrementally produced JSON array.
///
/// Each chunk is a fragment of the final text: the opening bracket, one
/// serialized element (preceded by a comma except for the first), and the
/// closing bracket. Each element is a suspension point, so control returns
/// to the transport between rows. If an element fails to serialize the
/// stream ends without the closing bracket, which consumers must treat as a
/// transport-level failure rather than a valid result.
pub fn stream_json_array<T>(rows: BoxStream<'static, T>) -> BoxStream<'static, String>
where
    T: Serialize + Send + 'static,
{
    let chunks = stream! {
        yield "[".to_string();
        let mut rows = rows;
        let mut first = true;
        while let Some(row) = rows.next().await {
            let json = match serde_json::to_string(&row) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "dropping stream mid-array: row failed to serialize");
                    return;
                }
            };
            if first {
                first = false;
                yield json;
            } else {
                yield format!(",{json}");
            }
        }
        yield "]".to_string();
    };
    Box::pin(chunks)
}

/// Quotes a CSV field when it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Writes review rows to a side-file, header first, all values coerced to
/// their textual representation.
pub struct CsvWriter {
    out: BufWriter<File>,
}

impl CsvWriter {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "{}", CSV_COLUMNS.join(","))?;
        Ok(Self { out })
    }

    pub fn write_row(&mut self, row: &ReviewRow) -> std::io::Result<()> {
        writeln!(
            self.out,
            "{},{},{},{}",
            csv_field(&row.review_id),
            csv_field(&row.business_id),
            row.stars,
            csv_field(&row.review_text),
        )
    }

    pub fn finish(mut self) -> std::io::Result<()> {
        self.out.flush()
    }
}

/// Writes a full result set to `path` and returns the number of rows.
pub fn write_csv(path: &Path, rows: &[ReviewRow]) -> std::io::Result<usize> {
    let mut writer = CsvWriter::create(path)?;
    for row in rows {
        writer.write_row(row)?;
    }
    writer.finish()?;
    Ok(rows.len())
}
