//! Transport-agnostic request/response surface.
//!
//! One method per analytic operation, shaped the way the routing layer
//! consumes them: the count as rendered text lines, the high-rating extract
//! as an incrementally framed JSON array (teed to its CSV side-file as rows
//! are produced), and the low-rating extract as a confirmation message
//! after its full, uncapped result is written to CSV.

use std::path::PathBuf;
use std::sync::Arc;

use async_stream::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Settings;
use crate::engine::AggregationEngine;
use crate::export::{self, CsvWriter};
use crate::store::{DocumentStore, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to write extract to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct AnalyticsService {
    engine: AggregationEngine,
    high_rating_csv: PathBuf,
    low_rating_csv: PathBuf,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn DocumentStore>, settings: &Settings) -> Self {
        Self {
            engine: AggregationEngine::new(store, &settings.store),
            high_rating_csv: settings.export.high_rating_csv.clone(),
            low_rating_csv: settings.export.low_rating_csv.clone(),
        }
    }

    /// Count of category-matching businesses per (city, stars), rendered
    /// one line per group.
    pub async fn count_business_by_city_and_stars(&self) -> Result<Vec<String>, ServiceError> {
        let counts = self.engine.count_business_by_city_and_stars().await?;
        Ok(counts.iter().map(ToString::to_string).collect())
    }

    /// The high-rating extract as JSON array chunks, produced one row at a
    /// time. Rows are appended to the CSV side-file as they stream; a
    /// consumer that disconnects abandons both the iteration and the
    /// remainder of the file.
    pub async fn high_rating_reviews(&self) -> Result<BoxStream<'static, String>, ServiceError> {
        let rows = self.engine.high_rating_reviews().await?;
        let path = self.high_rating_csv.clone();

        let teed = stream! {
            let mut csv = match CsvWriter::create(&path) {
                Ok(writer) => Some(writer),
                Err(e) => {
                    // The streamed response is the primary output; a failed
                    // side-file downgrades to a warning.
                    warn!(path = %path.display(), error = %e, "cannot open extract side-file");
                    None
                }
            };
            let mut rows = rows;
            while let Some(row) = rows.next().await {
                if let Some(writer) = csv.as_mut() {
                    if let Err(e) = writer.write_row(&row) {
                        warn!(path = %path.display(), error = %e, "stopping side-file writes");
                        csv = None;
                    }
                }
                yield row;
            }
            if let Some(writer) = csv {
                if let Err(e) = writer.finish() {
                    warn!(path = %path.display(), error = %e, "failed to flush side-file");
                }
            }
        };

        Ok(export::stream_json_array(Box::pin(teed)))
    }

    /// Writes the full low-rating extract to its CSV side-file and returns
    /// a confirmation message.
    pub async fn low_rating_reviews(&self) -> Result<String, ServiceError> {
        let rows = export::materialize(self.engine.low_rating_reviews().await?).await;
        let written = export::write_csv(&self.low_rating_csv, &rows).map_err(|source| {
            ServiceError::Export {
                path: self.low_rating_csv.clone(),
                source,
            }
        })?;
        info!(path = %self.low_rating_csv.display(), rows = written, "low-rating extract saved");
        Ok(format!(
            "{} low-rating reviews saved to '{}'",
            written,
            self.low_rating_csv.display()
        ))
    }
}
