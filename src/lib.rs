//! Reviewstream: read-mostly analytics over businesses and their reviews.
//!
//! The crate joins two loosely structured document collections — businesses
//! and reviews — through a small adapter trait and evaluates three fixed
//! analytic pipelines: a grouped business count, a capped high-rating
//! review extract, and an uncapped low-rating extract. Extracts stream
//! incrementally as framed JSON arrays and are mirrored to CSV side-files.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use reviewstream::{AnalyticsService, MemoryStore, Settings, import_json_lines};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::default();
//!     let store = Arc::new(MemoryStore::new());
//!
//!     import_json_lines(store.as_ref(), "business.jsonl".as_ref(), "business").await?;
//!     import_json_lines(store.as_ref(), "review.jsonl".as_ref(), "review").await?;
//!
//!     let service = AnalyticsService::new(store, &settings);
//!     for line in service.count_business_by_city_and_stars().await? {
//!         println!("{line}");
//!     }
//!
//!     let mut chunks = service.high_rating_reviews().await?;
//!     while let Some(chunk) = chunks.next().await {
//!         print!("{chunk}");
//!     }
//!
//!     println!("{}", service.low_rating_reviews().await?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod document;
pub mod engine;
pub mod export;
pub mod filter;
pub mod loader;
pub mod service;
pub mod store;
pub mod tests;

pub use config::Settings;
pub use engine::{
    AggregationEngine,
    CityStarsCount,
    ReviewRow,
    CATEGORY_KEYWORDS,
    HIGH_RATING_ROW_CAP,
};
pub use filter::{Filter, Predicate};
pub use loader::{import_json_lines, LoadReport};
pub use service::{AnalyticsService, ServiceError};
pub use store::memory::MemoryStore;
pub use store::{DocumentStore, GroupCount, Projection, StoreError};
