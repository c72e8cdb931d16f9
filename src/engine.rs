//! The three fixed analytic pipelines.
//!
//! Each pipeline is declared in terms of the [`DocumentStore`] primitives
//! and evaluated by the adapter; the engine holds no document data of its
//! own. The adapter instance is constructed once at startup and passed in
//! explicitly rather than referenced as ambient global state.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::config::StoreSettings;
use crate::document::{f64_field, str_field, Document};
use crate::filter::{Filter, Predicate};
use crate::store::{DocumentStore, Projection, StoreError};

/// Category keywords matched as case-sensitive substrings of the free-text
/// `categories` blob. Membership is a contains test, not an equality test,
/// because the source data is not a normalized set.
pub const CATEGORY_KEYWORDS: [&str; 2] = ["Fast Food", "Restaurants"];

/// The high-rating extract stops after this many rows. It bounds a
/// potentially large join; the rows are the first encountered in adapter
/// iteration order, not the top of any ranking. The low-rating extract is
/// deliberately uncapped.
pub const HIGH_RATING_ROW_CAP: usize = 1000;

/// One group of the business count: businesses in `city` with this exact
/// star rating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityStarsCount {
    pub city: String,
    pub stars: f64,
    pub count: u64,
}

impl Display for CityStarsCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "City: {}, Stars: {}, Count: {}", self.city, self.stars, self.count)
    }
}

/// One projected row of a review extract. `review_text` is always present:
/// the source text, or the empty string when the review carried none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRow {
    pub review_id: String,
    pub business_id: String,
    pub stars: f64,
    pub review_text: String,
}

impl ReviewRow {
    fn from_document(doc: &Document) -> Self {
        Self {
            review_id: str_field(doc, "review_id").to_string(),
            business_id: str_field(doc, "business_id").to_string(),
            stars: f64_field(doc, "stars"),
            review_text: str_field(doc, "review_text").to_string(),
        }
    }
}

/// Evaluates the three analytic operations against a document store.
pub struct AggregationEngine {
    store: Arc<dyn DocumentStore>,
    business_collection: String,
    review_collection: String,
}

impl AggregationEngine {
    pub fn new(store: Arc<dyn DocumentStore>, settings: &StoreSettings) -> Self {
        Self {
            store,
            business_collection: settings.business_collection.clone(),
            review_collection: settings.review_collection.clone(),
        }
    }

    fn category_filter() -> Filter {
        Filter::new().and(Predicate::contains_any("categories", &CATEGORY_KEYWORDS))
    }

    fn review_projection() -> Projection {
        Projection::new()
            .right("review_id")
            .right("business_id")
            .right("stars")
            .right_or("review_text", "text", json!(""))
    }

    /// Counts businesses matching the category pattern, grouped by
    /// `(city, stars)`, sorted ascending by city then stars.
    pub async fn count_business_by_city_and_stars(
        &self,
    ) -> Result<Vec<CityStarsCount>, StoreError> {
        let keys = vec!["city".to_string(), "stars".to_string()];
        let groups = self
            .store
            .group_count(&self.business_collection, &Self::category_filter(), &keys, &keys)
            .await?;

        let counts = groups
            .into_iter()
            .map(|g| CityStarsCount {
                city: str_field(&g.key, "city").to_string(),
                stars: f64_field(&g.key, "stars"),
                count: g.count,
            })
            .collect::<Vec<_>>();
        info!(groups = counts.len(), "business count by city and stars evaluated");
        Ok(counts)
    }

    /// Reviews rated >= 4 of well-reviewed businesses rated >= 4, capped at
    /// [`HIGH_RATING_ROW_CAP`] rows.
    pub async fn high_rating_reviews(
        &self,
    ) -> Result<BoxStream<'static, ReviewRow>, StoreError> {
        let business_filter = Self::category_filter()
            .and(Predicate::gt("review_count", 10.0))
            .and(Predicate::gte("stars", 4.0));
        let review_filter = Filter::new().and(Predicate::gte("stars", 4.0));
        self.review_extract(business_filter, review_filter, Some(HIGH_RATING_ROW_CAP))
            .await
    }

    /// Reviews rated < 2 of well-reviewed businesses rated < 2. Uncapped:
    /// the smaller negative-result set is returned in full.
    pub async fn low_rating_reviews(
        &self,
    ) -> Result<BoxStream<'static, ReviewRow>, StoreError> {
        let business_filter = Self::category_filter()
            .and(Predicate::gt("review_count", 10.0))
            .and(Predicate::lt("stars", 2.0));
        let review_filter = Filter::new().and(Predicate::lt("stars", 2.0));
        self.review_extract(business_filter, review_filter, None).await
    }

    async fn review_extract(
        &self,
        business_filter: Filter,
        review_filter: Filter,
        limit: Option<usize>,
    ) -> Result<BoxStream<'static, ReviewRow>, StoreError> {
        let rows = self
            .store
            .join_one_to_many(
                &self.business_collection,
                &business_filter,
                &self.review_collection,
                "business_id",
                &review_filter,
                &Self::review_projection(),
                limit,
            )
            .await?;
        Ok(rows.map(|doc| ReviewRow::from_document(&doc)).boxed())
    }
}
