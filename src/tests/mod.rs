#[cfg(test)]
mod tests {
    use crate::config::{ExportSettings, Settings, StoreSettings};
    use crate::document::Document;
    use crate::engine::{AggregationEngine, ReviewRow, HIGH_RATING_ROW_CAP};
    use crate::export;
    use crate::filter::Filter;
    use crate::service::AnalyticsService;
    use crate::store::memory::MemoryStore;
    use crate::store::{DocumentStore, GroupCount, Projection, StoreError};
    use async_trait::async_trait;
    use futures::stream::{self, BoxStream};
    use futures::StreamExt;
    use mockall::*;
    use serde_json::{json, Value};
    use std::path::PathBuf;
    use std::sync::Arc;

    mock! {
        pub Store {}
        #[async_trait]
        impl DocumentStore for Store {
            async fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError>;
            async fn scan(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError>;
            async fn group_count(
                &self,
                collection: &str,
                filter: &Filter,
                group_keys: &[String],
                sort_keys: &[String],
            ) -> Result<Vec<GroupCount>, StoreError>;
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
    }

    fn store_settings() -> StoreSettings {
        StoreSettings {
            business_collection: "business".to_string(),
            review_collection: "review".to_string(),
        }
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn projected_review(id: &str, stars: f64, text: &str) -> Document {
        doc(json!({
            "review_id": id,
            "business_id": "B1",
            "stars": stars,
            "review_text": text
        }))
    }

    #[tokio::test]
    async fn test_high_rating_extract_is_capped() {
        let mut mock_store = MockStore::new();

        mock_store
            .expect_join_one_to_many()
            .times(1)
            .withf(|left, _, right, join_field, _, _, limit| {
                left == "business"
                    && right == "review"
                    && join_field == "business_id"
                    && *limit == Some(HIGH_RATING_ROW_CAP)
            })
            .returning(|_, _, _, _, _, _, _| {
                Ok(stream::iter(vec![projected_review("R1", 5.0, "Great")]).boxed())
            });

        let engine = AggregationEngine::new(Arc::new(mock_store), &store_settings());
        let rows: Vec<ReviewRow> = engine.high_rating_reviews().await.unwrap().collect().await;
        assert_eq!(
            rows,
            vec![ReviewRow {
                review_id: "R1".to_string(),
                business_id: "B1".to_string(),
                stars: 5.0,
                review_text: "Great".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_low_rating_extract_is_uncapped() {
        let mut mock_store = MockStore::new();

        mock_store
            .expect_join_one_to_many()
            .times(1)
            .withf(|_, _, _, _, _, _, limit| limit.is_none())
            .returning(|_, _, _, _, _, _, _| {
                Ok(stream::iter(vec![
                    projected_review("R1", 1.0, "Bad"),
                    projected_review("R2", 1.5, ""),
                ])
                .boxed())
            });

        let engine = AggregationEngine::new(Arc::new(mock_store), &store_settings());
        let rows: Vec<ReviewRow> = engine.low_rating_reviews().await.unwrap().collect().await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].review_text, "");
    }

    #[tokio::test]
    async fn test_store_failure_aborts_count() {
        let mut mock_store = MockStore::new();

        mock_store
            .expect_group_count()
            .times(1)
            .returning(|_, _, _, _| Err(StoreError::Unavailable("connection refused".to_string())));

        let engine = AggregationEngine::new(Arc::new(mock_store), &store_settings());
        let err = engine.count_business_by_city_and_stars().await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_count_renders_grouped_lines() {
        let mut mock_store = MockStore::new();

        mock_store
            .expect_group_count()
            .times(1)
            .withf(|collection, _, group_keys, sort_keys| {
                collection == "business"
                    && group_keys == ["city", "stars"]
                    && sort_keys == ["city", "stars"]
            })
            .returning(|_, _, _, _| {
                Ok(vec![
                    GroupCount {
                        key: doc(json!({"city": "Carson", "stars": 3})),
                        count: 2,
                    },
                    GroupCount {
                        key: doc(json!({"city": "Reno", "stars": 4.5})),
                        count: 1,
                    },
                ])
            });

        let engine = AggregationEngine::new(Arc::new(mock_store), &store_settings());
        let counts = engine.count_business_by_city_and_stars().await.unwrap();
        let lines: Vec<String> = counts.iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "City: Carson, Stars: 3, Count: 2".to_string(),
                "City: Reno, Stars: 4.5, Count: 1".to_string(),
            ]
        );
    }

    async fn seeded_service(dir: &tempfile::TempDir) -> AnalyticsService {
        let store = Arc::new(MemoryStore::new());
        let business = doc(json!({
            "business_id": "B1",
            "city": "Reno",
            "categories": "Restaurants, Bar",
            "stars": 4.5,
            "review_count": 20
        }));
        let reviews = vec![
            doc(json!({"review_id": "R1", "business_id": "B1", "stars": 5, "text": "Great"})),
            doc(json!({"review_id": "R2", "business_id": "B1", "stars": 2})),
        ];
        store.insert("business", business).await.unwrap();
        for review in reviews {
            store.insert("review", review).await.unwrap();
        }

        let settings = Settings {
            store: store_settings(),
            export: ExportSettings {
                high_rating_csv: dir.path().join("high.csv"),
                low_rating_csv: dir.path().join("low.csv"),
            },
        };
        AnalyticsService::new(store, &settings)
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let service = seeded_service(&dir).await;

        let lines = service.count_business_by_city_and_stars().await.unwrap();
        assert_eq!(lines, vec!["City: Reno, Stars: 4.5, Count: 1".to_string()]);

        // R2 is excluded by the review-level filter; R1 survives with its
        // text carried through.
        let framed: String = service
            .high_rating_reviews()
            .await
            .unwrap()
            .collect::<Vec<_>>()
            .await
            .concat();
        let parsed: Vec<ReviewRow> = serde_json::from_str(&framed).unwrap();
        assert_eq!(
            parsed,
            vec![ReviewRow {
                review_id: "R1".to_string(),
                business_id: "B1".to_string(),
                stars: 5.0,
                review_text: "Great".to_string(),
            }]
        );

        // The side-file mirrors the streamed rows.
        let csv = std::fs::read_to_string(dir.path().join("high.csv")).unwrap();
        assert_eq!(csv, "review_id,business_id,stars,review_text\nR1,B1,5,Great\n");

        // B1 rates too high for the low extract, so the file holds only the
        // header and the confirmation reports zero rows.
        let message = service.low_rating_reviews().await.unwrap();
        assert!(message.starts_with("0 low-rating reviews saved to"));
        let csv = std::fs::read_to_string(dir.path().join("low.csv")).unwrap();
        assert_eq!(csv, "review_id,business_id,stars,review_text\n");
    }

    #[tokio::test]
    async fn test_streamed_output_equals_materialized() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        store
            .insert(
                "business",
                doc(json!({
                    "business_id": "B1",
                    "city": "Reno",
                    "categories": "Restaurants, Bar",
                    "stars": 4.5,
                    "review_count": 20
                })),
            )
            .await
            .unwrap();
        for review in [
            doc(json!({"review_id": "R1", "business_id": "B1", "stars": 5, "text": "Great"})),
            doc(json!({"review_id": "R2", "business_id": "B1", "stars": 4.5, "text": "Good"})),
        ] {
            store.insert("review", review).await.unwrap();
        }

        let settings = Settings {
            store: store_settings(),
            export: ExportSettings {
                high_rating_csv: dir.path().join("high.csv"),
                low_rating_csv: dir.path().join("low.csv"),
            },
        };

        let engine = AggregationEngine::new(store.clone(), &settings.store);
        let materialized =
            export::materialize(engine.high_rating_reviews().await.unwrap()).await;

        let service = AnalyticsService::new(store, &settings);
        let framed: String = service
            .high_rating_reviews()
            .await
            .unwrap()
            .collect::<Vec<_>>()
            .await
            .concat();
        let parsed: Vec<ReviewRow> = serde_json::from_str(&framed).unwrap();
        assert_eq!(parsed, materialized);
    }

    #[tokio::test]
    async fn test_high_csv_path_failure_does_not_break_stream() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        store
            .insert(
                "business",
                doc(json!({
                    "business_id": "B1",
                    "city": "Reno",
                    "categories": "Restaurants",
                    "stars": 4.5,
                    "review_count": 20
                })),
            )
            .await
            .unwrap();
        store
            .insert(
                "review",
                doc(json!({"review_id": "R1", "business_id": "B1", "stars": 5, "text": "Great"})),
            )
            .await
            .unwrap();

        let settings = Settings {
            store: store_settings(),
            export: ExportSettings {
                // Unwritable directory path: the side-file fails to open but
                // the streamed response still completes.
                high_rating_csv: PathBuf::from("/nonexistent/dir/high.csv"),
                low_rating_csv: dir.path().join("low.csv"),
            },
        };
        let service = AnalyticsService::new(store, &settings);

        let framed: String = service
            .high_rating_reviews()
            .await
            .unwrap()
            .collect::<Vec<_>>()
            .await
            .concat();
        let parsed: Vec<ReviewRow> = serde_json::from_str(&framed).unwrap();
        assert_eq!(parsed.len(), 1);
    }
}
