//! Batch entry point: load the two JSON-lines datasets into the in-memory
//! store, then run the three analytic operations and print their output.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use futures::StreamExt;
use reviewstream::{import_json_lines, AnalyticsService, MemoryStore, Settings};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct CliArgs {
    /// JSON-lines file of business documents
    #[arg(long, value_name = "FILE")]
    business_file: Option<PathBuf>,

    /// JSON-lines file of review documents
    #[arg(long, value_name = "FILE")]
    review_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = CliArgs::parse();
    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            warn!(error = %e, "configuration failed to load, using defaults");
            Settings::default()
        }
    };

    let store = Arc::new(MemoryStore::new());

    if let Some(path) = &cli.business_file {
        let report =
            import_json_lines(store.as_ref(), path, &settings.store.business_collection).await?;
        info!(
            path = %path.display(),
            inserted = report.inserted,
            skipped = report.skipped,
            "businesses loaded"
        );
    }
    if let Some(path) = &cli.review_file {
        let report =
            import_json_lines(store.as_ref(), path, &settings.store.review_collection).await?;
        info!(
            path = %path.display(),
            inserted = report.inserted,
            skipped = report.skipped,
            "reviews loaded"
        );
    }

    let service = AnalyticsService::new(store, &settings);

    for line in service.count_business_by_city_and_stars().await? {
        println!("{line}");
    }

    let mut chunks = service.high_rating_reviews().await?;
    while let Some(chunk) = chunks.next().await {
        print!("{chunk}");
    }
    println!();

    println!("{}", service.low_rating_reviews().await?);

    Ok(())
}
