//! Configuration layering: `config/default.toml`, an optional
//! `config/local.toml` override, then `REVIEWSTREAM_`-prefixed environment
//! variables (nested keys separated by `__`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub store: StoreSettings,
    pub export: ExportSettings,
}

/// Collection names the analytic pipelines read from.
#[derive(Debug, Deserialize)]
pub struct StoreSettings {
    pub business_collection: String,
    pub review_collection: String,
}

/// Side-file destinations for the review extracts.
#[derive(Debug, Deserialize)]
pub struct ExportSettings {
    pub high_rating_csv: PathBuf,
    pub low_rating_csv: PathBuf,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = Path::new("config");

        let builder = Config::builder()
            // Start with default settings
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local overrides
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Add environment variables with prefix REVIEWSTREAM_
            .add_source(Environment::with_prefix("REVIEWSTREAM").separator("__"));

        builder.build()?.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: StoreSettings {
                business_collection: "business".to_string(),
                review_collection: "review".to_string(),
            },
            export: ExportSettings {
                high_rating_csv: PathBuf::from("high_rating_reviews.csv"),
                low_rating_csv: PathBuf::from("low_rating_reviews.csv"),
            },
        }
    }
}
