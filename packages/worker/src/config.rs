use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub uploads_bucket: String,
    pub assets_bucket: String,
    pub gemini_api_key: Option<String>,
    pub chromium_path: Option<String>,
    /// How long a received queue message stays invisible before redelivery
    pub queue_visibility_timeout_secs: u64,
    /// Deliveries allowed before a message is dead-lettered
    pub queue_max_receive_count: i32,
    /// Wall-clock cap on a single headless-browser render
    pub render_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            uploads_bucket: env::var("S3_UPLOADS_BUCKET")
                .context("S3_UPLOADS_BUCKET must be set")?,
            assets_bucket: env::var("S3_ASSETS_BUCKET")
                .context("S3_ASSETS_BUCKET must be set")?,
            gemini_api_key: env::var("GEMINI_API_KEY").ok(),
            chromium_path: env::var("CHROMIUM_PATH").ok(),
            queue_visibility_timeout_secs: env::var("QUEUE_VISIBILITY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .context("QUEUE_VISIBILITY_TIMEOUT_SECS must be a valid number")?,
            queue_max_receive_count: env::var("QUEUE_MAX_RECEIVE_COUNT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("QUEUE_MAX_RECEIVE_COUNT must be a valid number")?,
            render_timeout_secs: env::var("RENDER_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("RENDER_TIMEOUT_SECS must be a valid number")?,
        })
    }
}
