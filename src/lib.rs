//! Estate-Sweep: a concurrent classifieds ingester
//!
//! This crate crawls paginated real-estate listing pages, hands every
//! discovered ad to a bounded pool of fetchers, extracts structured records
//! and stores them in a content-addressed store that rejects duplicates.

pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Estate-Sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to open listing {url}: {source}")]
    SeedNavigation {
        url: String,
        source: crawler::FetchError,
    },

    #[error("Storage error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Estate-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Pipeline, RunConfig, RunSummary, StopReason};
pub use record::AdRecord;
pub use state::{RunPhase, WorkerState};
pub use url::{extract_host, normalize_url};
