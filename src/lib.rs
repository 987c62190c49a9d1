//! Shelfwatch: a catalog restock watcher
//!
//! This crate periodically crawls a paginated product catalog, extracts
//! structured listings, compares them against previously observed state, and
//! emits change events (new listing, restock) for downstream notification.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod notify;
pub mod storage;

use thiserror::Error;

/// Main error type for shelfwatch operations
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Extraction error: {0}")]
    Extract(#[from] crawler::ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Notification error: {0}")]
    Notify(#[from] notify::NotifyError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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

    #[error("Invalid CSS selector in config: {0}")]
    InvalidSelector(String),
}

/// Result type alias for shelfwatch operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::{AlertEvent, CatalogItem, ChangeKind, ListingRecord};
pub use config::Config;
pub use crawler::Coordinator;
