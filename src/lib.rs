//! Inkfeed: a multi-source news archiver
//!
//! This crate fetches stories from heterogeneous upstream sources (the Hacker
//! News item API, the Kagi News category API and generic RSS/Atom feeds),
//! normalizes them into canonical [`Article`]s grouped per source or
//! sub-category, and rewrites foreign images referenced from the rendered
//! HTML so the output can be read offline.

pub mod archiver;
pub mod config;
pub mod feed;
pub mod fetch;
pub mod images;
pub mod output;
pub mod readability;
pub mod render;
pub mod transform;

use thiserror::Error;

/// Main error type for Inkfeed operations
#[derive(Debug, Error)]
pub enum InkfeedError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Malformed JSON from {url}: {source}")]
    Json {
        url: String,
        source: serde_json::Error,
    },

    #[error("No batches available from Kagi News API (language {language})")]
    NoBatches { language: String },

    #[error("Feed parse error for {url}: {message}")]
    FeedParse { url: String, message: String },

    #[error("Unexpected item {id}: {reason}")]
    UnexpectedItem { id: String, reason: String },

    #[error("No archiver registered for source '{name}' (type {kind:?})")]
    UnknownSource { name: String, kind: Option<String> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl InkfeedError {
    /// Returns true when the fault is transient and the request may succeed if repeated
    ///
    /// Transport failures (timeouts, refused or reset connections, truncated
    /// bodies) and 5xx responses are retryable. Client errors, malformed
    /// payloads and every precondition failure are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request() || source.is_body()
            }
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
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
}

/// Result type alias for Inkfeed operations
pub type Result<T> = std::result::Result<T, InkfeedError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use archiver::{ArchiveResult, Archiver, Article, ArticleMetadata, GroupResult};
pub use config::Config;
pub use fetch::{FetchOptions, RetryPolicy};
pub use render::Renderer;
