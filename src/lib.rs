//! Trawl: a crawl-and-index pipeline
//!
//! This crate fetches a seed page, records its outbound links in a de-duplicated
//! frontier queue, indexes the page into a search engine, and serves keyword
//! search over the indexed pages.

pub mod config;
pub mod crawler;
pub mod frontier;
pub mod search;

use thiserror::Error;

/// Main error type for crawl operations
///
/// Only connection, index and fetch failures abort a crawl. Queue and
/// document-write failures are contained at link and document granularity.
#[derive(Debug, Error)]
pub enum TrawlError {
    #[error("Search engine connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Queue error: {0}")]
    Queue(#[from] frontier::QueueError),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
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

/// Errors raised while establishing the search engine connection
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to read CA certificate {path}: {source}")]
    CaCertificate {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid CA certificate: {0}")]
    InvalidCertificate(reqwest::Error),

    #[error("Failed to build search client: {0}")]
    Build(reqwest::Error),

    #[error("Invalid search endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Readiness request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Readiness check returned HTTP {0}")]
    Status(u16),

    #[error("Cluster status is {0}")]
    Unhealthy(String),

    #[error("Unexpected readiness response: {0}")]
    Malformed(String),

    #[error("Failed to connect after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<ConnectionError>,
    },
}

/// Errors raised while ensuring the target index exists
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Index request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Existence check for index {index} returned HTTP {status}")]
    ExistsCheck { index: String, status: u16 },

    #[error("Failed to create index {index} (HTTP {status}): {detail}")]
    Create {
        index: String,
        status: u16,
        detail: String,
    },
}

/// Errors raised by the top-level page fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid start URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: ::url::ParseError,
    },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },

    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),
}

/// Errors raised while writing one document to the index
#[derive(Debug, Error)]
pub enum IndexWriteError {
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Index write failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Index write rejected (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },
}

/// Errors surfaced to search callers
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    MissingQuery(#[from] search::MissingQuery),

    #[error("Search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Search engine error (HTTP {status}): {detail}")]
    Engine { status: u16, detail: String },

    #[error("Failed to parse search response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, TrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlReport, Crawler, DrainReport, LinkResolution};
pub use frontier::{Frontier, QueueEntry, SqliteFrontier};
pub use search::{PageDocument, SearchClient, SearchHit, SearchQuery};
