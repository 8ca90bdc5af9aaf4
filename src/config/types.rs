use crate::crawler::LinkResolution;
use serde::Deserialize;

/// Main configuration structure for Trawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub frontier: FrontierConfig,
}

/// How the connection manager decides the search engine is ready
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Readiness {
    /// Poll cluster health until it reports green or yellow
    Health,
    /// A single cluster info call that must return a version
    Info,
}

/// Search engine connection and index configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the search engine HTTP API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Basic auth user name
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password
    #[serde(default)]
    pub password: Option<String>,

    /// PEM file with the CA certificate that signed the engine's TLS certificate
    #[serde(rename = "ca-cert-path", default)]
    pub ca_cert_path: Option<String>,

    /// Name of the index pages are written to
    #[serde(rename = "index-name", default = "default_index_name")]
    pub index_name: String,

    #[serde(default = "default_readiness")]
    pub readiness: Readiness,

    /// Number of client construction attempts
    #[serde(rename = "connect-attempts", default = "default_connect_attempts")]
    pub connect_attempts: u32,

    /// Delay between construction attempts (milliseconds)
    #[serde(rename = "connect-backoff-ms", default = "default_connect_backoff_ms")]
    pub connect_backoff_ms: u64,

    /// Number of health polls per construction attempt
    #[serde(rename = "health-attempts", default = "default_health_attempts")]
    pub health_attempts: u32,

    /// Delay between health polls (milliseconds)
    #[serde(rename = "health-interval-ms", default = "default_health_interval_ms")]
    pub health_interval_ms: u64,

    #[serde(rename = "request-timeout-secs", default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum number of hits returned per search
    #[serde(rename = "result-size", default = "default_result_size")]
    pub result_size: u32,
}

/// Page fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Base URL used when resolving relative links
    #[serde(rename = "link-resolution", default)]
    pub link_resolution: LinkResolution,
}

/// Frontier store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FrontierConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Number of queue entries claimed per drain round
    #[serde(rename = "claim-batch-size", default = "default_claim_batch_size")]
    pub claim_batch_size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            username: None,
            password: None,
            ca_cert_path: None,
            index_name: default_index_name(),
            readiness: default_readiness(),
            connect_attempts: default_connect_attempts(),
            connect_backoff_ms: default_connect_backoff_ms(),
            health_attempts: default_health_attempts(),
            health_interval_ms: default_health_interval_ms(),
            request_timeout_secs: default_timeout_secs(),
            result_size: default_result_size(),
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            link_resolution: LinkResolution::default(),
        }
    }
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            claim_batch_size: default_claim_batch_size(),
        }
    }
}

fn default_endpoint() -> String {
    "https://localhost:9200".to_string()
}

fn default_index_name() -> String {
    "pages".to_string()
}

fn default_readiness() -> Readiness {
    Readiness::Health
}

fn default_connect_attempts() -> u32 {
    5
}

fn default_connect_backoff_ms() -> u64 {
    5_000
}

fn default_health_attempts() -> u32 {
    10
}

fn default_health_interval_ms() -> u64 {
    2_000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_result_size() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("trawl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_database_path() -> String {
    "trawl.db".to_string()
}

fn default_claim_batch_size() -> u32 {
    16
}
