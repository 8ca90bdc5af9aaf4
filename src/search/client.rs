//! Search engine client and connection manager
//!
//! `connect` builds a client and waits for the engine to report ready, retrying
//! with a fixed backoff. The returned handle is cheap to clone and is shared
//! read-only by the indexer, the index lifecycle checks and the query service.

use crate::config::{Readiness, SearchConfig};
use crate::ConnectionError;
use reqwest::{Certificate, Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Cluster health statuses that can serve reads and writes
const SERVING_STATUSES: &[&str] = &["green", "yellow"];

/// Handle to the search engine HTTP API
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: Client,
    endpoint: String,
    username: Option<String>,
    password: Option<String>,
}

/// Subset of the cluster health response
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterHealth {
    pub status: String,
    #[serde(default)]
    pub cluster_name: Option<String>,
}

impl ClusterHealth {
    /// Returns true for healthy or degraded-but-serving clusters
    pub fn is_serving(&self) -> bool {
        SERVING_STATUSES.contains(&self.status.as_str())
    }
}

/// Subset of the cluster info response
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterInfo {
    #[serde(default)]
    pub cluster_name: Option<String>,
    pub version: VersionInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    pub number: String,
}

impl SearchClient {
    /// Builds a client without contacting the engine
    ///
    /// # Errors
    ///
    /// Fails when the endpoint is not a URL, the CA certificate cannot be read
    /// or parsed, or the HTTP client cannot be constructed.
    pub fn new(config: &SearchConfig) -> Result<Self, ConnectionError> {
        Url::parse(&config.endpoint).map_err(|e| {
            ConnectionError::InvalidEndpoint(format!("{}: {}", config.endpoint, e))
        })?;

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10));

        if let Some(path) = &config.ca_cert_path {
            let pem = std::fs::read(path).map_err(|source| ConnectionError::CaCertificate {
                path: path.clone(),
                source,
            })?;
            let cert = Certificate::from_pem(&pem).map_err(ConnectionError::InvalidCertificate)?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder.build().map_err(ConnectionError::Build)?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Base URL of the engine API
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    /// Starts an authenticated request against an API path
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url_for(path));
        match &self.username {
            Some(username) => builder.basic_auth(username, self.password.as_ref()),
            None => builder,
        }
    }

    /// Fetches cluster health
    pub async fn cluster_health(&self) -> Result<ClusterHealth, ConnectionError> {
        let response = self.request(Method::GET, "_cluster/health").send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(ConnectionError::Status(status.as_u16()));
        }

        response
            .json::<ClusterHealth>()
            .await
            .map_err(|e| ConnectionError::Malformed(e.to_string()))
    }

    /// Fetches cluster info (name and version)
    pub async fn cluster_info(&self) -> Result<ClusterInfo, ConnectionError> {
        let response = self.request(Method::GET, "").send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(ConnectionError::Status(status.as_u16()));
        }

        response
            .json::<ClusterInfo>()
            .await
            .map_err(|e| ConnectionError::Malformed(e.to_string()))
    }

    /// Waits until the engine reports ready
    ///
    /// In health mode the cluster health is polled up to `health_attempts`
    /// times; in info mode a single info call must return a version.
    async fn wait_until_ready(&self, config: &SearchConfig) -> Result<(), ConnectionError> {
        match config.readiness {
            Readiness::Info => {
                let info = self.cluster_info().await?;
                tracing::info!("Connected to search engine version {}", info.version.number);
                Ok(())
            }
            Readiness::Health => {
                let interval = Duration::from_millis(config.health_interval_ms);
                let mut last_error = ConnectionError::Unhealthy("unknown".to_string());

                for check in 1..=config.health_attempts {
                    match self.cluster_health().await {
                        Ok(health) if health.is_serving() => {
                            tracing::info!("Search engine is healthy (status: {})", health.status);
                            return Ok(());
                        }
                        Ok(health) => {
                            tracing::warn!(
                                "Search engine not ready (health check {}): status {}",
                                check,
                                health.status
                            );
                            last_error = ConnectionError::Unhealthy(health.status);
                        }
                        Err(e) => {
                            tracing::warn!("Error checking search engine health (check {}): {}", check, e);
                            last_error = e;
                        }
                    }

                    if check < config.health_attempts {
                        tokio::time::sleep(interval).await;
                    }
                }

                Err(last_error)
            }
        }
    }
}

/// Connects to the search engine with bounded retry
///
/// Each attempt builds a client and runs the readiness check. Attempts are
/// separated by a fixed `connect_backoff_ms` delay without jitter.
///
/// # Errors
///
/// Returns `ConnectionError::Exhausted` carrying the last cause once
/// `connect_attempts` attempts have failed.
pub async fn connect(config: &SearchConfig) -> Result<SearchClient, ConnectionError> {
    let attempts = config.connect_attempts.max(1);
    let backoff = Duration::from_millis(config.connect_backoff_ms);
    let mut last_error = None;

    for attempt in 1..=attempts {
        tracing::info!(
            "Connecting to search engine at {} (attempt {}/{})",
            config.endpoint,
            attempt,
            attempts
        );

        match SearchClient::new(config) {
            Ok(client) => match client.wait_until_ready(config).await {
                Ok(()) => return Ok(client),
                Err(e) => {
                    tracing::warn!("Search engine not ready (attempt {}): {}", attempt, e);
                    last_error = Some(e);
                }
            },
            Err(e) => {
                tracing::warn!("Error creating search client (attempt {}): {}", attempt, e);
                last_error = Some(e);
            }
        }

        if attempt < attempts {
            tokio::time::sleep(backoff).await;
        }
    }

    let last = last_error.unwrap_or_else(|| ConnectionError::Unhealthy("unknown".to_string()));
    tracing::error!(
        "Failed to connect to search engine after {} attempts: {}",
        attempts,
        last
    );

    Err(ConnectionError::Exhausted {
        attempts,
        last: Box::new(last),
    })
}
