//! HTTP fetcher implementation
//!
//! This module handles page requests for the crawler:
//! - Building the HTTP client with user agent and timeouts
//! - GET requests with redirect following
//! - Classifying transport and status failures

use crate::config::FetcherConfig;
use crate::FetchError;
use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed per fetch
const MAX_REDIRECTS: usize = 10;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested
    pub requested_url: Url,
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Page body content
    pub body: String,
    /// When the response was received
    pub fetched_at: DateTime<Utc>,
}

impl FetchedPage {
    /// Returns true if the page should be scanned for links
    ///
    /// A missing Content-Type is treated as HTML.
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            Some(content_type) => content_type.to_ascii_lowercase().contains("html"),
            None => true,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use trawl::config::FetcherConfig;
/// use trawl::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page
///
/// There is no retry: a transport failure or a non-success status ends the
/// fetch.
///
/// # Errors
///
/// * `FetchError::Http` - DNS, connection, TLS, redirect or timeout failure
/// * `FetchError::Status` - the server answered with a non-2xx status
/// * `FetchError::Body` - the body could not be read
pub async fn fetch_page(client: &Client, url: &Url) -> Result<FetchedPage, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

    let fetched_at = Utc::now();
    let status = response.status();
    let final_url = response.url().clone();

    if !status.is_success() {
        return Err(FetchError::Status {
            url: final_url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = response.text().await.map_err(|source| FetchError::Body {
        url: final_url.to_string(),
        source,
    })?;

    tracing::debug!(
        "Fetched {} ({} bytes, status {})",
        final_url,
        body.len(),
        status.as_u16()
    );

    Ok(FetchedPage {
        requested_url: url.clone(),
        final_url,
        status_code: status.as_u16(),
        content_type,
        body,
        fetched_at,
    })
}
