//! Search query service
//!
//! Free text is placed into the request body as a JSON string value, never
//! spliced into query text, so user input cannot change the query structure.

use crate::search::{error_detail, SearchClient};
use crate::SearchError;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Fields the multi-field match query scores against
pub const SEARCH_FIELDS: &[&str] = &["title", "content"];

/// The query text was empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Missing search query")]
pub struct MissingQuery;

/// A validated, non-empty free-text query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Validates query text
    ///
    /// Whitespace-only text counts as missing.
    pub fn new(text: impl Into<String>) -> Result<Self, MissingQuery> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(MissingQuery);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the multi-field match request body
    pub fn to_request_body(&self, size: u32) -> Value {
        json!({
            "query": {
                "multi_match": {
                    "query": self.0,
                    "fields": SEARCH_FIELDS,
                }
            },
            "size": size,
        })
    }
}

/// One matched page, in engine relevance order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: Option<f64>,
    pub url: String,
    pub title: Option<String>,
    pub content: String,
    pub timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HitSource {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Extracts hits from a search response, preserving order
///
/// A response without a `hits.hits` array yields no hits rather than an error.
pub fn shape_hits(response: &Value) -> Vec<SearchHit> {
    let Some(hits) = response
        .get("hits")
        .and_then(|hits| hits.get("hits"))
        .and_then(Value::as_array)
    else {
        tracing::debug!("No hits array in search response");
        return Vec::new();
    };

    hits.iter()
        .map(|hit| {
            let source = hit
                .get("_source")
                .cloned()
                .and_then(|source| serde_json::from_value::<HitSource>(source).ok())
                .unwrap_or_default();

            SearchHit {
                id: hit
                    .get("_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                score: hit.get("_score").and_then(Value::as_f64),
                url: source.url,
                title: source.title,
                content: source.content,
                timestamp: source.timestamp,
            }
        })
        .collect()
}

/// Runs keyword searches against the page index
#[derive(Debug, Clone)]
pub struct SearchService {
    client: SearchClient,
    index: String,
    size: u32,
}

impl SearchService {
    pub fn new(client: SearchClient, index: impl Into<String>, size: u32) -> Self {
        Self {
            client,
            index: index.into(),
            size,
        }
    }

    /// Searches the index for `text`
    ///
    /// # Errors
    ///
    /// * `SearchError::MissingQuery` - `text` is empty; the engine is not contacted
    /// * `SearchError::Engine` - the engine answered with an error status
    /// * `SearchError::Transport` / `SearchError::Malformed` - request or body failures
    pub async fn search(&self, text: &str) -> Result<Vec<SearchHit>, SearchError> {
        let query = SearchQuery::new(text)?;
        self.run(&query).await
    }

    /// Executes an already validated query
    pub async fn run(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, SearchError> {
        let response = self
            .client
            .request(Method::POST, &format!("{}/_search", self.index))
            .json(&query.to_request_body(self.size))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = error_detail(&body);
            tracing::warn!("Search engine error (HTTP {}): {}", status.as_u16(), detail);
            return Err(SearchError::Engine {
                status: status.as_u16(),
                detail,
            });
        }

        let value: Value = serde_json::from_str(&body)?;
        let hits = shape_hits(&value);
        tracing::debug!("Search for {:?} returned {} hits", query.as_str(), hits.len());
        Ok(hits)
    }
}
