//! Page document indexer
//!
//! Documents are written under an identifier derived from the page URL, so a
//! re-crawl overwrites the previous document instead of adding a duplicate.
//!
//! Write failures never reach the crawl: they are logged and counted, and the
//! crawl carries on. A failed write is therefore invisible to whoever
//! triggered the crawl; `IndexerStats` is the place to look for them.

use crate::search::{error_detail, SearchClient};
use crate::IndexWriteError;
use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

/// The indexed representation of one fetched page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl PageDocument {
    pub fn new(
        url: impl Into<String>,
        title: Option<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.into(),
            title,
            content: content.into(),
            timestamp,
        }
    }

    /// Identifier this document is stored under
    pub fn document_id(&self) -> String {
        document_id(&self.url)
    }
}

/// Derives a stable document identifier from a URL
///
/// Hex-encoded SHA-256, which is also safe to use as a path segment.
pub fn document_id(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// Counts of document writes since the indexer was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexerStats {
    pub indexed: u64,
    pub failed: u64,
}

/// Writes page documents into one index
#[derive(Debug)]
pub struct Indexer {
    client: SearchClient,
    index: String,
    indexed: AtomicU64,
    failed: AtomicU64,
}

impl Indexer {
    pub fn new(client: SearchClient, index: impl Into<String>) -> Self {
        Self {
            client,
            index: index.into(),
            indexed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index
    }

    /// Writes a document with immediate visibility
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The document identifier
    /// * `Err(IndexWriteError)` - Serialization, transport or engine failure
    pub async fn try_index(&self, doc: &PageDocument) -> Result<String, IndexWriteError> {
        let id = doc.document_id();
        let body = serde_json::to_vec(doc)?;

        let response = self
            .client
            .request(Method::PUT, &format!("{}/_doc/{}", self.index, id))
            .query(&[("refresh", "true")])
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(id);
        }

        let body = response.text().await.unwrap_or_default();
        Err(IndexWriteError::Rejected {
            status: status.as_u16(),
            detail: error_detail(&body),
        })
    }

    /// Writes a document, logging and swallowing any failure
    ///
    /// # Returns
    ///
    /// `true` if the document was written
    pub async fn index_document(&self, doc: &PageDocument) -> bool {
        match self.try_index(doc).await {
            Ok(id) => {
                self.indexed.fetch_add(1, Ordering::Relaxed);
                tracing::info!("Successfully indexed page {} (id {})", doc.url, id);
                true
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Error indexing page {}: {}", doc.url, e);
                false
            }
        }
    }

    pub fn stats(&self) -> IndexerStats {
        IndexerStats {
            indexed: self.indexed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
