//! Index lifecycle management
//!
//! The page index must exist with the expected mapping before any document
//! is written or searched.

use crate::search::{error_detail, error_type, SearchClient};
use crate::IndexError;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

/// Error type the engine reports when an index was created concurrently
const ALREADY_EXISTS: &str = "resource_already_exists_exception";

/// What `ensure_index` found or did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The index was already present
    Existed,
    /// The index was created by this call
    Created,
    /// Another actor created the index between the check and the create
    CreatedConcurrently,
}

/// Index body with the field mapping for crawled pages
pub fn page_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "url": { "type": "text" },
                "title": { "type": "text" },
                "content": { "type": "text" }
            }
        }
    })
}

/// Ensures an index exists, creating it with `mapping` when missing
///
/// Only a 404 from the existence check triggers creation. Repeated calls when
/// the index exists are no-ops.
///
/// # Errors
///
/// * `IndexError::ExistsCheck` - the existence check returned neither 200 nor 404
/// * `IndexError::Create` - the engine rejected the create request
/// * `IndexError::Transport` - the engine could not be reached
pub async fn ensure_index(
    client: &SearchClient,
    name: &str,
    mapping: &Value,
) -> Result<EnsureOutcome, IndexError> {
    let response = client.request(Method::HEAD, name).send().await?;

    match response.status() {
        StatusCode::OK => {
            tracing::debug!("Index {} already exists", name);
            return Ok(EnsureOutcome::Existed);
        }
        StatusCode::NOT_FOUND => {}
        status => {
            return Err(IndexError::ExistsCheck {
                index: name.to_string(),
                status: status.as_u16(),
            });
        }
    }

    tracing::info!("Creating index {}", name);
    let response = client
        .request(Method::PUT, name)
        .json(mapping)
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        tracing::info!("Created index {}", name);
        return Ok(EnsureOutcome::Created);
    }

    let body = response.text().await?;
    if error_type(&body).as_deref() == Some(ALREADY_EXISTS) {
        tracing::info!("Index {} was created concurrently", name);
        return Ok(EnsureOutcome::CreatedConcurrently);
    }

    Err(IndexError::Create {
        index: name.to_string(),
        status: status.as_u16(),
        detail: error_detail(&body),
    })
}
