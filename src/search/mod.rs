//! Search engine integration
//!
//! This module talks to an Elasticsearch-compatible HTTP API:
//! - Connecting with bounded retry and a readiness check
//! - Ensuring the page index exists with the expected mapping
//! - Writing page documents under deterministic identifiers
//! - Translating free-text queries into multi-field match queries

mod client;
mod index;
mod indexer;
mod query;

pub use client::{connect, ClusterHealth, ClusterInfo, SearchClient, VersionInfo};
pub use index::{ensure_index, page_mapping, EnsureOutcome};
pub use indexer::{document_id, Indexer, IndexerStats, PageDocument};
pub use query::{shape_hits, MissingQuery, SearchHit, SearchQuery, SearchService};

use serde_json::Value;

/// Extracts a readable error description from an engine error body
///
/// Engine errors look like `{"error": {"type": ..., "reason": ...}, "status": N}`.
/// Anything else is returned as the raw body.
pub(crate) fn error_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    match value.get("error") {
        Some(Value::Object(error)) => {
            let kind = error.get("type").and_then(Value::as_str);
            let reason = error.get("reason").and_then(Value::as_str);
            match (kind, reason) {
                (Some(kind), Some(reason)) => format!("{}: {}", kind, reason),
                (None, Some(reason)) => reason.to_string(),
                _ => Value::Object(error.clone()).to_string(),
            }
        }
        Some(Value::String(error)) => error.clone(),
        _ => value.to_string(),
    }
}

/// Returns the engine's error type, if the body carries one
pub(crate) fn error_type(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("type")?
        .as_str()
        .map(str::to_string)
}
