//! Frontier trait and error types
//!
//! This module defines the trait interface for frontier backends and
//! associated error types.

use crate::frontier::{EntryState, QueueEntry};
use thiserror::Error;
use url::Url;

/// Errors that can occur during frontier operations
///
/// Duplicate URLs are never reported here; re-discovery is not a failure.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Frontier connection lock poisoned")]
    Poisoned,
}

/// Result type for frontier operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Trait for frontier backend implementations
///
/// Implementations are shared between crawl tasks, so every operation takes
/// `&self` and each call is an independent, auto-committed write.
pub trait Frontier: Send + Sync {
    // ===== Discovery =====

    /// Adds a URL to the queue unless it is already present
    ///
    /// # Returns
    ///
    /// `true` if a new entry was created, `false` if the URL was already queued
    /// or fetched
    fn enqueue(&self, url: &Url) -> QueueResult<bool>;

    /// Checks whether a URL has ever been queued
    fn contains(&self, url: &str) -> QueueResult<bool>;

    /// Gets a queue entry by URL
    fn get(&self, url: &str) -> QueueResult<Option<QueueEntry>>;

    // ===== Draining =====

    /// Claims up to `limit` pending entries, oldest first
    ///
    /// Claimed entries are not handed out again until released.
    fn claim_batch(&self, limit: u32) -> QueueResult<Vec<QueueEntry>>;

    /// Marks a claimed entry as successfully fetched
    fn mark_fetched(&self, url: &str) -> QueueResult<()>;

    /// Marks a claimed entry as failed
    fn mark_failed(&self, url: &str) -> QueueResult<()>;

    /// Returns every claimed entry to the pending state
    ///
    /// # Returns
    ///
    /// The number of entries released
    fn release_claims(&self) -> QueueResult<u64>;

    // ===== Statistics =====

    /// Gets the total number of entries
    fn len(&self) -> QueueResult<u64>;

    /// Returns true when no URL has been queued
    fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Counts entries in a specific state
    fn count_by_state(&self, state: EntryState) -> QueueResult<u64>;
}
