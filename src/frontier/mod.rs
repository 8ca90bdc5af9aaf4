//! Frontier module for persisting discovered URLs
//!
//! This module holds the de-duplicating work queue of URLs to visit:
//! - SQLite schema with a uniqueness constraint on URL
//! - At-most-once enqueueing of discovered links
//! - Batch claiming for workers that drain the queue
//! - Queue statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteFrontier;
pub use traits::{Frontier, QueueError, QueueResult};

use std::path::Path;

/// Opens or creates a frontier database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteFrontier)` - Successfully opened frontier
/// * `Err(QueueError)` - Failed to open the database or create the schema
pub fn open_frontier(path: &Path) -> QueueResult<SqliteFrontier> {
    SqliteFrontier::new(path)
}

/// One discovered URL awaiting a future fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub url: String,
    pub state: EntryState,
    pub discovered_at: String,
    pub claimed_at: Option<String>,
    pub fetched_at: Option<String>,
}

/// Processing state of a queue entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    Pending,
    Claimed,
    Fetched,
    Failed,
}

impl EntryState {
    pub const ALL: [EntryState; 4] = [
        EntryState::Pending,
        EntryState::Claimed,
        EntryState::Fetched,
        EntryState::Failed,
    ];

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Claimed => "claimed",
            Self::Fetched => "fetched",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "claimed" => Some(Self::Claimed),
            "fetched" => Some(Self::Fetched),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Queue size broken down by entry state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStatistics {
    pub total: u64,
    pub pending: u64,
    pub claimed: u64,
    pub fetched: u64,
    pub failed: u64,
}

/// Loads queue statistics from a frontier
pub fn load_statistics(frontier: &dyn Frontier) -> QueueResult<QueueStatistics> {
    let mut stats = QueueStatistics {
        total: frontier.len()?,
        ..Default::default()
    };

    for state in EntryState::ALL {
        let count = frontier.count_by_state(state)?;
        match state {
            EntryState::Pending => stats.pending = count,
            EntryState::Claimed => stats.claimed = count,
            EntryState::Fetched => stats.fetched = count,
            EntryState::Failed => stats.failed = count,
        }
    }

    Ok(stats)
}
