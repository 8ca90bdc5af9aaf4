//! SQLite frontier implementation
//!
//! This module provides a SQLite-based implementation of the Frontier trait.

use crate::frontier::schema::initialize_schema;
use crate::frontier::traits::{Frontier, QueueError, QueueResult};
use crate::frontier::{EntryState, QueueEntry};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use url::Url;

const ENTRY_COLUMNS: &str = "url, state, discovered_at, claimed_at, fetched_at";

/// SQLite frontier backend
pub struct SqliteFrontier {
    conn: Mutex<Connection>,
}

impl SqliteFrontier {
    /// Creates a new SqliteFrontier instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteFrontier)` - Successfully opened/created database
    /// * `Err(QueueError)` - Failed to open database
    pub fn new(path: &Path) -> QueueResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> QueueResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> QueueResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| QueueError::Poisoned)
    }

    fn set_state(&self, url: &str, state: EntryState, column: &str) -> QueueResult<()> {
        let now = Utc::now().to_rfc3339();
        let sql = format!(
            "UPDATE crawl_queue SET state = ?1, {} = ?2 WHERE url = ?3",
            column
        );
        self.conn()?
            .execute(&sql, params![state.to_db_string(), now, url])?;
        Ok(())
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<QueueEntry> {
    Ok(QueueEntry {
        url: row.get(0)?,
        state: EntryState::from_db_string(&row.get::<_, String>(1)?)
            .unwrap_or(EntryState::Pending),
        discovered_at: row.get(2)?,
        claimed_at: row.get(3)?,
        fetched_at: row.get(4)?,
    })
}

impl Frontier for SqliteFrontier {
    fn enqueue(&self, url: &Url) -> QueueResult<bool> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn()?.execute(
            "INSERT INTO crawl_queue (url, state, discovered_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (url) DO NOTHING",
            params![url.as_str(), EntryState::Pending.to_db_string(), now],
        )?;
        Ok(inserted > 0)
    }

    fn contains(&self, url: &str) -> QueueResult<bool> {
        let found: Option<i64> = self
            .conn()?
            .query_row(
                "SELECT 1 FROM crawl_queue WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn get(&self, url: &str) -> QueueResult<Option<QueueEntry>> {
        let conn = self.conn()?;
        let entry = conn
            .query_row(
                &format!("SELECT {} FROM crawl_queue WHERE url = ?1", ENTRY_COLUMNS),
                params![url],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    fn claim_batch(&self, limit: u32) -> QueueResult<Vec<QueueEntry>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut entries = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {} FROM crawl_queue WHERE state = ?1 ORDER BY id LIMIT ?2",
                ENTRY_COLUMNS
            ))?;
            let rows = stmt.query_map(
                params![EntryState::Pending.to_db_string(), limit],
                entry_from_row,
            )?;
            let entries = rows.collect::<Result<Vec<_>, _>>()?;
            entries
        };

        let now = Utc::now().to_rfc3339();
        for entry in &mut entries {
            tx.execute(
                "UPDATE crawl_queue SET state = ?1, claimed_at = ?2 WHERE url = ?3",
                params![EntryState::Claimed.to_db_string(), now, entry.url],
            )?;
            entry.state = EntryState::Claimed;
            entry.claimed_at = Some(now.clone());
        }

        tx.commit()?;
        Ok(entries)
    }

    fn mark_fetched(&self, url: &str) -> QueueResult<()> {
        self.set_state(url, EntryState::Fetched, "fetched_at")
    }

    fn mark_failed(&self, url: &str) -> QueueResult<()> {
        self.set_state(url, EntryState::Failed, "fetched_at")
    }

    fn release_claims(&self) -> QueueResult<u64> {
        let released = self.conn()?.execute(
            "UPDATE crawl_queue SET state = ?1, claimed_at = NULL WHERE state = ?2",
            params![
                EntryState::Pending.to_db_string(),
                EntryState::Claimed.to_db_string()
            ],
        )?;
        Ok(released as u64)
    }

    fn len(&self) -> QueueResult<u64> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM crawl_queue", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_state(&self, state: EntryState) -> QueueResult<u64> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM crawl_queue WHERE state = ?1",
            params![state.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
