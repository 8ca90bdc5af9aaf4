//! Database schema for the frontier store

/// SQL schema for the crawl queue
///
/// The UNIQUE constraint on `url` is what keeps the queue free of duplicates,
/// including across concurrent crawls sharing the same database.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS crawl_queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    state TEXT NOT NULL DEFAULT 'pending',
    discovered_at TEXT NOT NULL,
    claimed_at TEXT,
    fetched_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_crawl_queue_state ON crawl_queue(state, id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
