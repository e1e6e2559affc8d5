//! Database schema definitions
//!
//! This module contains the SQL schema for the crawler database. Every table
//! is keyed by a single unique string column.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- URLs waiting to be crawled
CREATE TABLE IF NOT EXISTS queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- URLs already processed
CREATE TABLE IF NOT EXISTS known_pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- Hostnames whose links may be queued
CREATE TABLE IF NOT EXISTS approved_hostnames (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hostname TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- Hostnames whose links are always dropped
CREATE TABLE IF NOT EXISTS banned_hostnames (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hostname TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- Unreviewed hostnames observed to serve a robots.txt
CREATE TABLE IF NOT EXISTS has_robots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hostname TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);
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
