//! Storage traits and error types
//!
//! The crawl engine treats the store as the single source of truth for the
//! frontier, the known pages and the hostname lists. It only ever selects,
//! inserts, deletes and upserts single-key rows.

use std::fmt;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Duplicate key '{key}' in table {table}")]
    DuplicateKey { table: Table, key: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Tables the crawler reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    /// URLs waiting to be crawled, in insertion order
    Queue,
    /// URLs already processed
    KnownPages,
    /// Hostnames whose links may be queued
    ApprovedHostnames,
    /// Hostnames whose links are always dropped
    BannedHostnames,
    /// Unreviewed hostnames observed to serve a robots.txt
    HasRobots,
}

impl Table {
    /// Returns all tables
    pub fn all() -> [Self; 5] {
        [
            Self::Queue,
            Self::KnownPages,
            Self::ApprovedHostnames,
            Self::BannedHostnames,
            Self::HasRobots,
        ]
    }

    /// SQL table name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Queue => "queue",
            Self::KnownPages => "known_pages",
            Self::ApprovedHostnames => "approved_hostnames",
            Self::BannedHostnames => "banned_hostnames",
            Self::HasRobots => "has_robots",
        }
    }

    /// Name of the key column (`url` or `hostname`)
    pub fn key_column(&self) -> &'static str {
        match self {
            Self::Queue | Self::KnownPages => "url",
            Self::ApprovedHostnames | Self::BannedHostnames | Self::HasRobots => "hostname",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Trait for frontier store implementations
///
/// Rows are identified by a single string key. Implementations must return
/// rows from [`select_all`](FrontierStore::select_all) in insertion order so
/// the queue is processed first-in, first-out.
pub trait FrontierStore {
    /// Returns every key in `table`, oldest first
    fn select_all(&self, table: Table) -> StorageResult<Vec<String>>;

    /// Inserts a new row
    ///
    /// # Errors
    ///
    /// Fails with [`StorageError::DuplicateKey`] if the key already exists.
    fn insert(&mut self, table: Table, key: &str) -> StorageResult<()>;

    /// Deletes the row with `key`; deleting a missing key is not an error
    fn delete(&mut self, table: Table, key: &str) -> StorageResult<()>;

    /// Inserts a row, or leaves the existing row in place on key conflict
    fn upsert(&mut self, table: Table, key: &str) -> StorageResult<()>;

    /// Checks whether `key` exists in `table`
    fn contains(&self, table: Table, key: &str) -> StorageResult<bool> {
        Ok(self.select_all(table)?.iter().any(|row| row == key))
    }

    /// Counts rows in `table`
    fn count(&self, table: Table) -> StorageResult<u64> {
        Ok(self.select_all(table)?.len() as u64)
    }
}
