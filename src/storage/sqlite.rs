//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the FrontierStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{FrontierStore, StorageError, StorageResult, Table};
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates a store at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl FrontierStore for SqliteStore {
    fn select_all(&self, table: Table) -> StorageResult<Vec<String>> {
        let sql = format!(
            "SELECT {key} FROM {table} ORDER BY id",
            key = table.key_column(),
            table = table.name()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn insert(&mut self, table: Table, key: &str) -> StorageResult<()> {
        let sql = format!(
            "INSERT INTO {table} ({key}, created_at) VALUES (?1, ?2)",
            key = table.key_column(),
            table = table.name()
        );
        let now = Utc::now().to_rfc3339();

        match self.conn.execute(&sql, params![key, now]) {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StorageError::DuplicateKey {
                    table,
                    key: key.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&mut self, table: Table, key: &str) -> StorageResult<()> {
        let sql = format!(
            "DELETE FROM {table} WHERE {key} = ?1",
            key = table.key_column(),
            table = table.name()
        );
        self.conn.execute(&sql, params![key])?;
        Ok(())
    }

    fn upsert(&mut self, table: Table, key: &str) -> StorageResult<()> {
        let sql = format!(
            "INSERT INTO {table} ({key}, created_at) VALUES (?1, ?2) ON CONFLICT({key}) DO NOTHING",
            key = table.key_column(),
            table = table.name()
        );
        let now = Utc::now().to_rfc3339();
        self.conn.execute(&sql, params![key, now])?;
        Ok(())
    }

    fn contains(&self, table: Table, key: &str) -> StorageResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {table} WHERE {key} = ?1)",
            key = table.key_column(),
            table = table.name()
        );
        let exists: bool = self.conn.query_row(&sql, params![key], |row| row.get(0))?;
        Ok(exists)
    }

    fn count(&self, table: Table) -> StorageResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
