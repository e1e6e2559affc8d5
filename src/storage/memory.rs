//! In-memory storage implementation
//!
//! Useful for tests and dry runs; nothing survives the process.

use crate::storage::traits::{FrontierStore, StorageError, StorageResult, Table};
use std::collections::HashMap;

/// A [`FrontierStore`] that keeps every table in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: HashMap<Table, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store with `rows` pre-inserted into `table`, ignoring duplicates
    pub fn with_rows<I, S>(mut self, table: Table, rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for row in rows {
            let row = row.as_ref();
            let entries = self.tables.entry(table).or_default();
            if !entries.iter().any(|existing| existing == row) {
                entries.push(row.to_string());
            }
        }
        self
    }

    fn rows(&self, table: Table) -> &[String] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or_default()
    }
}

impl FrontierStore for MemoryStore {
    fn select_all(&self, table: Table) -> StorageResult<Vec<String>> {
        Ok(self.rows(table).to_vec())
    }

    fn insert(&mut self, table: Table, key: &str) -> StorageResult<()> {
        if self.rows(table).iter().any(|row| row == key) {
            return Err(StorageError::DuplicateKey {
                table,
                key: key.to_string(),
            });
        }
        self.tables.entry(table).or_default().push(key.to_string());
        Ok(())
    }

    fn delete(&mut self, table: Table, key: &str) -> StorageResult<()> {
        if let Some(rows) = self.tables.get_mut(&table) {
            rows.retain(|row| row != key);
        }
        Ok(())
    }

    fn upsert(&mut self, table: Table, key: &str) -> StorageResult<()> {
        if !self.rows(table).iter().any(|row| row == key) {
            self.tables.entry(table).or_default().push(key.to_string());
        }
        Ok(())
    }

    fn contains(&self, table: Table, key: &str) -> StorageResult<bool> {
        Ok(self.rows(table).iter().any(|row| row == key))
    }
}
