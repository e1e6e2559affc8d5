//! Storage module for the crawl frontier
//!
//! This module handles every persistent table the crawler reads and writes:
//! - SQLite database initialization and schema management
//! - The queue and the known-page set
//! - Approved, banned and robots-serving hostnames
//!
//! An in-memory store with the same interface backs tests and dry runs.

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{FrontierStore, StorageError, StorageResult, Table};

use crate::config::Config;
use std::path::Path;
use tracing::{debug, info, warn};
use url::Url;

/// Initializes or opens a store database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized store
/// * `Err(StorageError)` - Failed to open or migrate the database
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}

/// Counts of rows written by [`sync_from_config`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub approved: usize,
    pub banned: usize,
    pub seeds_queued: usize,
    pub seeds_skipped: usize,
}

/// Copies configured hostnames and seeds into the store
///
/// Hostname patterns are upserted lowercase. Seeds are stored in their
/// serialized URL form, the same key discovered links are deduplicated by. A
/// seed is queued only if it is neither queued nor known already, so re-running
/// with the same config never re-crawls pages.
pub fn sync_from_config(
    store: &mut dyn FrontierStore,
    config: &Config,
    extra_seeds: &[String],
) -> StorageResult<SyncSummary> {
    let mut summary = SyncSummary::default();

    for pattern in &config.hostnames.approved {
        store.upsert(Table::ApprovedHostnames, &pattern.to_lowercase())?;
        summary.approved += 1;
    }

    for pattern in &config.hostnames.banned {
        store.upsert(Table::BannedHostnames, &pattern.to_lowercase())?;
        summary.banned += 1;
    }

    for raw in config.seeds.iter().chain(extra_seeds) {
        let seed = match Url::parse(raw) {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!("Queueing unparseable seed {} as given: {}", raw, e);
                raw.clone()
            }
        };
        let seed = seed.as_str();

        if store.contains(Table::Queue, seed)? || store.contains(Table::KnownPages, seed)? {
            debug!("Seed {} already queued or known", seed);
            summary.seeds_skipped += 1;
            continue;
        }
        store.insert(Table::Queue, seed)?;
        summary.seeds_queued += 1;
    }

    info!(
        "Synced {} approved and {} banned hostnames; queued {} seeds ({} already present)",
        summary.approved, summary.banned, summary.seeds_queued, summary.seeds_skipped
    );

    Ok(summary)
}
