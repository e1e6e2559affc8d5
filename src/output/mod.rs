//! Output module for crawl statistics
//!
//! This module handles:
//! - Accumulating per-run counters as cycles complete
//! - Summarizing the store contents
//! - Printing both to stdout

pub mod stats;

pub use stats::{
    print_statistics, print_store_summary, verdict_counts, RunStatistics, StoreSummary,
};
