//! Crawl statistics
//!
//! `RunStatistics` is accumulated by the engine as cycles complete.
//! `StoreSummary` is read from the store for `--stats`.

use crate::crawler::{CycleOutcome, CycleReport, LinkVerdict};
use crate::storage::{FrontierStore, StorageResult, Table};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

/// Counters for a single crawl run
#[derive(Debug, Clone)]
pub struct RunStatistics {
    /// Cycles executed (frontier URLs pulled)
    pub cycles: u64,

    /// URLs fetched and recorded as known
    pub pages_crawled: u64,

    /// URLs dequeued without being recorded
    pub pages_rejected: u64,

    /// Rejections keyed by reason label
    pub rejections: BTreeMap<&'static str, u64>,

    /// Hrefs found across all crawled pages
    pub links_discovered: u64,

    /// Links added to the queue
    pub links_enqueued: u64,

    /// Unknown hostnames probed for robots.txt
    pub hosts_probed: u64,

    /// Probed hostnames that served a robots.txt
    pub hosts_with_robots: u64,

    /// Whether the run ended because the page limit was reached
    pub stopped_at_limit: bool,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for RunStatistics {
    fn default() -> Self {
        Self {
            cycles: 0,
            pages_crawled: 0,
            pages_rejected: 0,
            rejections: BTreeMap::new(),
            links_discovered: 0,
            links_enqueued: 0,
            hosts_probed: 0,
            hosts_with_robots: 0,
            stopped_at_limit: false,
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one cycle into the counters
    pub fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;

        match &report.outcome {
            CycleOutcome::Crawled { links_enqueued } => {
                self.pages_crawled += 1;
                self.links_enqueued += *links_enqueued as u64;
            }
            CycleOutcome::Rejected(reason) => {
                self.pages_rejected += 1;
                *self.rejections.entry(reason.kind()).or_insert(0) += 1;
            }
        }

        self.links_discovered += report.links.len() as u64;
    }

    /// Records the result of a robots probe against an unknown host
    pub fn record_probe(&mut self, has_robots: bool) {
        self.hosts_probed += 1;
        if has_robots {
            self.hosts_with_robots += 1;
        }
    }

    /// Stamps the end of the run
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration, up to now if the run has not finished
    pub fn duration(&self) -> Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }

    /// Number of links that were dropped for any reason
    pub fn links_dropped(&self) -> u64 {
        self.links_discovered.saturating_sub(self.links_enqueued)
    }
}

/// Counts every link verdict in a report by label
pub fn verdict_counts(report: &CycleReport) -> BTreeMap<&'static str, u64> {
    let mut counts = BTreeMap::new();
    for link in &report.links {
        let label = match link.verdict {
            LinkVerdict::Enqueued(_) => "enqueued",
            LinkVerdict::Fragment => "fragment",
            LinkVerdict::Xml => "xml",
            LinkVerdict::Malformed => "malformed",
            LinkVerdict::Banned { .. } => "banned",
            LinkVerdict::UnknownHost { .. } => "unknown_host",
            LinkVerdict::AlreadyQueued(_) => "already_queued",
            LinkVerdict::AlreadyKnown(_) => "already_known",
        };
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Prints run statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Cycles: {}", stats.cycles);
    println!("  Pages crawled: {}", stats.pages_crawled);
    println!("  Pages rejected: {}", stats.pages_rejected);
    println!("  Duration: {}s", stats.duration().num_seconds());
    if stats.stopped_at_limit {
        println!("  Stopped at page limit");
    }
    println!();

    println!("Links:");
    println!("  Discovered: {}", stats.links_discovered);
    println!("  Enqueued: {}", stats.links_enqueued);
    println!("  Dropped: {}", stats.links_dropped());
    println!();

    if stats.hosts_probed > 0 {
        println!("Unknown Hosts:");
        println!("  Probed: {}", stats.hosts_probed);
        println!("  Serving robots.txt: {}", stats.hosts_with_robots);
        println!();
    }

    if !stats.rejections.is_empty() {
        println!("Rejections:");
        let mut counts: Vec<_> = stats.rejections.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));

        for (reason, count) in counts {
            println!("  {}: {}", reason, count);
        }
        println!();
    }
}

/// Row counts for every store table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub counts: BTreeMap<Table, u64>,
}

impl StoreSummary {
    /// Counts rows in every table
    pub fn load(store: &dyn FrontierStore) -> StorageResult<Self> {
        let mut counts = BTreeMap::new();
        for table in Table::all() {
            counts.insert(table, store.count(table)?);
        }
        Ok(Self { counts })
    }

    pub fn count(&self, table: Table) -> u64 {
        self.counts.get(&table).copied().unwrap_or(0)
    }
}

/// Prints store row counts to stdout
pub fn print_store_summary(summary: &StoreSummary) {
    println!("=== Store Contents ===\n");
    for (table, count) in &summary.counts {
        println!("  {:<20} {}", table.name(), count);
    }
}
