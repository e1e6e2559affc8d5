//! Per-run robots.txt caching
//!
//! Lookups are cached per hostname for the lifetime of one crawl run, with an
//! expiry so that very long runs still pick up robots.txt changes.

use crate::robots::RobotsDocument;
use crate::RobotsError;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// What a robots.txt lookup for a hostname produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotsOutcome {
    /// robots.txt was fetched and parsed
    Parsed(RobotsDocument),

    /// No robots.txt exists, or the host could not be reached
    Missing,

    /// robots.txt was fetched but failed strict parsing
    Malformed(RobotsError),
}

impl RobotsOutcome {
    /// Returns the document that governs the host, if one can be derived
    ///
    /// A missing robots.txt yields the permissive document with the fallback
    /// delay. A malformed one yields nothing; the caller decides what to do.
    pub fn effective_document(&self, fallback_delay: u64) -> Option<RobotsDocument> {
        match self {
            Self::Parsed(document) => Some(document.clone()),
            Self::Missing => Some(RobotsDocument::permissive(fallback_delay)),
            Self::Malformed(_) => None,
        }
    }
}

/// Cached robots.txt lookup for a hostname
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The lookup outcome
    pub outcome: RobotsOutcome,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Creates a new CachedRobots stamped with the current time
    pub fn new(outcome: RobotsOutcome) -> Self {
        Self {
            outcome,
            fetched_at: Utc::now(),
        }
    }

    /// Returns the age of the cached lookup
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }

    /// Checks if the cached lookup is older than `ttl`
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.age() > ttl
    }
}

/// Robots lookups keyed by hostname
#[derive(Debug)]
pub struct RobotsCache {
    entries: HashMap<String, CachedRobots>,
    ttl: Duration,
    enabled: bool,
}

impl RobotsCache {
    /// Creates a cache whose entries expire after `ttl`
    ///
    /// # Arguments
    ///
    /// * `ttl` - How long a lookup stays fresh
    /// * `enabled` - When false, every lookup misses and robots.txt is
    ///   re-fetched each cycle
    pub fn new(ttl: Duration, enabled: bool) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            enabled,
        }
    }

    /// Returns a fresh cached outcome for `hostname`, if any
    pub fn get(&self, hostname: &str) -> Option<&RobotsOutcome> {
        if !self.enabled {
            return None;
        }

        self.entries
            .get(hostname)
            .filter(|cached| !cached.is_stale(self.ttl))
            .map(|cached| &cached.outcome)
    }

    /// Stores the outcome of a fresh lookup
    pub fn insert(&mut self, hostname: &str, outcome: RobotsOutcome) {
        if self.enabled {
            self.entries
                .insert(hostname.to_string(), CachedRobots::new(outcome));
        }
    }

    /// Number of hostnames currently cached (fresh or stale)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
