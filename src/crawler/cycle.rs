//! Crawl cycle types
//!
//! One cycle processes exactly one frontier URL. Everything the cycle decided
//! is captured in a [`CycleReport`] so callers (and tests) can inspect the
//! decisions without going back to the store.

use crate::state::FrontierState;
use crate::{RobotsError, UrlError};
use std::fmt;

/// Phases of a crawl cycle, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CyclePhase {
    /// Obtain the robots document for the URL's hostname
    FetchRobots,
    /// Sleep the crawl delay
    PolitenessWait,
    /// Apply the disallow rules
    PermissionCheck,
    /// GET the page
    FetchPage,
    /// Normalize, admit and dedup discovered links
    ExpandLinks,
    /// Record the URL as known
    Complete,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FetchRobots => "fetch-robots",
            Self::PolitenessWait => "politeness-wait",
            Self::PermissionCheck => "permission-check",
            Self::FetchPage => "fetch-page",
            Self::ExpandLinks => "expand-links",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Why a frontier URL was dropped without being recorded as known
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The URL contains a disallowed prefix of the `*` group
    Disallowed { prefix: String },
    /// The host served a robots.txt that failed to parse
    MalformedRobots(RobotsError),
    /// The page answered with a non-2xx status
    HttpStatus(u16),
    /// The page is not HTML
    NotHtml { content_type: Option<String> },
    /// The host could not be reached
    Unreachable { reason: String },
    /// The queued string is not an absolute URL with a host
    InvalidUrl(UrlError),
}

impl RejectReason {
    /// Short, stable label used for statistics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Disallowed { .. } => "disallowed",
            Self::MalformedRobots(_) => "malformed_robots",
            Self::HttpStatus(_) => "http_status",
            Self::NotHtml { .. } => "not_html",
            Self::Unreachable { .. } => "unreachable",
            Self::InvalidUrl(_) => "invalid_url",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disallowed { prefix } => write!(f, "disallowed by '{}'", prefix),
            Self::MalformedRobots(err) => write!(f, "malformed robots.txt ({})", err),
            Self::HttpStatus(status) => write!(f, "HTTP {}", status),
            Self::NotHtml { content_type } => write!(
                f,
                "not HTML ({})",
                content_type.as_deref().unwrap_or("no content-type")
            ),
            Self::Unreachable { reason } => write!(f, "unreachable ({})", reason),
            Self::InvalidUrl(err) => write!(f, "invalid URL ({})", err),
        }
    }
}

/// How a cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The page was fetched and its links expanded
    Crawled { links_enqueued: usize },
    /// The URL was dequeued without being recorded
    Rejected(RejectReason),
}

impl CycleOutcome {
    /// Frontier state the URL ends the cycle in
    pub fn final_state(&self) -> FrontierState {
        match self {
            Self::Crawled { .. } => FrontierState::Known,
            Self::Rejected(_) => FrontierState::Rejected,
        }
    }

    pub fn is_crawled(&self) -> bool {
        matches!(self, Self::Crawled { .. })
    }
}

/// A single write against the store, applied in order at the end of a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontierMutation {
    /// Insert a URL into `queue`
    Enqueue(String),
    /// Upsert a URL into `known_pages`
    MarkKnown(String),
    /// Delete a URL from `queue`
    Dequeue(String),
    /// Upsert a hostname into `has_robots`
    RecordHasRobots(String),
}

/// What happened to one discovered href
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkVerdict {
    /// Queued for a later cycle
    Enqueued(String),
    /// Carries a fragment
    Fragment,
    /// Points at an XML document
    Xml,
    /// Could not be resolved into an absolute URL
    Malformed,
    /// Host is on the banned list
    Banned { hostname: String },
    /// Host is unreviewed; `has_robots` tells whether its probe succeeded
    UnknownHost { hostname: String, has_robots: bool },
    /// Already waiting in the queue
    AlreadyQueued(String),
    /// Already processed
    AlreadyKnown(String),
}

impl LinkVerdict {
    pub fn is_enqueued(&self) -> bool {
        matches!(self, Self::Enqueued(_))
    }
}

/// An href found on the page and the verdict reached for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    pub href: String,
    pub verdict: LinkVerdict,
}

/// Everything one cycle decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// The frontier URL this cycle processed
    pub url: String,
    pub outcome: CycleOutcome,
    /// Store writes, in the order they were applied
    pub mutations: Vec<FrontierMutation>,
    /// Every href found on the page, in document order
    pub links: Vec<DiscoveredLink>,
    /// Crawl delay waited before the permission check, in seconds
    pub delay_seconds: u64,
}

impl CycleReport {
    /// URLs this cycle added to the queue
    pub fn enqueued(&self) -> impl Iterator<Item = &str> {
        self.mutations.iter().filter_map(|mutation| match mutation {
            FrontierMutation::Enqueue(url) => Some(url.as_str()),
            _ => None,
        })
    }
}
