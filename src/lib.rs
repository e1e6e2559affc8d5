//! Handmade Crawler: the decision core of a polite, incremental web crawler
//!
//! This crate decides, for each URL waiting in the frontier, whether and when it
//! may be fetched. It parses robots.txt into per-agent rule sets, gates newly
//! discovered hostnames through an approved/banned admission policy, and drives a
//! sequential crawl loop over an externally stored queue.

pub mod admission;
pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
///
/// Everything in here halts a run. Expected decision outcomes such as a
/// disallowed path or a banned hostname are reported through
/// [`crawler::RejectReason`] instead.
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Malformed robots.txt for {hostname}: {source}")]
    MalformedRobots {
        hostname: String,
        source: RobotsError,
    },

    #[error("Transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Errors raised while parsing robots.txt text
///
/// Unrecognized directives and stray lines are tolerated; only numeric and
/// structured values are parsed strictly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RobotsError {
    #[error("line {line}: crawl-delay value '{value}' is not a number")]
    InvalidCrawlDelay { line: usize, value: String },

    #[error("line {line}: content-signal entry '{entry}' is missing '='")]
    MalformedContentSignal { line: usize, entry: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid hostname pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing hostname in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use admission::{classify_hostname, Admission, HostLists};
pub use config::Config;
pub use crawler::{CrawlEngine, CycleReport, FrontierMutation};
pub use robots::{parse_robots, RobotsDocument, UserAgentRuleSet};
pub use state::FrontierState;
pub use crate::url::{classify_link, normalize_link, LinkClass};
