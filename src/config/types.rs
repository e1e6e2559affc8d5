use crate::url::LinkResolution;
use serde::Deserialize;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// URLs to add to the queue at startup if they are neither queued nor known
    #[serde(default)]
    pub seeds: Vec<String>,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub hostnames: HostnamesConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Value of the User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Courtesy delay (seconds) for hosts without a robots.txt
    #[serde(default = "default_fallback_crawl_delay")]
    pub fallback_crawl_delay: u64,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// How relative hrefs are resolved
    #[serde(default)]
    pub link_resolution: LinkResolution,

    /// Whether robots.txt lookups are cached per hostname for the run
    #[serde(default = "default_true")]
    pub cache_robots: bool,

    /// How long a cached robots.txt lookup stays fresh (seconds)
    #[serde(default = "default_robots_cache_ttl")]
    pub robots_cache_ttl: u64,

    /// What to do when a host serves a robots.txt that fails to parse
    #[serde(default)]
    pub malformed_robots: MalformedRobotsPolicy,

    /// Stop after this many frontier cycles (unlimited when absent)
    #[serde(default)]
    pub max_pages: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            fallback_crawl_delay: default_fallback_crawl_delay(),
            request_timeout: default_request_timeout(),
            link_resolution: LinkResolution::default(),
            cache_robots: true,
            robots_cache_ttl: default_robots_cache_ttl(),
            malformed_robots: MalformedRobotsPolicy::default(),
            max_pages: None,
        }
    }
}

/// Handling of a robots.txt that fails strict parsing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MalformedRobotsPolicy {
    /// Drop the current URL from the frontier and keep crawling
    #[default]
    SkipUrl,
    /// Halt the whole run
    Abort,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Hostname lists synced into the store at startup
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostnamesConfig {
    /// Hostname patterns (e.g., "example.com" or "*.example.com") to approve
    #[serde(default)]
    pub approved: Vec<String>,

    /// Hostname patterns to ban
    #[serde(default)]
    pub banned: Vec<String>,
}

fn default_user_agent() -> String {
    "Handmade_Web_Crawler".to_string()
}

fn default_fallback_crawl_delay() -> u64 {
    3
}

fn default_request_timeout() -> u64 {
    30
}

fn default_robots_cache_ttl() -> u64 {
    24 * 60 * 60
}

fn default_database_path() -> String {
    "./crawler.db".to_string()
}

fn default_true() -> bool {
    true
}
