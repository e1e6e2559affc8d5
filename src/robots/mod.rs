//! Robots.txt handling module
//!
//! This module parses robots.txt into per-agent rule sets and caches the
//! lookup for each hostname during a crawl run. Fetching is done by the crawl
//! engine through its [`Fetcher`](crate::crawler::Fetcher) collaborator.

mod cache;
mod parser;
mod rules;

pub use cache::{CachedRobots, RobotsCache, RobotsOutcome};
pub use parser::parse_robots;
pub use rules::{RobotsDocument, UserAgentRuleSet, WILDCARD_AGENT};

use url::Url;

/// Builds the robots.txt location for the origin of `url`
///
/// # Examples
///
/// ```
/// use handmade_crawler::robots::robots_url;
/// use url::Url;
///
/// let page = Url::parse("https://a.test/deep/page?q=1").unwrap();
/// assert_eq!(robots_url(&page).unwrap(), "https://a.test/robots.txt");
/// ```
pub fn robots_url(url: &Url) -> Option<String> {
    url.join("/robots.txt").ok().map(String::from)
}
