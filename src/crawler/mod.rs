//! Crawler module: the crawl decision engine and its collaborators
//!
//! This module contains the core crawling logic, including:
//! - The per-URL cycle state machine (`CrawlEngine`)
//! - HTTP fetching behind the `Fetcher` trait
//! - Href extraction behind the `LinkExtractor` trait

mod cycle;
mod engine;
mod extract;
mod fetcher;

pub use cycle::{
    CycleOutcome, CyclePhase, CycleReport, DiscoveredLink, FrontierMutation, LinkVerdict,
    RejectReason,
};
pub use engine::{CrawlEngine, EngineSettings, MAX_CRAWL_DELAY};
pub use extract::{HtmlLinkExtractor, LinkExtractor};
pub use fetcher::{build_http_client, FetchError, FetchResponse, Fetcher, HttpFetcher};
