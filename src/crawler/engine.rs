//! Crawl decision engine
//!
//! The engine drives one frontier URL at a time through the phases of
//! [`CyclePhase`]. All side effects go through injected collaborators: a
//! [`Fetcher`] for HTTP, a [`LinkExtractor`] for hrefs and a
//! [`FrontierStore`] for the queue, known pages and hostname tables.

use crate::admission::{Admission, HostLists};
use crate::config::{CrawlerConfig, MalformedRobotsPolicy};
use crate::crawler::cycle::{
    CycleOutcome, CyclePhase, CycleReport, DiscoveredLink, FrontierMutation, LinkVerdict,
    RejectReason,
};
use crate::crawler::extract::LinkExtractor;
use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::output::{verdict_counts, RunStatistics};
use crate::robots::{parse_robots, robots_url, RobotsCache, RobotsDocument, RobotsOutcome};
use crate::state::FrontierState;
use crate::storage::{FrontierStore, Table};
use crate::url::{extract_hostname, parse_page_url, LinkClass, LinkNormalizer, LinkResolution};
use crate::{CrawlerError, Result};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};
use url::Url;

/// Longest politeness wait honored for a single host, in seconds
pub const MAX_CRAWL_DELAY: u64 = 3600;

/// Knobs the engine reads on every cycle
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Crawl delay (seconds) for hosts without a robots.txt
    pub fallback_crawl_delay: u64,
    pub link_resolution: LinkResolution,
    pub malformed_robots: MalformedRobotsPolicy,
    pub cache_robots: bool,
    pub robots_cache_ttl: chrono::Duration,
    /// Stop after this many cycles
    pub max_pages: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

impl EngineSettings {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            fallback_crawl_delay: config.fallback_crawl_delay,
            link_resolution: config.link_resolution,
            malformed_robots: config.malformed_robots,
            cache_robots: config.cache_robots,
            robots_cache_ttl: chrono::Duration::seconds(
                i64::try_from(config.robots_cache_ttl)
                    .unwrap_or(i64::MAX)
                    .min(i64::MAX / 1000),
            ),
            max_pages: config.max_pages,
        }
    }
}

/// Working state of the cycle in progress
struct Cycle {
    url: String,
    page_url: Url,
    hostname: String,
    document: Option<RobotsDocument>,
    body: Option<String>,
    delay_seconds: u64,
    mutations: Vec<FrontierMutation>,
    links: Vec<DiscoveredLink>,
    links_enqueued: usize,
}

impl Cycle {
    fn new(url: String, page_url: Url, hostname: String) -> Self {
        Self {
            url,
            page_url,
            hostname,
            document: None,
            body: None,
            delay_seconds: 0,
            mutations: Vec::new(),
            links: Vec::new(),
            links_enqueued: 0,
        }
    }
}

/// Result of running one phase
enum Transition {
    Advance(CyclePhase),
    Reject(RejectReason),
    Finish,
}

/// Sequential crawl engine
///
/// One URL is fully processed before the next is pulled. The queue and the
/// known-page set are re-read from the store at the start of every cycle.
pub struct CrawlEngine<F, E, S> {
    fetcher: F,
    extractor: E,
    store: S,
    hosts: HostLists,
    normalizer: LinkNormalizer,
    robots: RobotsCache,
    probes: HashMap<String, bool>,
    settings: EngineSettings,
    stats: RunStatistics,
}

impl<F, E, S> CrawlEngine<F, E, S>
where
    F: Fetcher,
    E: LinkExtractor,
    S: FrontierStore,
{
    /// Creates an engine with explicit hostname lists
    pub fn new(fetcher: F, extractor: E, store: S, hosts: HostLists, settings: EngineSettings) -> Self {
        Self {
            fetcher,
            extractor,
            store,
            hosts,
            normalizer: LinkNormalizer::new(settings.link_resolution),
            robots: RobotsCache::new(settings.robots_cache_ttl, settings.cache_robots),
            probes: HashMap::new(),
            settings,
            stats: RunStatistics::new(),
        }
    }

    /// Creates an engine, loading the hostname lists from `store`
    pub fn from_store(fetcher: F, extractor: E, store: S, settings: EngineSettings) -> Result<Self> {
        let hosts = HostLists::load(&store)?;
        info!(
            "Loaded {} approved and {} banned hostnames",
            hosts.approved().len(),
            hosts.banned().len()
        );
        Ok(Self::new(fetcher, extractor, store, hosts, settings))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }

    /// Processes cycles until the queue is empty or the page limit is hit
    pub async fn run(&mut self) -> Result<RunStatistics> {
        self.stats = RunStatistics::new();
        info!("Starting crawl");

        loop {
            if let Some(limit) = self.settings.max_pages {
                if self.stats.cycles >= limit {
                    let remaining = self.store.count(Table::Queue)?;
                    if remaining > 0 {
                        info!("Reached page limit of {} with {} URLs still queued", limit, remaining);
                        self.stats.stopped_at_limit = true;
                    }
                    break;
                }
            }

            if self.process_next().await?.is_none() {
                info!("Queue is empty");
                break;
            }
        }

        self.stats.finish();
        info!(
            "Crawl finished: {} crawled, {} rejected, {} links enqueued",
            self.stats.pages_crawled, self.stats.pages_rejected, self.stats.links_enqueued
        );
        Ok(self.stats.clone())
    }

    /// Runs one cycle on the oldest queued URL
    ///
    /// # Returns
    ///
    /// * `Ok(Some(CycleReport))` - A URL was processed
    /// * `Ok(None)` - The queue is empty
    /// * `Err(CrawlerError)` - A fatal error; nothing from this cycle was written
    pub async fn process_next(&mut self) -> Result<Option<CycleReport>> {
        let queue = self.store.select_all(Table::Queue)?;
        let Some(url) = queue.first().cloned() else {
            return Ok(None);
        };
        let mut queued: HashSet<String> = queue.iter().map(|row| dedup_key(row)).collect();
        let known: HashSet<String> = self
            .store
            .select_all(Table::KnownPages)?
            .iter()
            .map(|row| dedup_key(row))
            .collect();

        debug!("{}: {} -> {}", url, FrontierState::Queued, FrontierState::InFlight);

        let (page_url, hostname) = match parse_page_url(&url) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Dropping unparseable queue entry {}: {}", url, e);
                let outcome = CycleOutcome::Rejected(RejectReason::InvalidUrl(e));
                return self
                    .finish(url, outcome, Vec::new(), Vec::new(), 0)
                    .map(Some);
            }
        };

        let mut cycle = Cycle::new(url, page_url, hostname);
        let mut phase = CyclePhase::FetchRobots;

        let outcome = loop {
            trace!("{}: entering {}", cycle.url, phase);
            let transition = match phase {
                CyclePhase::FetchRobots => self.fetch_robots(&mut cycle).await?,
                CyclePhase::PolitenessWait => self.politeness_wait(&mut cycle).await,
                CyclePhase::PermissionCheck => self.permission_check(&cycle),
                CyclePhase::FetchPage => self.fetch_page(&mut cycle).await?,
                CyclePhase::ExpandLinks => self.expand_links(&mut cycle, &mut queued, &known).await?,
                CyclePhase::Complete => {
                    // Recorded under the same serialization discovered links are compared by
                    let key = cycle.page_url.to_string();
                    cycle.mutations.push(FrontierMutation::MarkKnown(key));
                    Transition::Finish
                }
            };

            match transition {
                Transition::Advance(next) => phase = next,
                Transition::Reject(reason) => {
                    info!("Skipping {}: {}", cycle.url, reason);
                    break CycleOutcome::Rejected(reason);
                }
                Transition::Finish => {
                    break CycleOutcome::Crawled {
                        links_enqueued: cycle.links_enqueued,
                    }
                }
            }
        };

        let Cycle {
            url,
            mutations,
            links,
            delay_seconds,
            ..
        } = cycle;
        self.finish(url, outcome, mutations, links, delay_seconds)
            .map(Some)
    }

    /// Dequeues the URL, applies the cycle's mutations and builds the report
    fn finish(
        &mut self,
        url: String,
        outcome: CycleOutcome,
        mut mutations: Vec<FrontierMutation>,
        links: Vec<DiscoveredLink>,
        delay_seconds: u64,
    ) -> Result<CycleReport> {
        let final_state = outcome.final_state();
        debug_assert!(FrontierState::InFlight.can_transition_to(final_state));

        mutations.push(FrontierMutation::Dequeue(url.clone()));
        self.apply(&mutations)?;
        debug!("{}: {} -> {}", url, FrontierState::InFlight, final_state);

        let report = CycleReport {
            url,
            outcome,
            mutations,
            links,
            delay_seconds,
        };
        if !report.links.is_empty() {
            debug!("{}: link verdicts {:?}", report.url, verdict_counts(&report));
        }
        self.stats.record(&report);
        Ok(report)
    }

    fn apply(&mut self, mutations: &[FrontierMutation]) -> Result<()> {
        for mutation in mutations {
            match mutation {
                // Another writer may have queued the same URL since the snapshot
                FrontierMutation::Enqueue(url) => self.store.upsert(Table::Queue, url)?,
                FrontierMutation::MarkKnown(url) => self.store.upsert(Table::KnownPages, url)?,
                FrontierMutation::Dequeue(url) => self.store.delete(Table::Queue, url)?,
                FrontierMutation::RecordHasRobots(hostname) => {
                    self.store.upsert(Table::HasRobots, hostname)?
                }
            }
        }
        Ok(())
    }

    async fn fetch_robots(&mut self, cycle: &mut Cycle) -> Result<Transition> {
        let cached = self.robots.get(&cycle.hostname).cloned();
        let outcome = match cached {
            Some(outcome) => {
                trace!("robots.txt cache hit for {}", cycle.hostname);
                outcome
            }
            None => {
                let outcome = self.lookup_robots(&cycle.page_url).await?;
                self.robots.insert(&cycle.hostname, outcome.clone());
                outcome
            }
        };

        match outcome {
            RobotsOutcome::Malformed(source) => match self.settings.malformed_robots {
                MalformedRobotsPolicy::Abort => {
                    error!("Malformed robots.txt for {}: {}", cycle.hostname, source);
                    Err(CrawlerError::MalformedRobots {
                        hostname: cycle.hostname.clone(),
                        source,
                    })
                }
                MalformedRobotsPolicy::SkipUrl => {
                    Ok(Transition::Reject(RejectReason::MalformedRobots(source)))
                }
            },
            outcome => {
                cycle.document = outcome.effective_document(self.settings.fallback_crawl_delay);
                Ok(Transition::Advance(CyclePhase::PolitenessWait))
            }
        }
    }

    /// GETs `{origin}/robots.txt` for a page
    async fn lookup_robots(&self, page_url: &Url) -> Result<RobotsOutcome> {
        let Some(location) = robots_url(page_url) else {
            return Ok(RobotsOutcome::Missing);
        };

        match self.fetcher.fetch(&location).await {
            Ok(response) if response.is_success() => match parse_robots(&response.body) {
                Ok(document) => {
                    debug!("Parsed {} ({} agents)", location, document.agents().len());
                    Ok(RobotsOutcome::Parsed(document))
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}", location, e);
                    Ok(RobotsOutcome::Malformed(e))
                }
            },
            Ok(response) => {
                debug!("No robots.txt at {} (HTTP {})", location, response.status);
                Ok(RobotsOutcome::Missing)
            }
            Err(FetchError::Unreachable { reason, .. }) => {
                warn!("robots.txt unreachable at {}: {}", location, reason);
                Ok(RobotsOutcome::Missing)
            }
            Err(FetchError::Transport { url, reason }) => {
                error!("Transport failure fetching {}: {}", url, reason);
                Err(CrawlerError::Transport { url, reason })
            }
        }
    }

    async fn politeness_wait(&self, cycle: &mut Cycle) -> Transition {
        let delay = cycle
            .document
            .as_ref()
            .and_then(RobotsDocument::wildcard_rules)
            .map(|rules| rules.crawl_delay_seconds())
            .unwrap_or(0);
        let delay = if delay > MAX_CRAWL_DELAY {
            warn!(
                "{} asks for a {}s crawl delay; waiting {}s",
                cycle.hostname, delay, MAX_CRAWL_DELAY
            );
            MAX_CRAWL_DELAY
        } else {
            delay
        };

        cycle.delay_seconds = delay;
        if delay > 0 {
            debug!("Waiting {}s before {}", delay, cycle.url);
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }

        Transition::Advance(CyclePhase::PermissionCheck)
    }

    fn permission_check(&self, cycle: &Cycle) -> Transition {
        let matched = cycle
            .document
            .as_ref()
            .and_then(RobotsDocument::wildcard_rules)
            .and_then(|rules| rules.first_disallow_match(&cycle.url));

        match matched {
            Some(prefix) => Transition::Reject(RejectReason::Disallowed {
                prefix: prefix.to_string(),
            }),
            None => Transition::Advance(CyclePhase::FetchPage),
        }
    }

    async fn fetch_page(&self, cycle: &mut Cycle) -> Result<Transition> {
        info!("Fetching {}", cycle.url);

        match self.fetcher.fetch(&cycle.url).await {
            Ok(response) if !response.is_success() => {
                Ok(Transition::Reject(RejectReason::HttpStatus(response.status)))
            }
            Ok(response) if !response.is_html() => Ok(Transition::Reject(RejectReason::NotHtml {
                content_type: response.content_type().map(String::from),
            })),
            Ok(response) => {
                cycle.body = Some(response.body);
                Ok(Transition::Advance(CyclePhase::ExpandLinks))
            }
            Err(FetchError::Unreachable { reason, .. }) => {
                warn!("{} is unreachable: {}", cycle.url, reason);
                Ok(Transition::Reject(RejectReason::Unreachable { reason }))
            }
            Err(FetchError::Transport { url, reason }) => {
                error!("Transport failure fetching {}: {}", url, reason);
                Err(CrawlerError::Transport { url, reason })
            }
        }
    }

    async fn expand_links(
        &mut self,
        cycle: &mut Cycle,
        queued: &mut HashSet<String>,
        known: &HashSet<String>,
    ) -> Result<Transition> {
        let body = cycle.body.take().unwrap_or_default();
        let hrefs = self.extractor.extract_hrefs(&body);

        for href in hrefs {
            let verdict = self.judge_link(&href, cycle, queued, known).await?;
            debug!("{} -> {:?}", href, verdict);

            if let LinkVerdict::Enqueued(url) = &verdict {
                queued.insert(url.clone());
                cycle.mutations.push(FrontierMutation::Enqueue(url.clone()));
                cycle.links_enqueued += 1;
            }
            cycle.links.push(DiscoveredLink { href, verdict });
        }

        info!(
            "Expanded {}: {} links, {} enqueued",
            cycle.url,
            cycle.links.len(),
            cycle.links_enqueued
        );
        Ok(Transition::Advance(CyclePhase::Complete))
    }

    /// Normalizes, admits and dedups one href
    async fn judge_link(
        &mut self,
        href: &str,
        cycle: &mut Cycle,
        queued: &HashSet<String>,
        known: &HashSet<String>,
    ) -> Result<LinkVerdict> {
        let link = match self.normalizer.normalize(href, &cycle.page_url, &cycle.hostname) {
            LinkClass::Crawlable(link) => link,
            LinkClass::Fragment => return Ok(LinkVerdict::Fragment),
            LinkClass::Xml => return Ok(LinkVerdict::Xml),
            LinkClass::Malformed => return Ok(LinkVerdict::Malformed),
        };

        let Some(hostname) = extract_hostname(&link) else {
            return Ok(LinkVerdict::Malformed);
        };

        match self.hosts.classify(&hostname) {
            Admission::Banned => Ok(LinkVerdict::Banned { hostname }),
            Admission::Unknown => {
                let has_robots = self.probe(&link, &hostname, &mut cycle.mutations).await?;
                Ok(LinkVerdict::UnknownHost {
                    hostname,
                    has_robots,
                })
            }
            Admission::Approved => {
                let key = link.to_string();
                if queued.contains(&key) {
                    Ok(LinkVerdict::AlreadyQueued(key))
                } else if known.contains(&key) {
                    Ok(LinkVerdict::AlreadyKnown(key))
                } else {
                    Ok(LinkVerdict::Enqueued(key))
                }
            }
        }
    }

    /// Checks once per run whether an unknown host serves a robots.txt
    async fn probe(
        &mut self,
        link: &Url,
        hostname: &str,
        mutations: &mut Vec<FrontierMutation>,
    ) -> Result<bool> {
        if let Some(&has_robots) = self.probes.get(hostname) {
            return Ok(has_robots);
        }

        let has_robots = match robots_url(link) {
            None => false,
            Some(location) => match self.fetcher.fetch(&location).await {
                Ok(response) => response.is_success(),
                Err(FetchError::Unreachable { reason, .. }) => {
                    debug!("Probe of {} failed: {}", location, reason);
                    false
                }
                Err(FetchError::Transport { url, reason }) => {
                    error!("Transport failure probing {}: {}", url, reason);
                    return Err(CrawlerError::Transport { url, reason });
                }
            },
        };

        self.probes.insert(hostname.to_string(), has_robots);
        self.stats.record_probe(has_robots);

        if has_robots {
            info!("Unknown host {} serves robots.txt; recorded for review", hostname);
            mutations.push(FrontierMutation::RecordHasRobots(hostname.to_string()));
        }

        Ok(has_robots)
    }
}

/// Serialized form of a stored URL, or the row itself if it does not parse
///
/// Rows written before seeds were normalized may be spelled differently from
/// the links discovered on pages.
fn dedup_key(row: &str) -> String {
    Url::parse(row)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| row.to_string())
}
