//! Crawl engine scenarios against scripted collaborators
//!
//! All tests run on a paused tokio clock so crawl delays complete instantly
//! while still being measurable.

use crate::support::{engine, engine_with, FakeFetcher};
use handmade_crawler::config::{parse_config, MalformedRobotsPolicy};
use handmade_crawler::crawler::{
    CrawlEngine, CycleOutcome, EngineSettings, FrontierMutation, HtmlLinkExtractor, LinkVerdict,
    RejectReason, MAX_CRAWL_DELAY,
};
use handmade_crawler::storage::{
    sync_from_config, FrontierStore, MemoryStore, StorageResult, Table,
};
use handmade_crawler::url::LinkResolution;
use handmade_crawler::{CrawlerError, RobotsError};
use std::cell::{Cell, RefCell};
use tokio::time::Instant;

fn store(queue: &[&str]) -> MemoryStore {
    MemoryStore::new()
        .with_rows(Table::Queue, queue.iter().copied())
        .with_rows(Table::ApprovedHostnames, ["a.test"])
        .with_rows(Table::BannedHostnames, ["b.test"])
}

fn rows(store: &MemoryStore, table: Table) -> Vec<String> {
    store.select_all(table).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_page_links_are_admitted_and_recorded() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\nDisallow:\n")
        .html(
            "https://a.test/",
            r##"<a href="/x">x</a><a href="https://b.test/y">y</a><a href="#frag">frag</a>"##,
        );
    let mut engine = engine(&fetcher, store(&["https://a.test/"]));

    let report = engine.process_next().await.unwrap().unwrap();

    assert_eq!(report.url, "https://a.test/");
    assert_eq!(report.outcome, CycleOutcome::Crawled { links_enqueued: 1 });
    assert_eq!(
        report.mutations,
        vec![
            FrontierMutation::Enqueue("https://a.test/x".to_string()),
            FrontierMutation::MarkKnown("https://a.test/".to_string()),
            FrontierMutation::Dequeue("https://a.test/".to_string()),
        ]
    );

    let verdicts: Vec<_> = report.links.iter().map(|l| l.verdict.clone()).collect();
    assert_eq!(
        verdicts,
        vec![
            LinkVerdict::Enqueued("https://a.test/x".to_string()),
            LinkVerdict::Banned {
                hostname: "b.test".to_string()
            },
            LinkVerdict::Fragment,
        ]
    );

    // Banned hosts are never probed
    assert_eq!(
        fetcher.requests(),
        vec!["https://a.test/robots.txt", "https://a.test/"]
    );

    let store = engine.into_store();
    assert_eq!(rows(&store, Table::Queue), vec!["https://a.test/x"]);
    assert_eq!(rows(&store, Table::KnownPages), vec!["https://a.test/"]);
}

#[tokio::test(start_paused = true)]
async fn test_disallowed_url_is_dropped_without_fetch() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\nDisallow: /private\n")
        .html("https://a.test/private/page", "<a href=\"/x\">x</a>");
    let mut engine = engine(&fetcher, store(&["https://a.test/private/page"]));

    let report = engine.process_next().await.unwrap().unwrap();

    assert_eq!(
        report.outcome,
        CycleOutcome::Rejected(RejectReason::Disallowed {
            prefix: "/private".to_string()
        })
    );
    assert_eq!(
        report.mutations,
        vec![FrontierMutation::Dequeue(
            "https://a.test/private/page".to_string()
        )]
    );
    assert_eq!(fetcher.request_count("https://a.test/private/page"), 0);

    let store = engine.into_store();
    assert!(rows(&store, Table::Queue).is_empty());
    assert!(rows(&store, Table::KnownPages).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_first_disallow_match_wins() {
    let fetcher = FakeFetcher::new().robots(
        "https://a.test",
        "User-agent: *\nDisallow: /docs\nDisallow: /docs/private\n",
    );
    let mut engine = engine(&fetcher, store(&["https://a.test/docs/private/x"]));

    let report = engine.process_next().await.unwrap().unwrap();
    assert_eq!(
        report.outcome,
        CycleOutcome::Rejected(RejectReason::Disallowed {
            prefix: "/docs".to_string()
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_crawl_delay_is_waited_before_fetch() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\nCrawl-delay: 2.1\n")
        .html("https://a.test/", "<p>no links</p>");
    let mut engine = engine(&fetcher, store(&["https://a.test/"]));

    let start = Instant::now();
    let report = engine.process_next().await.unwrap().unwrap();

    assert_eq!(report.delay_seconds, 3);
    assert!(start.elapsed().as_secs() >= 3);
    assert!(report.outcome.is_crawled());
}

#[tokio::test(start_paused = true)]
async fn test_huge_crawl_delay_is_capped() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\nCrawl-delay: 1e20\n")
        .html("https://a.test/", "<p>no links</p>");
    let mut engine = engine(&fetcher, store(&["https://a.test/"]));

    let start = Instant::now();
    let report = engine.process_next().await.unwrap().unwrap();

    assert_eq!(report.delay_seconds, MAX_CRAWL_DELAY);
    assert!(start.elapsed().as_secs() >= MAX_CRAWL_DELAY);
    assert!(start.elapsed().as_secs() < MAX_CRAWL_DELAY + 60);
    assert!(report.outcome.is_crawled());
}

#[tokio::test(start_paused = true)]
async fn test_missing_robots_uses_fallback_delay() {
    let fetcher = FakeFetcher::new().html("https://a.test/", "<p>hi</p>");
    let settings = EngineSettings {
        fallback_crawl_delay: 5,
        ..EngineSettings::default()
    };
    let mut engine = engine_with(&fetcher, store(&["https://a.test/"]), settings);

    let start = Instant::now();
    let report = engine.process_next().await.unwrap().unwrap();

    assert_eq!(report.delay_seconds, 5);
    assert!(start.elapsed().as_secs() >= 5);
    assert!(report.outcome.is_crawled());
}

#[tokio::test(start_paused = true)]
async fn test_robots_without_wildcard_group_imposes_nothing() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: OtherBot\nDisallow: /\nCrawl-delay: 30\n")
        .html("https://a.test/", "<p>hi</p>");
    let mut engine = engine(&fetcher, store(&["https://a.test/"]));

    let report = engine.process_next().await.unwrap().unwrap();
    assert_eq!(report.delay_seconds, 0);
    assert!(report.outcome.is_crawled());
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_host_drops_url() {
    let fetcher = FakeFetcher::new()
        .unreachable("https://a.test/robots.txt")
        .unreachable("https://a.test/");
    let mut engine = engine(&fetcher, store(&["https://a.test/", "https://a.test/next"]));

    let report = engine.process_next().await.unwrap().unwrap();

    assert!(matches!(
        report.outcome,
        CycleOutcome::Rejected(RejectReason::Unreachable { .. })
    ));
    let store = engine.into_store();
    assert_eq!(rows(&store, Table::Queue), vec!["https://a.test/next"]);
    assert!(rows(&store, Table::KnownPages).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_non_success_and_non_html_are_rejected() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\n")
        .status("https://a.test/broken", 500, "text/html")
        .status("https://a.test/data.json", 200, "application/json");
    let mut engine = engine(
        &fetcher,
        store(&["https://a.test/broken", "https://a.test/data.json"]),
    );

    let first = engine.process_next().await.unwrap().unwrap();
    assert_eq!(
        first.outcome,
        CycleOutcome::Rejected(RejectReason::HttpStatus(500))
    );

    let second = engine.process_next().await.unwrap().unwrap();
    assert_eq!(
        second.outcome,
        CycleOutcome::Rejected(RejectReason::NotHtml {
            content_type: Some("application/json".to_string())
        })
    );

    assert!(engine.process_next().await.unwrap().is_none());
    assert!(rows(engine.store(), Table::KnownPages).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_aborts_without_mutations() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\n")
        .transport_error("https://a.test/");
    let mut engine = engine(&fetcher, store(&["https://a.test/"]));

    let err = engine.process_next().await.unwrap_err();

    assert!(matches!(err, CrawlerError::Transport { .. }));
    assert_eq!(rows(engine.store(), Table::Queue), vec!["https://a.test/"]);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_host_is_probed_once() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\n")
        .robots("https://c.test", "User-agent: *\n")
        .html(
            "https://a.test/",
            r#"<a href="https://c.test/one">1</a>
               <a href="https://c.test/two">2</a>
               <a href="https://d.test/">d</a>"#,
        );
    let mut engine = engine(&fetcher, store(&["https://a.test/"]));

    let report = engine.process_next().await.unwrap().unwrap();

    assert_eq!(report.outcome, CycleOutcome::Crawled { links_enqueued: 0 });
    assert_eq!(fetcher.request_count("https://c.test/robots.txt"), 1);
    assert_eq!(fetcher.request_count("https://d.test/robots.txt"), 1);
    assert_eq!(
        report.links[2].verdict,
        LinkVerdict::UnknownHost {
            hostname: "d.test".to_string(),
            has_robots: false
        }
    );
    assert_eq!(
        report.mutations[0],
        FrontierMutation::RecordHasRobots("c.test".to_string())
    );

    let store = engine.into_store();
    assert_eq!(rows(&store, Table::HasRobots), vec!["c.test"]);
    assert!(rows(&store, Table::Queue).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_dedup_against_queue_known_and_same_page() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\n")
        .html(
            "https://a.test/",
            r#"<a href="/queued">q</a>
               <a href="/known">k</a>
               <a href="/new">n</a>
               <a href="new">n again</a>
               <a href="/">self</a>"#,
        );
    let store = store(&["https://a.test/", "https://a.test/queued"])
        .with_rows(Table::KnownPages, ["https://a.test/known"]);
    let mut engine = engine(&fetcher, store);

    let report = engine.process_next().await.unwrap().unwrap();

    let verdicts: Vec<_> = report.links.iter().map(|l| l.verdict.clone()).collect();
    assert_eq!(
        verdicts,
        vec![
            LinkVerdict::AlreadyQueued("https://a.test/queued".to_string()),
            LinkVerdict::AlreadyKnown("https://a.test/known".to_string()),
            LinkVerdict::Enqueued("https://a.test/new".to_string()),
            LinkVerdict::AlreadyQueued("https://a.test/new".to_string()),
            LinkVerdict::AlreadyQueued("https://a.test/".to_string()),
        ]
    );
    assert_eq!(
        rows(engine.store(), Table::Queue),
        vec!["https://a.test/queued", "https://a.test/new"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_xml_and_malformed_links_are_dropped() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\n")
        .html(
            "https://a.test/",
            r#"<a href="/sitemap.xml">map</a><a href="https://[bad">bad</a>"#,
        );
    let mut engine = engine(&fetcher, store(&["https://a.test/"]));

    let report = engine.process_next().await.unwrap().unwrap();
    let verdicts: Vec<_> = report.links.iter().map(|l| l.verdict.clone()).collect();
    assert_eq!(verdicts, vec![LinkVerdict::Xml, LinkVerdict::Malformed]);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_robots_skips_url_by_default() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\nCrawl-delay: soon\n")
        .html("https://a.test/", "<p>hi</p>");
    let mut engine = engine(&fetcher, store(&["https://a.test/"]));

    let report = engine.process_next().await.unwrap().unwrap();

    assert_eq!(
        report.outcome,
        CycleOutcome::Rejected(RejectReason::MalformedRobots(
            RobotsError::InvalidCrawlDelay {
                line: 2,
                value: "soon".to_string()
            }
        ))
    );
    assert_eq!(fetcher.request_count("https://a.test/"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_robots_can_abort() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\nContent-Signal: search\n");
    let settings = EngineSettings {
        malformed_robots: MalformedRobotsPolicy::Abort,
        ..EngineSettings::default()
    };
    let mut engine = engine_with(&fetcher, store(&["https://a.test/"]), settings);

    let err = engine.process_next().await.unwrap_err();
    assert!(matches!(err, CrawlerError::MalformedRobots { ref hostname, .. } if hostname == "a.test"));
}

#[tokio::test(start_paused = true)]
async fn test_robots_is_cached_per_host() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\n")
        .html("https://a.test/1", "<p>1</p>")
        .html("https://a.test/2", "<p>2</p>");
    let mut engine = engine(&fetcher, store(&["https://a.test/1", "https://a.test/2"]));

    engine.run().await.unwrap();
    assert_eq!(fetcher.request_count("https://a.test/robots.txt"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_robots_refetched_when_cache_disabled() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\n")
        .html("https://a.test/1", "<p>1</p>")
        .html("https://a.test/2", "<p>2</p>");
    let settings = EngineSettings {
        cache_robots: false,
        ..EngineSettings::default()
    };
    let mut engine = engine_with(
        &fetcher,
        store(&["https://a.test/1", "https://a.test/2"]),
        settings,
    );

    engine.run().await.unwrap();
    assert_eq!(fetcher.request_count("https://a.test/robots.txt"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_run_follows_links_until_queue_empty() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\n")
        .html("https://a.test/", r#"<a href="/x">x</a>"#)
        .html("https://a.test/x", r#"<a href="/">home</a>"#);
    let mut engine = engine(&fetcher, store(&["https://a.test/"]));

    let stats = engine.run().await.unwrap();

    assert_eq!(stats.cycles, 2);
    assert_eq!(stats.pages_crawled, 2);
    assert_eq!(stats.links_enqueued, 1);
    assert!(!stats.stopped_at_limit);
    assert!(stats.finished_at.is_some());
    assert_eq!(
        rows(engine.store(), Table::KnownPages),
        vec!["https://a.test/", "https://a.test/x"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_run_stops_at_page_limit() {
    let fetcher = FakeFetcher::new().robots("https://a.test", "User-agent: *\n");
    let settings = EngineSettings {
        max_pages: Some(2),
        ..EngineSettings::default()
    };
    let mut engine = engine_with(
        &fetcher,
        store(&["https://a.test/1", "https://a.test/2", "https://a.test/3"]),
        settings,
    );

    let stats = engine.run().await.unwrap();

    assert_eq!(stats.cycles, 2);
    assert!(stats.stopped_at_limit);
    assert_eq!(rows(engine.store(), Table::Queue), vec!["https://a.test/3"]);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_queue_entry_is_dropped() {
    let fetcher = FakeFetcher::new();
    let mut engine = engine(&fetcher, store(&["not a url"]));

    let report = engine.process_next().await.unwrap().unwrap();

    assert!(matches!(
        report.outcome,
        CycleOutcome::Rejected(RejectReason::InvalidUrl(_))
    ));
    assert!(fetcher.requests().is_empty());
    assert!(rows(engine.store(), Table::Queue).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_standard_resolution_uses_page_path() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\n")
        .html("https://a.test/docs/page", r#"<a href="next">next</a>"#);
    let settings = EngineSettings {
        link_resolution: LinkResolution::Standard,
        ..EngineSettings::default()
    };
    let mut engine = engine_with(&fetcher, store(&["https://a.test/docs/page"]), settings);

    let report = engine.process_next().await.unwrap().unwrap();
    assert_eq!(
        report.enqueued().collect::<Vec<_>>(),
        vec!["https://a.test/docs/next"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_root_relative_resolution_ignores_page_path() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\n")
        .html("https://a.test/docs/page", r#"<a href="next">next</a>"#);
    let mut engine = engine(&fetcher, store(&["https://a.test/docs/page"]));

    let report = engine.process_next().await.unwrap().unwrap();
    assert_eq!(
        report.enqueued().collect::<Vec<_>>(),
        vec!["https://a.test/next"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_seed_spelling_does_not_cause_second_crawl() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\n")
        .html("https://a.test/", r#"<a href="/">home</a><a href="https://A.TEST/">shout</a>"#);
    let mut store = store(&[]);
    let config = parse_config("").unwrap();
    sync_from_config(&mut store, &config, &["https://A.test".to_string()]).unwrap();
    let mut engine = engine(&fetcher, store);

    let stats = engine.run().await.unwrap();

    assert_eq!(stats.pages_crawled, 1);
    assert_eq!(
        fetcher.requests(),
        vec!["https://a.test/robots.txt", "https://a.test/"]
    );
    assert_eq!(rows(engine.store(), Table::KnownPages), vec!["https://a.test/"]);
}

#[tokio::test(start_paused = true)]
async fn test_unnormalized_queue_row_matches_discovered_link() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\n")
        .html("https://a.test", r#"<a href="/">home</a>"#);
    let mut engine = engine(&fetcher, store(&["https://a.test"]));

    let report = engine.process_next().await.unwrap().unwrap();

    assert_eq!(
        report.links[0].verdict,
        LinkVerdict::AlreadyQueued("https://a.test/".to_string())
    );
    assert!(rows(engine.store(), Table::Queue).is_empty());
    assert_eq!(rows(engine.store(), Table::KnownPages), vec!["https://a.test/"]);
    assert!(engine.process_next().await.unwrap().is_none());
}

/// Store that gains a queue row from another writer once the cycle has read the queue
struct ConcurrentWriterStore {
    inner: RefCell<MemoryStore>,
    late_row: &'static str,
    written: Cell<bool>,
}

impl FrontierStore for ConcurrentWriterStore {
    fn select_all(&self, table: Table) -> StorageResult<Vec<String>> {
        let rows = self.inner.borrow().select_all(table)?;
        if table == Table::KnownPages && !self.written.replace(true) {
            self.inner.borrow_mut().insert(Table::Queue, self.late_row)?;
        }
        Ok(rows)
    }

    fn insert(&mut self, table: Table, key: &str) -> StorageResult<()> {
        self.inner.get_mut().insert(table, key)
    }

    fn delete(&mut self, table: Table, key: &str) -> StorageResult<()> {
        self.inner.get_mut().delete(table, key)
    }

    fn upsert(&mut self, table: Table, key: &str) -> StorageResult<()> {
        self.inner.get_mut().upsert(table, key)
    }
}

#[tokio::test(start_paused = true)]
async fn test_link_queued_by_another_writer_mid_cycle() {
    let fetcher = FakeFetcher::new()
        .robots("https://a.test", "User-agent: *\n")
        .html("https://a.test/", r#"<a href="/x">x</a>"#);
    let store = ConcurrentWriterStore {
        inner: RefCell::new(store(&["https://a.test/"])),
        late_row: "https://a.test/x",
        written: Cell::new(false),
    };
    let mut engine = CrawlEngine::from_store(
        fetcher.clone(),
        HtmlLinkExtractor::new(),
        store,
        EngineSettings::default(),
    )
    .unwrap();

    let report = engine.process_next().await.unwrap().unwrap();

    assert_eq!(report.outcome, CycleOutcome::Crawled { links_enqueued: 1 });
    let store = engine.into_store().inner.into_inner();
    assert_eq!(rows(&store, Table::Queue), vec!["https://a.test/x"]);
    assert_eq!(rows(&store, Table::KnownPages), vec!["https://a.test/"]);
}
