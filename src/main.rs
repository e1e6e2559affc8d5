//! Handmade Crawler main entry point
//!
//! This is the command-line interface for the handmade crawler.

use anyhow::{Context, Result};
use clap::Parser;
use handmade_crawler::config::{load_config_with_hash, validate_seed, Config};
use handmade_crawler::crawler::{CrawlEngine, EngineSettings, HtmlLinkExtractor, HttpFetcher};
use handmade_crawler::output::{print_statistics, print_store_summary, StoreSummary};
use handmade_crawler::storage::{open_store, sync_from_config, FrontierStore, MemoryStore, Table};
use handmade_crawler::CrawlerError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Handmade Crawler: a polite, incremental web crawler
///
/// Crawls the URLs queued in its database while respecting robots.txt
/// crawl delays and disallow rules, and queues links only for approved
/// hostnames.
#[derive(Parser, Debug)]
#[command(name = "handmade-crawler")]
#[command(version)]
#[command(about = "A polite, incremental web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Additional seed URL to queue (repeatable)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Stop after this many pages (overrides the config file)
    #[arg(long, value_name = "N")]
    max_pages: Option<u64>,

    /// Validate config and show what would be queued without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show row counts from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    for seed in &cli.seeds {
        validate_seed(seed).with_context(|| format!("Invalid --seed {}", seed))?;
    }

    if let Some(max_pages) = cli.max_pages {
        anyhow::ensure!(max_pages > 0, "--max-pages must be at least 1");
        config.crawler.max_pages = Some(max_pages);
    }

    if cli.dry_run {
        handle_dry_run(&config, &cli.seeds)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(&config, &cli.seeds, cli.quiet).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("handmade_crawler=info,warn"),
            1 => EnvFilter::new("handmade_crawler=debug,info"),
            2 => EnvFilter::new("handmade_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: syncs into a scratch copy of the store
fn handle_dry_run(config: &Config, extra_seeds: &[String]) -> Result<()> {
    println!("=== Handmade Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  User agent: {}", config.crawler.user_agent);
    println!("  Fallback crawl delay: {}s", config.crawler.fallback_crawl_delay);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Link resolution: {:?}", config.crawler.link_resolution);
    println!(
        "  Robots cache: {}",
        if config.crawler.cache_robots {
            format!("{}s", config.crawler.robots_cache_ttl)
        } else {
            "disabled".to_string()
        }
    );
    println!("  Malformed robots.txt: {:?}", config.crawler.malformed_robots);
    match config.crawler.max_pages {
        Some(limit) => println!("  Max pages: {}", limit),
        None => println!("  Max pages: unlimited"),
    }

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nApproved Hostnames ({}):", config.hostnames.approved.len());
    for hostname in &config.hostnames.approved {
        println!("  - {}", hostname);
    }

    println!("\nBanned Hostnames ({}):", config.hostnames.banned.len());
    for hostname in &config.hostnames.banned {
        println!("  - {}", hostname);
    }

    let mut scratch = MemoryStore::new();
    let database = Path::new(&config.storage.database_path);
    if database.exists() {
        let store = open_store(database).context("Failed to open database")?;
        for table in Table::all() {
            scratch = scratch.with_rows(table, store.select_all(table)?);
        }
    }

    let summary = sync_from_config(&mut scratch, config, extra_seeds)?;
    let queue = scratch.select_all(Table::Queue)?;

    println!("\nQueue after sync ({}):", queue.len());
    for url in queue.iter().take(20) {
        println!("  * {}", url);
    }
    if queue.len() > 20 {
        println!("  ... and {} more", queue.len() - 20);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would queue {} new seed URLs ({} already queued or known)",
        summary.seeds_queued, summary.seeds_skipped
    );

    Ok(())
}

/// Handles the --stats mode: shows row counts from the database
fn handle_stats(config: &Config) -> Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let store = open_store(Path::new(&config.storage.database_path))
        .context("Failed to open database")?;
    let summary = StoreSummary::load(&store)?;
    print_store_summary(&summary);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, extra_seeds: &[String], quiet: bool) -> Result<()> {
    let mut store = open_store(Path::new(&config.storage.database_path))
        .context("Failed to open database")?;
    sync_from_config(&mut store, config, extra_seeds)?;

    let fetcher = HttpFetcher::new(
        &config.crawler.user_agent,
        Duration::from_secs(config.crawler.request_timeout),
    )
    .map_err(CrawlerError::from)
    .context("Failed to build HTTP client")?;

    let mut engine = CrawlEngine::from_store(
        fetcher,
        HtmlLinkExtractor::new(),
        store,
        EngineSettings::from_config(&config.crawler),
    )?;

    match engine.run().await {
        Ok(stats) => {
            tracing::info!("Crawl completed successfully");
            if !quiet {
                print_statistics(&stats);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
