//! # Article Harvest
//!
//! A batch harvester that pulls articles from syndication feeds and scraped
//! listing pages, merges them into a deduplicated JSON corpus, and records
//! the outcome of each run in a daily log.
//!
//! ## Features
//!
//! - RSS 2.0 and Atom feeds, raced against a fixed timeout
//! - Listing-page scraping through pluggable extraction strategies
//!   (arXiv listings, NBER digests, Open Journal Systems issues)
//! - Per-source failure isolation: one bad source never aborts the run
//! - Optional recency window for selected sources
//! - Stable, canonical corpus ordering (source id, then newest first)
//!
//! ## Usage
//!
//! ```sh
//! article_harvest -s data/sources.json -o data/articles.json -r data/run.log
//! ```
//!
//! ## Architecture
//!
//! 1. **Registry**: Load the ordered source list
//! 2. **Harvest**: Fetch each source through its adapter, dedupe and filter
//! 3. **Merge**: Fold new articles into the stored corpus, existing entries win
//! 4. **Output**: Sort and save the corpus, then update the run log

use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod adapters;
mod browser;
mod cli;
mod config;
mod error;
mod merge;
mod models;
mod orchestrator;
mod outputs;
mod pipeline;
mod recency;
mod registry;
mod scrapers;
mod utils;

use adapters::feed::{FeedAdapter, HttpFeedClient};
use adapters::scrape::ScrapeAdapter;
use browser::{HttpBrowser, SessionProfile};
use cli::Cli;
use orchestrator::Harvester;
use pipeline::RunPaths;
use scrapers::StrategyRegistry;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("article_harvest starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.sources, ?args.corpus, ?args.run_log, ?args.config, "Parsed CLI arguments");

    // ---- Load config ----
    let mut config = config::load_config(args.config.as_deref()).await?;
    if let Some(days) = args.recent_days {
        info!(days, "Recency window overridden from the command line");
        config.recency.window_days = days;
    }

    // ---- Wire adapters ----
    let feed_profile = SessionProfile::from_config(&config.browser);
    let feed_client = HttpFeedClient::new(config.timeouts.request(), &feed_profile.user_agent)?;
    let feeds = FeedAdapter::new(feed_client, config.timeouts.feed());

    let strategies = StrategyRegistry::with_defaults();
    info!(strategies = ?strategies.names(), "Registered extraction strategies");
    let scraper = ScrapeAdapter::new(
        HttpBrowser::new(config.timeouts.navigation()),
        strategies,
        config.browser.clone(),
        config.timeouts.clone(),
    );

    let harvester = Harvester::new(feeds, scraper, config.recency.clone());
    let paths = RunPaths {
        sources: PathBuf::from(&args.sources),
        corpus: PathBuf::from(&args.corpus),
        run_log: PathBuf::from(&args.run_log),
    };

    // ---- Run ----
    let summary = pipeline::run(&harvester, &paths, &args.only).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        fetched = summary.fetched,
        added = summary.added,
        total = summary.total,
        failed = summary.failures.len(),
        "Execution complete"
    );

    Ok(())
}
