//! Fetch orchestration across the source registry.
//!
//! Sources are processed one at a time, in registry order. Each source runs
//! through its adapter, is deduplicated by title, and then passes through the
//! recency filter. A failing source is logged and recorded as
//! `"<source title> (<error>)"`; it never stops the sources after it. Only a
//! run in which no source succeeds is an error.

use crate::adapters::feed::{FeedAdapter, FeedClient};
use crate::adapters::scrape::ScrapeAdapter;
use crate::adapters::{AdapterKind, Resolver};
use crate::browser::Browser;
use crate::config::RecencyConfig;
use crate::error::{FetchError, RunError};
use crate::merge::dedup_by_title;
use crate::models::{Article, SourceDescriptor};
use crate::recency;
use crate::scrapers::window;
use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::{error, info, instrument, warn};

/// Outcome of fetching every source once.
#[derive(Debug, Default)]
pub struct Harvest {
    /// Filtered articles from all successful sources, in registry order.
    pub articles: Vec<Article>,
    /// One `"<title> (<reason>)"` entry per failed source.
    pub failures: Vec<String>,
    /// Number of sources that returned at least one item.
    pub succeeded: usize,
}

/// Runs every source through its adapter.
pub struct Harvester<F, B> {
    feeds: FeedAdapter<F>,
    scraper: ScrapeAdapter<B>,
    resolver: Resolver,
    recency: RecencyConfig,
}

impl<F: FeedClient, B: Browser> Harvester<F, B> {
    pub fn new(feeds: FeedAdapter<F>, scraper: ScrapeAdapter<B>, recency: RecencyConfig) -> Self {
        Self {
            feeds,
            scraper,
            resolver: Resolver,
            recency,
        }
    }

    /// Fetch every source using the current date and time.
    pub async fn harvest(&self, sources: &[SourceDescriptor]) -> Result<Harvest, RunError> {
        self.collect(sources, Local::now().date_naive(), None).await
    }

    /// Fetch every source; `today` drives issue windows, `now` the recency filter.
    pub async fn harvest_at(
        &self,
        sources: &[SourceDescriptor],
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Harvest, RunError> {
        self.collect(sources, today, Some(now)).await
    }

    /// # Errors
    ///
    /// [`RunError::AllSourcesFailed`] when not a single source succeeded.
    #[instrument(level = "info", skip_all, fields(sources = sources.len()))]
    async fn collect(
        &self,
        sources: &[SourceDescriptor],
        today: NaiveDate,
        now: Option<DateTime<Utc>>,
    ) -> Result<Harvest, RunError> {
        let mut harvest = Harvest::default();

        for source in sources {
            match self.fetch_source(source, today).await {
                Ok(articles) => {
                    let fetched = articles.len();
                    let unique = dedup_by_title(articles);
                    let kept = recency::apply(&self.recency, &source.id, unique, now);
                    info!(
                        source = %source.id,
                        fetched,
                        kept = kept.len(),
                        "Source fetched"
                    );
                    harvest.succeeded += 1;
                    harvest.articles.extend(kept);
                }
                Err(e) => {
                    error!(source = %source.id, title = %source.title, error = %e, "Source failed");
                    harvest.failures.push(format!("{} ({})", source.title, e));
                }
            }
        }

        if harvest.succeeded == 0 {
            error!(
                failures = harvest.failures.len(),
                "No articles fetched from any source"
            );
            return Err(RunError::AllSourcesFailed {
                failures: harvest.failures,
            });
        }

        info!(
            succeeded = harvest.succeeded,
            failed = harvest.failures.len(),
            articles = harvest.articles.len(),
            "Harvest complete"
        );
        Ok(harvest)
    }

    /// Fetch all listing URLs of one source and concatenate the results.
    ///
    /// A failing URL is skipped as long as another URL of the same source
    /// yields items; otherwise the last error (or [`FetchError::Empty`]) is
    /// returned.
    async fn fetch_source(
        &self,
        source: &SourceDescriptor,
        today: NaiveDate,
    ) -> Result<Vec<Article>, FetchError> {
        let urls = window::listing_urls(&source.url, today);
        let mut collected = Vec::new();
        let mut last_error = None;

        for url in &urls {
            let result = match self
                .resolver
                .resolve(source, url, self.scraper.strategies())
            {
                AdapterKind::Feed => self.feeds.fetch(source, url).await,
                AdapterKind::Scrape => self.scraper.fetch(source, url).await,
            };
            match result {
                Ok(articles) => collected.extend(articles),
                Err(e) => {
                    if urls.len() > 1 {
                        warn!(source = %source.id, %url, error = %e, "Listing URL failed");
                    }
                    last_error = Some(e);
                }
            }
        }

        if collected.is_empty() {
            return Err(last_error.unwrap_or(FetchError::Empty));
        }
        Ok(collected)
    }
}
