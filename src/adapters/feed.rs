//! Feed adapter: RSS 2.0 and Atom sources.
//!
//! [`FeedClient`] is the syndication-parsing capability; [`HttpFeedClient`]
//! downloads with `reqwest` and parses with the `rss` crate, falling back to
//! `atom_syndication`. [`FeedAdapter`] races a client call against a timer
//! and maps the items to [`Article`]s.
//!
//! # Cancellation
//!
//! When the timer wins, the in-flight request future is dropped. Dropping
//! aborts the request on a best-effort basis; whatever it would have
//! returned is discarded.

use crate::error::FetchError;
use crate::models::{Article, FeedItem, SourceDescriptor};
use crate::utils::{now_iso, parse_pub_date, strip_html, to_iso, truncate_for_log};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Fetches and parses one feed URL.
pub trait FeedClient {
    async fn fetch_items(&self, url: &str) -> Result<Vec<FeedItem>, FetchError>;
}

/// Normalize a feed date to ISO-8601, keeping unparseable text verbatim.
fn iso_or_raw(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Some(parse_pub_date(s).map(to_iso).unwrap_or_else(|| s.to_string()))
}

fn snippet(html: &str) -> Option<String> {
    let text = strip_html(html);
    (!text.is_empty()).then_some(text)
}

fn rss_items(channel: &rss::Channel) -> Vec<FeedItem> {
    channel
        .items()
        .iter()
        .map(|item| {
            let body = item.content().or(item.description()).unwrap_or_default();
            FeedItem {
                title: item.title().unwrap_or_default().trim().to_string(),
                link: item.link().unwrap_or_default().trim().to_string(),
                content_snippet: snippet(body),
                description: item.description().map(str::to_string),
                published: item.pub_date().and_then(iso_or_raw),
                indexed: item
                    .dublin_core_ext()
                    .and_then(|dc| dc.dates().first())
                    .and_then(|d| iso_or_raw(d)),
            }
        })
        .collect()
}

fn atom_items(feed: &atom_syndication::Feed) -> Vec<FeedItem> {
    feed.entries()
        .iter()
        .map(|entry| {
            let link = entry
                .links()
                .iter()
                .find(|l| l.rel() == "alternate")
                .or_else(|| entry.links().first())
                .map(|l| l.href().to_string())
                .unwrap_or_default();
            let summary = entry.summary().map(|s| s.as_str().to_string());
            let body = entry
                .content()
                .and_then(|c| c.value())
                .map(str::to_string)
                .or_else(|| summary.clone())
                .unwrap_or_default();
            FeedItem {
                title: entry.title().as_str().trim().to_string(),
                link,
                content_snippet: snippet(&body),
                description: summary,
                published: entry.published().map(|d| to_iso(d.to_utc())),
                indexed: Some(to_iso(entry.updated().to_utc())),
            }
        })
        .collect()
}

/// Parse a feed document, trying RSS first and then Atom.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedItem>, FetchError> {
    let rss_err = match rss::Channel::read_from(bytes) {
        Ok(channel) => return Ok(rss_items(&channel)),
        Err(e) => e,
    };
    match atom_syndication::Feed::read_from(bytes) {
        Ok(feed) => Ok(atom_items(&feed)),
        Err(atom_err) => {
            debug!(
                preview = %truncate_for_log(&String::from_utf8_lossy(bytes), 200),
                "Document is neither RSS nor Atom"
            );
            Err(FetchError::Parse(format!("not RSS ({rss_err}) or Atom ({atom_err})")))
        }
    }
}

/// `reqwest`-backed [`FeedClient`].
#[derive(Debug, Clone)]
pub struct HttpFeedClient {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl HttpFeedClient {
    pub fn new(request_timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;
        Ok(Self {
            client,
            request_timeout,
        })
    }
}

impl FeedClient for HttpFeedClient {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_items(&self, url: &str) -> Result<Vec<FeedItem>, FetchError> {
        let timeout = self.request_timeout;
        let to_fetch_error = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout(timeout)
            } else {
                FetchError::Http(e.to_string())
            }
        };

        let response = self.client.get(url).send().await.map_err(to_fetch_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(format!("status {status}")));
        }
        let bytes = response.bytes().await.map_err(to_fetch_error)?;
        parse_feed(&bytes)
    }
}

/// Maps feed items to articles under a race timeout.
#[derive(Debug, Clone)]
pub struct FeedAdapter<F> {
    client: F,
    race_timeout: Duration,
}

impl<F: FeedClient> FeedAdapter<F> {
    pub fn new(client: F, race_timeout: Duration) -> Self {
        Self {
            client,
            race_timeout,
        }
    }

    /// Fetch `url` on behalf of `source`.
    ///
    /// # Errors
    ///
    /// [`FetchError::Timeout`] if the race timer elapses first; otherwise
    /// whatever the client reported.
    #[instrument(level = "info", skip_all, fields(source = %source.id, %url))]
    pub async fn fetch(
        &self,
        source: &SourceDescriptor,
        url: &str,
    ) -> Result<Vec<Article>, FetchError> {
        let items = match tokio::time::timeout(self.race_timeout, self.client.fetch_items(url)).await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout = ?self.race_timeout, "Feed fetch lost the race");
                return Err(FetchError::Timeout(self.race_timeout));
            }
        };

        let fetched_at = now_iso();
        let articles: Vec<Article> = items
            .into_iter()
            .map(|item| to_article(source, item, &fetched_at))
            .collect();
        info!(count = articles.len(), "Fetched feed items");
        Ok(articles)
    }
}

fn to_article(source: &SourceDescriptor, item: FeedItem, fetched_at: &str) -> Article {
    Article {
        id: source.id.clone(),
        title: item.title,
        description: item
            .content_snippet
            .or(item.description)
            .unwrap_or_default(),
        link: item.link,
        pub_date: item
            .published
            .or(item.indexed)
            .unwrap_or_else(|| fetched_at.to_string()),
        source: source.title.clone(),
        category: source.category.clone(),
        author: None,
    }
}
