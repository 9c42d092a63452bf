//! Page sessions used by the scrape adapter.
//!
//! The scrape adapter only needs a navigate-and-extract service, described by
//! the [`Browser`] and [`BrowserSession`] traits. A session is owned by one
//! fetch and closed by it; sessions are never shared between sources.
//!
//! [`HttpBrowser`] is the production implementation. It renders pages by
//! fetching the document over HTTP with a browser-like header profile and
//! answers DOM queries against the parsed HTML. Bot walls and 403/451
//! responses are reported as [`NavigationError::BlockedByClient`] so the
//! adapter can retry with the full-load strategy.

use crate::config::{BrowserConfig, Viewport};
use crate::error::{FetchError, NavigationError};
use rand::seq::IndexedRandom;
use reqwest::header::{self, HeaderMap, HeaderValue};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Fallback when the configured pool is empty.
pub(crate) const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Markers of interstitial pages that stand in for the requested document.
const BLOCK_MARKERS: &[&str] = &[
    "cf-browser-verification",
    "cf-challenge",
    "attention required! | cloudflare",
    "err_blocked_by_client",
    "captcha-delivery.com",
    "please enable js and disable any ad blocker",
];

/// When a navigation counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// The document has been parsed.
    DomContentLoaded,
    /// The document and all of its subresources have loaded.
    Load,
}

/// Identity a session presents to the sites it visits.
#[derive(Debug, Clone)]
pub struct SessionProfile {
    pub user_agent: String,
    pub viewport: Viewport,
    pub accept_language: String,
}

impl SessionProfile {
    /// Build a profile with a user agent picked at random from the pool.
    pub fn from_config(config: &BrowserConfig) -> Self {
        let user_agent = config
            .user_agents
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        Self {
            user_agent,
            viewport: config.viewport,
            accept_language: config.accept_language.clone(),
        }
    }

    /// Request headers every navigation sends.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        if let Ok(lang) = HeaderValue::from_str(&self.accept_language) {
            headers.insert(header::ACCEPT_LANGUAGE, lang);
        }
        if let Ok(width) = HeaderValue::from_str(&self.viewport.width.to_string()) {
            headers.insert("viewport-width", width);
        }
        headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));
        headers
    }
}

/// Something that can open isolated page sessions.
pub trait Browser {
    type Session: BrowserSession;

    /// Start a fresh session presenting `profile`.
    async fn launch(&self, profile: &SessionProfile) -> Result<Self::Session, FetchError>;
}

/// One isolated page session.
pub trait BrowserSession {
    /// Load `url`, finishing according to `wait`.
    async fn goto(&mut self, url: &str, wait: WaitUntil) -> Result<(), NavigationError>;

    /// The document ready state: `"loading"`, `"interactive"` or `"complete"`.
    async fn ready_state(&self) -> Result<String, FetchError>;

    /// Whether the current document contains an element matching `selector`.
    async fn has_selector(&self, selector: &str) -> Result<bool, FetchError>;

    /// Serialized HTML of the current document.
    async fn content(&self) -> Result<String, FetchError>;

    /// URL of the current document after redirects.
    fn current_url(&self) -> Option<String>;

    /// Tear the session down.
    async fn close(self) -> Result<(), FetchError>;
}

/// HTTP-rendering [`Browser`].
#[derive(Debug, Clone)]
pub struct HttpBrowser {
    navigation_timeout: Duration,
}

impl HttpBrowser {
    pub fn new(navigation_timeout: Duration) -> Self {
        Self { navigation_timeout }
    }
}

impl Browser for HttpBrowser {
    type Session = HttpSession;

    #[instrument(level = "debug", skip_all, fields(user_agent = %profile.user_agent))]
    async fn launch(&self, profile: &SessionProfile) -> Result<HttpSession, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(profile.user_agent.clone())
            .default_headers(profile.headers())
            .timeout(self.navigation_timeout)
            .build()
            .map_err(|e| FetchError::Browser(e.to_string()))?;
        debug!("Launched HTTP session");
        Ok(HttpSession {
            client,
            navigation_timeout: self.navigation_timeout,
            document: None,
            url: None,
        })
    }
}

/// Session state for [`HttpBrowser`].
#[derive(Debug)]
pub struct HttpSession {
    client: reqwest::Client,
    navigation_timeout: Duration,
    document: Option<String>,
    url: Option<String>,
}

fn looks_blocked(body: &str) -> Option<&'static str> {
    let lower = body.to_lowercase();
    BLOCK_MARKERS.iter().copied().find(|m| lower.contains(m))
}

fn origin_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .map(|u| u.origin().ascii_serialization())
        .filter(|o| o != "null")
}

impl BrowserSession for HttpSession {
    #[instrument(level = "debug", skip(self))]
    async fn goto(&mut self, url: &str, wait: WaitUntil) -> Result<(), NavigationError> {
        let mut request = self.client.get(url);
        if wait == WaitUntil::Load {
            if let Some(origin) = origin_of(url) {
                request = request.header(header::REFERER, format!("{origin}/"));
            }
            request = request
                .header(header::CACHE_CONTROL, "no-cache")
                .header(header::PRAGMA, "no-cache");
        }

        let timeout = self.navigation_timeout;
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NavigationError::Timeout(timeout)
            } else {
                NavigationError::Other(e.to_string())
            }
        })?;

        let status = response.status();
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| NavigationError::Other(e.to_string()))?;

        if status.as_u16() == 403 || status.as_u16() == 451 {
            return Err(NavigationError::BlockedByClient(format!("HTTP {}", status.as_u16())));
        }
        if let Some(marker) = looks_blocked(&body) {
            return Err(NavigationError::BlockedByClient(marker.to_string()));
        }
        if !status.is_success() {
            return Err(NavigationError::Status(status.as_u16()));
        }

        debug!(bytes = body.len(), %final_url, "Loaded document");
        self.document = Some(body);
        self.url = Some(final_url);
        Ok(())
    }

    async fn ready_state(&self) -> Result<String, FetchError> {
        Ok(match self.document {
            Some(_) => "complete",
            None => "loading",
        }
        .to_string())
    }

    async fn has_selector(&self, selector: &str) -> Result<bool, FetchError> {
        let selector = Selector::parse(selector)
            .map_err(|e| FetchError::Browser(format!("bad selector {selector}: {e}")))?;
        Ok(self
            .document
            .as_deref()
            .map(|html| Html::parse_document(html).select(&selector).next().is_some())
            .unwrap_or(false))
    }

    async fn content(&self) -> Result<String, FetchError> {
        self.document
            .clone()
            .ok_or_else(|| FetchError::Browser("no document loaded".to_string()))
    }

    fn current_url(&self) -> Option<String> {
        self.url.clone()
    }

    async fn close(self) -> Result<(), FetchError> {
        if self.document.is_none() {
            warn!("Closing session that never loaded a document");
        }
        debug!(url = ?self.url, "Closed HTTP session");
        Ok(())
    }
}
