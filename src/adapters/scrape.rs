//! Scrape adapter: listing pages rendered in a browser session.
//!
//! # Session Lifecycle
//!
//! Every call launches a fresh session and closes it before returning,
//! whether navigation, waiting or extraction succeeded or not.
//!
//! # Navigation Policy
//!
//! 1. Load with [`WaitUntil::DomContentLoaded`].
//! 2. If the load is blocked by the client, retry once with [`WaitUntil::Load`].
//! 3. Any other navigation error fails the fetch.
//!
//! Each attempt, the ready-state poll and the selector wait are bounded by
//! their own timeout.

use crate::browser::{Browser, BrowserSession, SessionProfile, WaitUntil};
use crate::config::{BrowserConfig, Timeouts};
use crate::error::{FetchError, NavigationError};
use crate::models::{Article, RawItem, SourceDescriptor};
use crate::scrapers::{ExtractionStrategy, StrategyRegistry};
use crate::utils::{collapse_whitespace, normalize_date_text};
use scraper::Html;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};
use url::Url;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Scrapes listing pages through sessions opened on `B`.
pub struct ScrapeAdapter<B> {
    browser: B,
    strategies: StrategyRegistry,
    browser_config: BrowserConfig,
    timeouts: Timeouts,
}

impl<B: Browser> ScrapeAdapter<B> {
    pub fn new(
        browser: B,
        strategies: StrategyRegistry,
        browser_config: BrowserConfig,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            browser,
            strategies,
            browser_config,
            timeouts,
        }
    }

    pub fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    /// Scrape `url` on behalf of `source`.
    ///
    /// # Errors
    ///
    /// [`FetchError::UnsupportedUrl`] when no strategy matches, navigation
    /// and timeout errors from the session, or [`FetchError::Browser`] when
    /// the session cannot be launched.
    #[instrument(level = "info", skip_all, fields(source = %source.id, %url))]
    pub async fn fetch(
        &self,
        source: &SourceDescriptor,
        url: &str,
    ) -> Result<Vec<Article>, FetchError> {
        let strategy = self
            .strategies
            .resolve(url)
            .ok_or_else(|| FetchError::UnsupportedUrl(url.to_string()))?;

        let profile = SessionProfile::from_config(&self.browser_config);
        let mut session = self.browser.launch(&profile).await?;
        let outcome = self.scrape(&mut session, strategy, url).await;
        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close browser session");
        }

        let items = outcome?;
        let articles: Vec<Article> = items
            .into_iter()
            .filter(|item| !item.title.trim().is_empty())
            .map(|item| to_article(source, item))
            .collect();
        info!(count = articles.len(), strategy = strategy.name(), "Scraped listing");
        Ok(articles)
    }

    async fn scrape(
        &self,
        session: &mut B::Session,
        strategy: &dyn ExtractionStrategy,
        url: &str,
    ) -> Result<Vec<RawItem>, FetchError> {
        navigate(session, url, self.timeouts.navigation()).await?;
        wait_until_complete(session, self.timeouts.ready()).await?;
        if let Some(css) = strategy.wait_selector() {
            wait_for_selector(session, css, self.timeouts.selector()).await?;
        }

        let html = session.content().await?;
        let page_url = session.current_url().unwrap_or_else(|| url.to_string());
        let base = Url::parse(&page_url).map_err(|e| FetchError::Browser(e.to_string()))?;
        let document = Html::parse_document(&html);
        Ok(strategy.extract(&document, &base))
    }
}

/// Load `url`, retrying once with a full load if the client blocks it.
pub async fn navigate<S: BrowserSession>(
    session: &mut S,
    url: &str,
    bound: Duration,
) -> Result<(), FetchError> {
    let first = timeout(bound, session.goto(url, WaitUntil::DomContentLoaded)).await;
    match first {
        Ok(Ok(())) => Ok(()),
        Ok(Err(NavigationError::BlockedByClient(reason))) => {
            warn!(%reason, "Navigation blocked; retrying with full page load");
            let retry = timeout(bound, session.goto(url, WaitUntil::Load)).await;
            match retry {
                Ok(result) => result.map_err(FetchError::from),
                Err(_) => Err(NavigationError::Timeout(bound).into()),
            }
        }
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(NavigationError::Timeout(bound).into()),
    }
}

async fn wait_until_complete<S: BrowserSession>(
    session: &S,
    bound: Duration,
) -> Result<(), FetchError> {
    let poll = async {
        loop {
            if session.ready_state().await? == "complete" {
                return Ok::<(), FetchError>(());
            }
            sleep(POLL_INTERVAL).await;
        }
    };
    timeout(bound, poll)
        .await
        .map_err(|_| FetchError::Timeout(bound))?
}

async fn wait_for_selector<S: BrowserSession>(
    session: &S,
    css: &str,
    bound: Duration,
) -> Result<(), FetchError> {
    let poll = async {
        loop {
            if session.has_selector(css).await? {
                return Ok::<(), FetchError>(());
            }
            sleep(POLL_INTERVAL).await;
        }
    };
    timeout(bound, poll).await.map_err(|_| {
        debug!(selector = css, "Selector never appeared");
        FetchError::Timeout(bound)
    })?
}

fn to_article(source: &SourceDescriptor, item: RawItem) -> Article {
    Article {
        id: source.id.clone(),
        title: collapse_whitespace(&item.title),
        description: String::new(),
        link: item.full_text_url.unwrap_or_default(),
        pub_date: normalize_date_text(&item.date_text),
        source: source.title.clone(),
        category: source.category.clone(),
        author: Some(item.author),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// How a fake page responds to navigation.
    #[derive(Debug, Clone)]
    pub(crate) enum FakePage {
        Html(String),
        /// Blocked on DOM-ready, served on full load.
        BlockedThenHtml(String),
        /// Blocked on every attempt.
        AlwaysBlocked,
        /// Navigation never finishes.
        Hangs,
        /// Loads, but the ready state stays `"interactive"`.
        NeverReady(String),
        Fails(u16),
    }

    /// In-memory [`Browser`] that records launches, closes and navigations.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct FakeBrowser {
        pub pages: Arc<HashMap<String, FakePage>>,
        pub launched: Arc<AtomicUsize>,
        pub closed: Arc<AtomicUsize>,
        pub navigations: Arc<Mutex<Vec<(String, WaitUntil)>>>,
    }

    impl FakeBrowser {
        pub fn with_pages(pages: Vec<(&str, FakePage)>) -> Self {
            Self {
                pages: Arc::new(
                    pages
                        .into_iter()
                        .map(|(url, page)| (url.to_string(), page))
                        .collect(),
                ),
                ..Self::default()
            }
        }
    }

    pub(crate) struct FakeSession {
        browser: FakeBrowser,
        document: Option<String>,
        url: Option<String>,
        ready: bool,
    }

    impl Browser for FakeBrowser {
        type Session = FakeSession;

        async fn launch(&self, _profile: &SessionProfile) -> Result<FakeSession, FetchError> {
            self.launched.fetch_add(1, Ordering::SeqCst);
            Ok(FakeSession {
                browser: self.clone(),
                document: None,
                url: None,
                ready: false,
            })
        }
    }

    impl BrowserSession for FakeSession {
        async fn goto(&mut self, url: &str, wait: WaitUntil) -> Result<(), NavigationError> {
            self.browser
                .navigations
                .lock()
                .unwrap()
                .push((url.to_string(), wait));
            let html = match (self.browser.pages.get(url), wait) {
                (Some(FakePage::Html(html)), _) => html.clone(),
                (Some(FakePage::BlockedThenHtml(_)), WaitUntil::DomContentLoaded) => {
                    return Err(NavigationError::BlockedByClient("ERR_BLOCKED_BY_CLIENT".into()));
                }
                (Some(FakePage::BlockedThenHtml(html)), WaitUntil::Load) => html.clone(),
                (Some(FakePage::AlwaysBlocked), _) => {
                    return Err(NavigationError::BlockedByClient("ERR_BLOCKED_BY_CLIENT".into()));
                }
                (Some(FakePage::Hangs), _) => return std::future::pending().await,
                (Some(FakePage::NeverReady(html)), _) => {
                    self.document = Some(html.clone());
                    self.url = Some(url.to_string());
                    return Ok(());
                }
                (Some(FakePage::Fails(code)), _) => return Err(NavigationError::Status(*code)),
                (None, _) => return Err(NavigationError::Status(404)),
            };
            self.ready = true;
            self.document = Some(html);
            self.url = Some(url.to_string());
            Ok(())
        }

        async fn ready_state(&self) -> Result<String, FetchError> {
            Ok(match (&self.document, self.ready) {
                (Some(_), true) => "complete",
                (Some(_), false) => "interactive",
                (None, _) => "loading",
            }
            .to_string())
        }

        async fn has_selector(&self, selector: &str) -> Result<bool, FetchError> {
            let selector = scraper::Selector::parse(selector)
                .map_err(|e| FetchError::Browser(e.to_string()))?;
            Ok(self
                .document
                .as_deref()
                .is_some_and(|html| Html::parse_document(html).select(&selector).next().is_some()))
        }

        async fn content(&self) -> Result<String, FetchError> {
            self.document
                .clone()
                .ok_or_else(|| FetchError::Browser("no document".into()))
        }

        fn current_url(&self) -> Option<String> {
            self.url.clone()
        }

        async fn close(self) -> Result<(), FetchError> {
            self.browser.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    pub(crate) const OJS_ISSUE: &str = r#"
<html><body><div class="obj_issue_toc">
  <div class="obj_article_summary">
    <h3 class="title"><a href="/j/article/view/1">Growth Accounting Revisited</a></h3>
    <div class="meta"><div class="authors">Ana Lima</div><div class="published">2024-04-15</div></div>
    <a class="obj_galley_link" href="/j/article/view/1/2">HTML</a>
    <a class="obj_galley_link pdf" href="/j/article/view/1/3">PDF</a>
  </div>
  <div class="obj_article_summary">
    <h3 class="title"><a href="/j/article/view/9"> </a></h3>
  </div>
  <div class="obj_article_summary">
    <h3 class="title"><a href="/j/article/view/4">Notes on Prices</a></h3>
    <div class="meta"><div class="authors">Bo Chen</div></div>
  </div>
</div></body></html>
"#;

    pub(crate) fn ojs_source(url: &str) -> SourceDescriptor {
        SourceDescriptor {
            id: "jx".to_string(),
            title: "Journal X".to_string(),
            url: url.to_string(),
            category: "Economics".to_string(),
            adapter: None,
        }
    }

    fn adapter(browser: FakeBrowser) -> ScrapeAdapter<FakeBrowser> {
        ScrapeAdapter::new(
            browser,
            StrategyRegistry::with_defaults(),
            BrowserConfig::default(),
            Timeouts::default(),
        )
    }

    const ISSUE_URL: &str = "https://journal.example/j/issue/view/7";

    #[tokio::test]
    async fn test_fetch_maps_items_and_closes_session() {
        let browser = FakeBrowser::with_pages(vec![(ISSUE_URL, FakePage::Html(OJS_ISSUE.into()))]);
        let scrape = adapter(browser.clone());

        let articles = scrape.fetch(&ojs_source(ISSUE_URL), ISSUE_URL).await.unwrap();

        assert_eq!(articles.len(), 2, "empty titles are dropped");
        let first = &articles[0];
        assert_eq!(first.id, "jx");
        assert_eq!(first.source, "Journal X");
        assert_eq!(first.category, "Economics");
        assert_eq!(first.title, "Growth Accounting Revisited");
        assert_eq!(first.link, "https://journal.example/j/article/view/1/2");
        assert_eq!(first.pub_date, "2024-04-15T00:00:00.000Z");
        assert_eq!(first.author.as_deref(), Some("Ana Lima"));
        assert_eq!(first.description, "");

        assert_eq!(articles[1].link, "", "no full-text link falls back to empty");
        assert_eq!(browser.launched.load(Ordering::SeqCst), 1);
        assert_eq!(browser.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blocked_navigation_retries_with_full_load() {
        let browser = FakeBrowser::with_pages(vec![(
            ISSUE_URL,
            FakePage::BlockedThenHtml(OJS_ISSUE.into()),
        )]);
        let scrape = adapter(browser.clone());

        let articles = scrape.fetch(&ojs_source(ISSUE_URL), ISSUE_URL).await.unwrap();
        assert_eq!(articles.len(), 2);

        let navigations = browser.navigations.lock().unwrap().clone();
        let waits: Vec<WaitUntil> = navigations.into_iter().map(|(_, w)| w).collect();
        assert_eq!(waits, vec![WaitUntil::DomContentLoaded, WaitUntil::Load]);
    }

    #[tokio::test]
    async fn test_other_navigation_errors_do_not_retry_and_close_session() {
        let browser = FakeBrowser::with_pages(vec![(ISSUE_URL, FakePage::Fails(500))]);
        let scrape = adapter(browser.clone());

        let err = scrape.fetch(&ojs_source(ISSUE_URL), ISSUE_URL).await.unwrap_err();
        assert!(matches!(err, FetchError::Navigation(NavigationError::Status(500))));
        assert_eq!(browser.navigations.lock().unwrap().len(), 1);
        assert_eq!(browser.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_selector_times_out_and_closes_session() {
        let browser = FakeBrowser::with_pages(vec![(
            ISSUE_URL,
            FakePage::Html("<html><body>maintenance</body></html>".into()),
        )]);
        let scrape = adapter(browser.clone());

        let err = scrape.fetch(&ojs_source(ISSUE_URL), ISSUE_URL).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(d) if d == Duration::from_secs(10)));
        assert_eq!(browser.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsupported_url_fails_without_launching() {
        let browser = FakeBrowser::default();
        let scrape = adapter(browser.clone());

        let url = "https://unknown.example/listing";
        let err = scrape.fetch(&ojs_source(url), url).await.unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedUrl(_)));
        assert!(err.to_string().contains("unsupported URL pattern"));
        assert_eq!(browser.launched.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_navigation_times_out_and_closes_session() {
        let browser = FakeBrowser::with_pages(vec![(ISSUE_URL, FakePage::Hangs)]);
        let scrape = adapter(browser.clone());

        let err = scrape.fetch(&ojs_source(ISSUE_URL), ISSUE_URL).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Navigation(NavigationError::Timeout(d)) if d == Duration::from_secs(30)
        ));
        assert_eq!(browser.navigations.lock().unwrap().len(), 1);
        assert_eq!(browser.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_never_ready_times_out_and_closes_session() {
        let browser =
            FakeBrowser::with_pages(vec![(ISSUE_URL, FakePage::NeverReady(OJS_ISSUE.into()))]);
        let scrape = adapter(browser.clone());

        let err = scrape.fetch(&ojs_source(ISSUE_URL), ISSUE_URL).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(d) if d == Duration::from_secs(30)));
        assert_eq!(browser.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blocked_twice_retries_only_once() {
        let browser = FakeBrowser::with_pages(vec![(ISSUE_URL, FakePage::AlwaysBlocked)]);
        let scrape = adapter(browser.clone());

        let err = scrape.fetch(&ojs_source(ISSUE_URL), ISSUE_URL).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Navigation(NavigationError::BlockedByClient(_))
        ));

        let waits: Vec<WaitUntil> = browser
            .navigations
            .lock()
            .unwrap()
            .iter()
            .map(|(_, w)| *w)
            .collect();
        assert_eq!(waits, vec![WaitUntil::DomContentLoaded, WaitUntil::Load]);
        assert_eq!(browser.closed.load(Ordering::SeqCst), 1);
    }
}
