//! Runtime configuration loaded from an optional YAML file.
//!
//! Every field has a default, so a missing `--config` flag or a partial file
//! both produce a usable [`HarvestConfig`].
//!
//! ```yaml
//! recency:
//!   window_days: 7
//!   sources: [fed, nber]
//! timeouts:
//!   feed_secs: 15
//! browser:
//!   viewport: { width: 1366, height: 768 }
//! ```

use crate::error::RunError;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub recency: RecencyConfig,
    pub timeouts: Timeouts,
    pub browser: BrowserConfig,
}

/// Which sources are restricted to recent items, and how recent.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecencyConfig {
    /// Maximum age in whole days (rounded up).
    pub window_days: i64,
    /// Source ids the filter applies to. Other sources pass through.
    pub sources: Vec<String>,
}

impl Default for RecencyConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            sources: Vec::new(),
        }
    }
}

impl RecencyConfig {
    pub fn applies_to(&self, source_id: &str) -> bool {
        self.sources.iter().any(|id| id == source_id)
    }
}

/// Fetch timeouts, in seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Underlying HTTP request timeout for feed downloads.
    pub request_secs: u64,
    /// Race timer for a whole feed fetch.
    pub feed_secs: u64,
    /// Bound on each page navigation attempt.
    pub navigation_secs: u64,
    /// Bound on waiting for `document.readyState == "complete"`.
    pub ready_secs: u64,
    /// Bound on waiting for a strategy's readiness selector.
    pub selector_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: 10,
            feed_secs: 15,
            navigation_secs: 30,
            ready_secs: 30,
            selector_secs: 10,
        }
    }
}

impl Timeouts {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn feed(&self) -> Duration {
        Duration::from_secs(self.feed_secs)
    }

    pub fn navigation(&self) -> Duration {
        Duration::from_secs(self.navigation_secs)
    }

    pub fn ready(&self) -> Duration {
        Duration::from_secs(self.ready_secs)
    }

    pub fn selector(&self) -> Duration {
        Duration::from_secs(self.selector_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Settings for the scrape adapter's browser sessions.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Pool of user agents; one is picked per session.
    pub user_agents: Vec<String>,
    pub viewport: Viewport,
    pub accept_language: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0".to_string(),
            ],
            viewport: Viewport {
                width: 1366,
                height: 768,
            },
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

/// Load configuration from `path`, or the defaults when `path` is `None`.
///
/// # Errors
///
/// Returns [`RunError::Config`] if the file exists but cannot be read or
/// parsed. A bad config is a startup error, never silently replaced by
/// defaults.
#[instrument(level = "info")]
pub async fn load_config(path: Option<&str>) -> Result<HarvestConfig, RunError> {
    let Some(path) = path else {
        info!("No config file given; using defaults");
        return Ok(HarvestConfig::default());
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RunError::Config {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
    let config: HarvestConfig = serde_yaml::from_str(&raw).map_err(|e| RunError::Config {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    info!(
        path,
        window_days = config.recency.window_days,
        filtered_sources = config.recency.sources.len(),
        "Loaded configuration"
    );
    Ok(config)
}
