//! Error types for fetching and for the run as a whole.
//!
//! [`FetchError`] covers everything that can go wrong for a single source and
//! is always recovered by the orchestrator. [`RunError`] covers the conditions
//! that abort a run.

use std::time::Duration;
use thiserror::Error;

/// Failure while fetching a single source or listing URL.
///
/// The `Display` output is what ends up in the run log, so variants keep
/// their messages short.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The fetch lost the race against its timer.
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Transport failure or non-success HTTP status.
    #[error("request failed: {0}")]
    Http(String),

    /// The response could not be parsed as RSS or Atom.
    #[error("parse error: {0}")]
    Parse(String),

    /// Navigation failed after the retry policy was applied.
    #[error("navigation failed: {0}")]
    Navigation(#[from] NavigationError),

    /// The browser session could not be started or queried.
    #[error("browser error: {0}")]
    Browser(String),

    /// No extraction strategy matches the page URL.
    #[error("unsupported URL pattern: {0}")]
    UnsupportedUrl(String),

    /// The source produced no items at all.
    #[error("no articles found")]
    Empty,
}

/// Navigation outcome reported by a browser session.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// The page refused the load (bot wall, client-side block).
    #[error("blocked by client ({0})")]
    BlockedByClient(String),

    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("{0}")]
    Other(String),
}

/// Conditions that abort the whole run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The source registry could not be read or parsed.
    #[error("cannot load source registry {path}: {reason}")]
    Registry { path: String, reason: String },

    /// The YAML configuration could not be read or parsed.
    #[error("cannot load config {path}: {reason}")]
    Config { path: String, reason: String },

    /// Not a single article was fetched.
    #[error("no articles fetched; all {} sources failed", .failures.len())]
    AllSourcesFailed { failures: Vec<String> },
}
