//! Utility functions for date handling, markup stripping, logging, and file system operations.
//!
//! This module provides helper functions used throughout the application:
//! - Date parsing and ISO-8601 normalization for `pubDate` values
//! - HTML-to-text stripping for feed snippets
//! - String truncation for logging
//! - JSON error detection for truncated corpus files
//! - Parent directory creation for output files

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use scraper::Html;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

/// Date-only layouts seen on listing pages, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%b. %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d.%m.%Y",
    "%a, %d %b %Y",
];

/// Format a timestamp the way the corpus stores it: `2025-05-06T12:00:00.000Z`.
pub fn to_iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The current time as an ISO-8601 string.
pub fn now_iso() -> String {
    to_iso(Utc::now())
}

/// Today's local date as a `YYYY-MM-DD` key.
pub fn today_key() -> String {
    Local::now().date_naive().to_string()
}

/// Parse a date or date-time string into UTC.
///
/// Accepts RFC 3339, RFC 2822, zone-less ISO date-times (read as UTC), and
/// the common date-only layouts in [`DATE_FORMATS`] (read as midnight UTC).
/// Month-only text such as `"March 2025"` resolves to the first of the month.
///
/// # Returns
///
/// `None` when nothing matches. Callers decide what an unparseable date means.
pub fn parse_pub_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    for fmt in ["%d %B %Y", "%d %b %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("1 {s}"), fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    debug!(value = %s, "Unparseable date text");
    None
}

/// Normalize free-form date text to ISO-8601.
///
/// Empty text becomes the current time. Text that cannot be parsed is kept
/// verbatim so nothing the page displayed is lost; the recency filter
/// treats it as not recent.
pub fn normalize_date_text(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return now_iso();
    }
    match parse_pub_date(trimmed) {
        Some(dt) => to_iso(dt),
        None => trimmed.to_string(),
    }
}

/// Remove markup from an HTML fragment and collapse whitespace.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(strip_html("<p>Hello <b>world</b></p>"), "Hello world");
/// ```
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes (backing off to a char
/// boundary) with an ellipsis and byte count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// A corpus file cut off mid-write fails with an EOF error; this lets the
/// loader say so in the log instead of reporting a generic syntax error.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Ensure the directory containing `path` exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_parent_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte_boundary() {
        let s = "ééééé";
        let result = truncate_for_log(s, 3);
        assert!(result.starts_with("é…"));
    }

    #[test]
    fn test_to_iso_uses_millis_and_z() {
        let dt = Utc.with_ymd_and_hms(2025, 5, 6, 12, 30, 0).unwrap();
        assert_eq!(to_iso(dt), "2025-05-06T12:30:00.000Z");
    }

    #[test]
    fn test_parse_pub_date_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(parse_pub_date("2025-03-05"), Some(expected));
        assert_eq!(parse_pub_date("March 5, 2025"), Some(expected));
        assert_eq!(parse_pub_date("Mar 5, 2025"), Some(expected));
        assert_eq!(parse_pub_date("5 March 2025"), Some(expected));
        assert_eq!(parse_pub_date("2025-03-05T00:00:00.000Z"), Some(expected));
        assert_eq!(parse_pub_date("Wed, 05 Mar 2025 00:00:00 GMT"), Some(expected));
        assert_eq!(parse_pub_date("Wed, 5 Mar 2025"), Some(expected));
    }

    #[test]
    fn test_parse_pub_date_month_only() {
        let parsed = parse_pub_date("March 2025").unwrap();
        assert_eq!((parsed.year(), parsed.month(), parsed.day()), (2025, 3, 1));
    }

    #[test]
    fn test_parse_pub_date_invalid() {
        assert_eq!(parse_pub_date(""), None);
        assert_eq!(parse_pub_date("not a date"), None);
        assert_eq!(parse_pub_date("2025-13-45"), None);
    }

    #[test]
    fn test_normalize_date_text() {
        assert_eq!(normalize_date_text("2025-03-05"), "2025-03-05T00:00:00.000Z");
        assert_eq!(normalize_date_text("  Forthcoming "), "Forthcoming");
        assert!(parse_pub_date(&normalize_date_text("")).is_some());
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(strip_html("plain   text\n here"), "plain text here");
    }

    #[test]
    fn test_looks_truncated() {
        let json_eof = r#"[{"id": "a""#;
        let result: Result<serde_json::Value, _> = serde_json::from_str(json_eof);
        let err = result.unwrap_err();
        assert!(looks_truncated(&err));
    }

    #[tokio::test]
    async fn test_ensure_parent_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b/articles.json");
        ensure_parent_dir(&target).await.unwrap();
        assert!(dir.path().join("a/b").is_dir());
    }
}
