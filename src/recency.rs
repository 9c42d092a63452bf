//! Recency filtering for newly fetched articles.
//!
//! An article is recent when the distance between now and its `pubDate`,
//! rounded up to whole days, is at most the window. The distance is taken in
//! absolute value, so items dated slightly in the future count as recent too.
//! Articles whose `pubDate` cannot be parsed are never recent.

use crate::config::RecencyConfig;
use crate::models::Article;
use crate::utils::parse_pub_date;
use chrono::{DateTime, Utc};
use tracing::debug;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Whether `article` was published within `days` days of `now`.
pub fn is_recent_at(article: &Article, days: i64, now: DateTime<Utc>) -> bool {
    let Some(published) = parse_pub_date(&article.pub_date) else {
        debug!(title = %article.title, pub_date = %article.pub_date, "Invalid pubDate; treating as stale");
        return false;
    };

    let diff_ms = (now - published).num_milliseconds().abs();
    // ceil(diff / day) without floating point
    let diff_days = (diff_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
    diff_days <= days
}

/// Whether `article` was published within `days` days of the current time.
pub fn filter_latest(article: &Article, days: i64) -> bool {
    is_recent_at(article, days, Utc::now())
}

/// Apply the configured recency window to one source's articles.
///
/// Sources not on the allow-list are returned untouched. `now` pins the
/// reference time; `None` measures against the current time.
pub fn apply(
    config: &RecencyConfig,
    source_id: &str,
    articles: Vec<Article>,
    now: Option<DateTime<Utc>>,
) -> Vec<Article> {
    if !config.applies_to(source_id) {
        return articles;
    }
    let days = config.window_days;
    articles
        .into_iter()
        .filter(|a| match now {
            Some(now) => is_recent_at(a, days, now),
            None => filter_latest(a, days),
        })
        .collect()
}
