//! Merge, deduplication, and canonical ordering of the corpus.
//!
//! All functions here take ownership and return new vectors; nothing is
//! modified in place.
//!
//! # Ordering
//!
//! The canonical order is source `id` ascending, then `pubDate` descending.
//! Ids compare case-insensitively first, with lowercase ahead of uppercase
//! when they differ only by case. Dates that do not parse sort after every
//! valid date of the same id. The sort is stable, so full ties keep their
//! incoming order and identical inputs always produce identical output.

use crate::models::Article;
use crate::utils::parse_pub_date;
use itertools::Itertools;
use std::cmp::Ordering;
use tracing::{debug, instrument};

/// Drop every article whose title was already seen earlier in the sequence.
pub fn dedup_by_title(articles: Vec<Article>) -> Vec<Article> {
    articles
        .into_iter()
        .unique_by(|a| a.title.clone())
        .collect()
}

/// Combine the stored corpus with newly fetched articles.
///
/// Existing articles always win: a fresh article whose title is already in
/// the corpus is discarded even if its other fields changed. Order is
/// `existing` first, then the surviving new articles in arrival order.
#[instrument(level = "info", skip_all, fields(existing = existing.len(), incoming = incoming.len()))]
pub fn merge(existing: Vec<Article>, incoming: Vec<Article>) -> Vec<Article> {
    let before = existing.len() + incoming.len();
    let merged = dedup_by_title(existing.into_iter().chain(incoming).collect());
    debug!(
        merged = merged.len(),
        dropped = before - merged.len(),
        "Merged corpus"
    );
    merged
}

/// Compare two source ids the way a locale-aware collator would for ASCII ids.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        // "a" < "A": lowercase sorts first on a case-only difference
        .then_with(|| b.cmp(a))
}

fn newest_first(a: &Article, b: &Article) -> Ordering {
    match (parse_pub_date(&a.pub_date), parse_pub_date(&b.pub_date)) {
        (Some(da), Some(db)) => db.cmp(&da),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort into canonical corpus order.
pub fn sort_canonical(mut articles: Vec<Article>) -> Vec<Article> {
    articles.sort_by(|a, b| locale_cmp(&a.id, &b.id).then_with(|| newest_first(a, b)));
    articles
}
