//! Data models for sources, harvested articles, and intermediate fetch records.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SourceDescriptor`]: One monitored publication from the source registry
//! - [`Article`]: The canonical record persisted in the corpus
//! - [`FeedItem`]: A syndication entry as returned by the feed parser
//! - [`RawItem`]: A listing entry as returned by a site extraction strategy
//!
//! Articles are serialized with camelCase keys (`pubDate`) to stay compatible
//! with the corpus consumers that render it.

use serde::{Deserialize, Serialize};

/// Which adapter a source should be fetched with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterHint {
    Feed,
    Scrape,
}

/// A monitored publication, as listed in the source registry.
///
/// Descriptors are read once per run and never modified. The `adapter`
/// field is optional; when absent the resolver picks an adapter from the
/// URL (see [`crate::adapters::Resolver`]).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceDescriptor {
    /// Stable identifier, copied onto every article as its grouping key.
    pub id: String,
    /// Human-readable display name.
    pub title: String,
    /// Feed URL or listing page URL. May contain `{year}`/`{month}` placeholders.
    pub url: String,
    /// Category label copied onto every article.
    pub category: String,
    /// Optional explicit adapter selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter: Option<AdapterHint>,
}

/// The canonical article record stored in the corpus.
///
/// # JSON Schema
///
/// ```json
/// {
///   "id": "nber",
///   "title": "Monetary Policy and ...",
///   "description": "",
///   "link": "https://www.nber.org/papers/w31234",
///   "pubDate": "2025-05-06T00:00:00.000Z",
///   "source": "NBER Working Papers",
///   "category": "Economics",
///   "author": "Jane Doe"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Owning source id. Not unique across the corpus.
    pub id: String,
    /// Article title; the deduplication key.
    pub title: String,
    /// Summary text, empty when the source provides none.
    #[serde(default)]
    pub description: String,
    /// Link to the full item.
    #[serde(default)]
    pub link: String,
    /// ISO-8601 publish date.
    pub pub_date: String,
    /// Display name of the owning source.
    #[serde(default)]
    pub source: String,
    /// Category of the owning source.
    #[serde(default)]
    pub category: String,
    /// Author line, only set for scraped items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// A single entry from a parsed RSS or Atom document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// Plain-text content with markup removed.
    pub content_snippet: Option<String>,
    /// Raw description as published (may contain HTML).
    pub description: Option<String>,
    /// Publish date, already normalized to ISO-8601.
    pub published: Option<String>,
    /// Alternate date (Atom `updated`, Dublin Core `dc:date`), ISO-8601.
    pub indexed: Option<String>,
}

/// A listing entry extracted from a rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub title: String,
    pub author: String,
    /// Date text as displayed on the page, unparsed.
    pub date_text: String,
    pub abstract_url: Option<String>,
    pub pdf_url: Option<String>,
    pub full_text_url: Option<String>,
}
