//! Fetch adapters and the resolver that picks one per source.
//!
//! | Adapter | Module | Used for |
//! |---------|--------|----------|
//! | Feed | [`feed`] | RSS 2.0 / Atom documents |
//! | Scrape | [`scrape`] | Listing pages handled by a registered extraction strategy |
//!
//! A source's `adapter` field wins when present. Otherwise a URL matched by
//! an extraction strategy is scraped and everything else is treated as a
//! feed.

use crate::models::{AdapterHint, SourceDescriptor};
use crate::scrapers::StrategyRegistry;

pub mod feed;
pub mod scrape;

/// The adapter chosen for one URL of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Feed,
    Scrape,
}

/// Maps sources to adapters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver;

impl Resolver {
    pub fn resolve(
        &self,
        source: &SourceDescriptor,
        url: &str,
        strategies: &StrategyRegistry,
    ) -> AdapterKind {
        match source.adapter {
            Some(AdapterHint::Feed) => AdapterKind::Feed,
            Some(AdapterHint::Scrape) => AdapterKind::Scrape,
            None if strategies.resolve(url).is_some() => AdapterKind::Scrape,
            None => AdapterKind::Feed,
        }
    }
}
