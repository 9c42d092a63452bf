//! NBER working paper listing scraper.
//!
//! The papers listing at `https://www.nber.org/papers` is rendered client
//! side; once loaded, each paper is a `.digest-card` with a paper number
//! label, a linked title, author items and a date line.

use super::{ExtractionStrategy, href_of, selector, text_of};
use crate::models::RawItem;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

static CARD: Lazy<Selector> = Lazy::new(|| selector(".digest-card"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector(".digest-card__title"));
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| selector(".digest-card__title a"));
static AUTHOR: Lazy<Selector> = Lazy::new(|| selector(".digest-card__items .digest-card__item"));
static DATE: Lazy<Selector> = Lazy::new(|| selector(".digest-card__date"));
static PAPER_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/papers/(w\d+)").expect("valid paper number regex"));

/// Strategy for `nber.org/papers` listings.
#[derive(Debug, Clone, Copy)]
pub struct Nber;

fn pdf_for(paper_url: &str) -> Option<String> {
    PAPER_NUMBER.captures(paper_url).map(|caps| {
        let number = &caps[1];
        format!("https://www.nber.org/system/files/working_papers/{number}/{number}.pdf")
    })
}

impl ExtractionStrategy for Nber {
    fn name(&self) -> &'static str {
        "nber"
    }

    fn matches(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|h| h == "nber.org" || h.ends_with(".nber.org"))
            && url.path().starts_with("/papers")
    }

    fn wait_selector(&self) -> Option<&'static str> {
        Some(".digest-card")
    }

    fn extract(&self, page: &Html, page_url: &Url) -> Vec<RawItem> {
        let items: Vec<RawItem> = page
            .select(&CARD)
            .map(|card| {
                let paper_url = href_of(&card, &TITLE_LINK, page_url);
                let authors: Vec<String> = card
                    .select(&AUTHOR)
                    .map(|a| a.text().collect::<String>().trim().to_string())
                    .filter(|a| !a.is_empty())
                    .collect();
                RawItem {
                    title: text_of(&card, &TITLE),
                    author: authors.join(", "),
                    date_text: text_of(&card, &DATE),
                    pdf_url: paper_url.as_deref().and_then(pdf_for),
                    abstract_url: paper_url.clone(),
                    full_text_url: paper_url,
                }
            })
            .collect();

        debug!(count = items.len(), url = %page_url, "Extracted NBER papers");
        items
    }
}
