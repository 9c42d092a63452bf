//! arXiv listing scraper.
//!
//! Handles the per-category listing pages such as
//! `https://arxiv.org/list/econ.GN/recent` and `.../pastweek`. Each entry is
//! a `<dt>` (identifier and format links) followed by a `<dd>` (title,
//! authors). Entries are grouped under `<h3>` day headings like
//! `Fri, 10 May 2024 (showing 25 of 40 entries)`, which supply the dates.

use super::{ExtractionStrategy, href_of, selector, strip_label, text_of};
use crate::models::RawItem;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

static ENTRY_PARTS: Lazy<Selector> = Lazy::new(|| selector("h3, dl > dt, dl > dd"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("div.list-title"));
static AUTHORS: Lazy<Selector> = Lazy::new(|| selector("div.list-authors"));
static AUTHOR_LINKS: Lazy<Selector> = Lazy::new(|| selector("div.list-authors a"));
static ABSTRACT: Lazy<Selector> = Lazy::new(|| selector(r#"a[title="Abstract"]"#));
static PDF: Lazy<Selector> = Lazy::new(|| selector(r#"a[title="Download PDF"]"#));
static HTML_VERSION: Lazy<Selector> = Lazy::new(|| selector(r#"a[title="View HTML"]"#));

/// Strategy for `arxiv.org/list/...` pages.
#[derive(Debug, Clone, Copy)]
pub struct Arxiv;

fn day_heading(h3: &ElementRef<'_>) -> String {
    let text = h3.text().collect::<String>();
    text.split('(').next().unwrap_or_default().trim().to_string()
}

fn authors(dd: &ElementRef<'_>) -> String {
    let names: Vec<String> = dd
        .select(&AUTHOR_LINKS)
        .map(|a| a.text().collect::<String>().trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        strip_label(&text_of(dd, &AUTHORS), "Authors:")
    } else {
        names.join(", ")
    }
}

impl ExtractionStrategy for Arxiv {
    fn name(&self) -> &'static str {
        "arxiv"
    }

    fn matches(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|h| h == "arxiv.org" || h.ends_with(".arxiv.org"))
            && url.path().starts_with("/list/")
    }

    fn wait_selector(&self) -> Option<&'static str> {
        Some("dl dt")
    }

    fn extract(&self, page: &Html, page_url: &Url) -> Vec<RawItem> {
        let mut items = Vec::new();
        let mut current_day = String::new();
        let mut pending: Option<ElementRef<'_>> = None;

        for el in page.select(&ENTRY_PARTS) {
            match el.value().name() {
                "h3" => current_day = day_heading(&el),
                "dt" => pending = Some(el),
                "dd" => {
                    let Some(dt) = pending.take() else {
                        continue;
                    };
                    items.push(RawItem {
                        title: strip_label(&text_of(&el, &TITLE), "Title:"),
                        author: authors(&el),
                        date_text: current_day.clone(),
                        abstract_url: href_of(&dt, &ABSTRACT, page_url),
                        pdf_url: href_of(&dt, &PDF, page_url),
                        full_text_url: href_of(&dt, &HTML_VERSION, page_url),
                    });
                }
                _ => {}
            }
        }

        debug!(count = items.len(), url = %page_url, "Extracted arXiv entries");
        items
    }
}
