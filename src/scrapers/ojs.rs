//! Open Journal Systems issue scraper.
//!
//! Many society journals run OJS, so this strategy matches by path rather
//! than host: any `/issue/view/...` or `/issue/current` page. The table of
//! contents lists `.obj_article_summary` blocks with a linked title, an
//! author line, an optional publish date and galley links (PDF, HTML).

use super::{ExtractionStrategy, href_of, selector, text_of};
use crate::models::RawItem;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

static SUMMARY: Lazy<Selector> = Lazy::new(|| selector(".obj_article_summary"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector(".title"));
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| selector(".title a"));
static AUTHORS: Lazy<Selector> = Lazy::new(|| selector(".meta .authors"));
static PUBLISHED: Lazy<Selector> = Lazy::new(|| selector(".meta .published"));
static PDF_GALLEY: Lazy<Selector> = Lazy::new(|| selector("a.obj_galley_link.pdf"));
static HTML_GALLEY: Lazy<Selector> =
    Lazy::new(|| selector("a.obj_galley_link:not(.pdf):not(.file)"));
static ISSUE_DATE: Lazy<Selector> = Lazy::new(|| selector(".obj_issue_toc .published .value"));

/// Strategy for OJS 3 issue tables of contents.
#[derive(Debug, Clone, Copy)]
pub struct OpenJournalSystems;

impl ExtractionStrategy for OpenJournalSystems {
    fn name(&self) -> &'static str {
        "ojs"
    }

    fn matches(&self, url: &Url) -> bool {
        let path = url.path();
        path.contains("/issue/view/") || path.ends_with("/issue/current")
    }

    fn wait_selector(&self) -> Option<&'static str> {
        Some(".obj_article_summary")
    }

    fn extract(&self, page: &Html, page_url: &Url) -> Vec<RawItem> {
        let issue_date = page
            .select(&ISSUE_DATE)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let items: Vec<RawItem> = page
            .select(&SUMMARY)
            .map(|summary| {
                let published = text_of(&summary, &PUBLISHED);
                RawItem {
                    title: text_of(&summary, &TITLE),
                    author: text_of(&summary, &AUTHORS),
                    date_text: if published.is_empty() {
                        issue_date.clone()
                    } else {
                        published
                    },
                    abstract_url: href_of(&summary, &TITLE_LINK, page_url),
                    pdf_url: href_of(&summary, &PDF_GALLEY, page_url),
                    full_text_url: href_of(&summary, &HTML_GALLEY, page_url),
                }
            })
            .collect();

        debug!(count = items.len(), url = %page_url, "Extracted OJS articles");
        items
    }
}
