//! Sliding issue window for sources published as monthly listing pages.
//!
//! A registry URL such as `https://journal.example/archive/{year}/{month}`
//! stands for one page per month. It expands to the current month and the
//! two before it, newest first. URLs without placeholders pass through as a
//! single-element list.

use chrono::{Datelike, Months, NaiveDate};

/// Number of monthly listing pages covered by one run.
pub const ISSUE_WINDOW: u32 = 3;

pub fn has_placeholders(url: &str) -> bool {
    url.contains("{year}") || url.contains("{month}")
}

/// Listing URLs to fetch for `url` on `today`.
pub fn listing_urls(url: &str, today: NaiveDate) -> Vec<String> {
    if !has_placeholders(url) {
        return vec![url.to_string()];
    }

    let first_of_month = today.with_day(1).unwrap_or(today);
    (0..ISSUE_WINDOW)
        .filter_map(|back| first_of_month.checked_sub_months(Months::new(back)))
        .map(|month| {
            url.replace("{year}", &month.year().to_string())
                .replace("{month}", &format!("{:02}", month.month()))
        })
        .collect()
}
