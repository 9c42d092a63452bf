//! Daily run log.
//!
//! One line per calendar date, `<YYYY-MM-DD>: <message>`. Writing on a date
//! that already has a line replaces that line in place; otherwise a new line
//! is appended. Other dates are left untouched.

use crate::utils::{collapse_whitespace, ensure_parent_dir, today_key};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

pub const ALL_OK: &str = "All sources fetched successfully";

/// Build the log message for a run's failure list.
///
/// Each failure is flattened to a single line so the entry stays on one line.
pub fn summarize(failures: &[String]) -> String {
    if failures.is_empty() {
        return ALL_OK.to_string();
    }
    let flat: Vec<String> = failures.iter().map(|f| collapse_whitespace(f)).collect();
    format!("Failed sources: {}", flat.join("; "))
}

/// Insert or replace the line for `date` in `contents`.
pub fn upsert_entry(contents: &str, date: &str, message: &str) -> String {
    let prefix = format!("{date}:");
    let entry = format!("{date}: {message}");

    let mut replaced = false;
    let mut lines: Vec<String> = contents
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            if l.starts_with(&prefix) {
                replaced = true;
                entry.clone()
            } else {
                l.to_string()
            }
        })
        .collect();
    if !replaced {
        lines.push(entry);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Record `message` as today's entry.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_today(path: &Path, message: &str) -> Result<(), Box<dyn Error>> {
    write_entry(path, &today_key(), message).await
}

/// Record `message` as the entry for `date`.
pub async fn write_entry(path: &Path, date: &str, message: &str) -> Result<(), Box<dyn Error>> {
    ensure_parent_dir(path).await?;
    let existing = match fs::read_to_string(path).await {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    fs::write(path, upsert_entry(&existing, date, message)).await?;
    info!(%date, %message, "Updated run log");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize() {
        assert_eq!(summarize(&[]), ALL_OK);
        assert_eq!(
            summarize(&["B (timed out after 15s)".to_string(), "C (no articles found)".to_string()]),
            "Failed sources: B (timed out after 15s); C (no articles found)"
        );
    }

    #[test]
    fn test_multiline_failures_stay_on_one_line() {
        let message = summarize(&["B (request failed: error\n  caused by: reset)".to_string()]);
        assert_eq!(message, "Failed sources: B (request failed: error caused by: reset)");

        let first = upsert_entry("", "2025-05-06", &message);
        let second = upsert_entry(&first, "2025-05-06", ALL_OK);
        assert_eq!(second, format!("2025-05-06: {ALL_OK}\n"));
    }

    #[test]
    fn test_upsert_appends_new_date() {
        let out = upsert_entry("2025-05-05: ok\n", "2025-05-06", "later");
        assert_eq!(out, "2025-05-05: ok\n2025-05-06: later\n");
    }

    #[test]
    fn test_upsert_replaces_same_date_only() {
        let before = "2025-05-05: first\n2025-05-06: second\n2025-05-07: third\n";
        let out = upsert_entry(before, "2025-05-06", "replaced");
        assert_eq!(
            out,
            "2025-05-05: first\n2025-05-06: replaced\n2025-05-07: third\n"
        );
    }

    #[tokio::test]
    async fn test_write_entry_twice_same_day() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/run.log");

        write_entry(&path, "2025-05-06", "Failed sources: B (timed out after 15s)").await.unwrap();
        write_entry(&path, "2025-05-06", ALL_OK).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, format!("2025-05-06: {ALL_OK}\n"));
    }
}
