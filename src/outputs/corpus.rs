//! Corpus persistence.
//!
//! The corpus is a single JSON array of [`Article`] records. It is read once
//! at the start of a run and replaced once at the end.
//!
//! # Failure Policy
//!
//! A missing or unreadable corpus is not fatal: the run starts from an empty
//! corpus and logs why. Writing, on the other hand, must succeed. The new
//! contents go to a sibling temp file which is then renamed over the target,
//! so readers never observe a half-written corpus.

use crate::models::Article;
use crate::utils::{ensure_parent_dir, looks_truncated};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument, warn};

/// Load the stored corpus, falling back to an empty one.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_corpus(path: &Path) -> Vec<Article> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No existing corpus; starting empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "Failed to read corpus; starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Article>>(&raw) {
        Ok(articles) => {
            info!(count = articles.len(), "Loaded existing corpus");
            articles
        }
        Err(e) if looks_truncated(&e) => {
            warn!(error = %e, "Corpus file looks truncated; starting empty");
            Vec::new()
        }
        Err(e) => {
            warn!(error = %e, "Corpus file is not valid JSON; starting empty");
            Vec::new()
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "corpus".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace the corpus file with `articles`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, serialization fails,
/// or the file cannot be written or renamed into place.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = articles.len()))]
pub async fn save_corpus(path: &Path, articles: &[Article]) -> Result<(), Box<dyn Error>> {
    ensure_parent_dir(path).await?;
    let json = serde_json::to_string_pretty(articles)?;

    let tmp = temp_path_for(path);
    if let Err(e) = fs::write(&tmp, json).await {
        error!(tmp = %tmp.display(), error = %e, "Failed to write temp corpus");
        return Err(e.into());
    }
    fs::rename(&tmp, path).await?;

    info!("Wrote corpus");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str) -> Article {
        Article {
            id: "a".to_string(),
            title: title.to_string(),
            description: "d".to_string(),
            link: "https://example.com".to_string(),
            pub_date: "2025-05-06T00:00:00.000Z".to_string(),
            source: "A".to_string(),
            category: "News".to_string(),
            author: Some("Jane Doe".to_string()),
        }
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_corpus(&dir.path().join("nope.json")).await;
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");
        std::fs::write(&path, "{ this is not json").unwrap();
        assert!(load_corpus(&path).await.is_empty());

        std::fs::write(&path, r#"[{"id": "a", "title": "#).unwrap();
        assert!(load_corpus(&path).await.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/articles.json");
        let articles = vec![article("One"), article("Two")];

        save_corpus(&path, &articles).await.unwrap();
        assert!(!temp_path_for(&path).exists());
        assert_eq!(load_corpus(&path).await, articles);
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");

        save_corpus(&path, &[article("One"), article("Two")]).await.unwrap();
        save_corpus(&path, &[article("Three")]).await.unwrap();

        let loaded = load_corpus(&path).await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, "Three");
    }
}
