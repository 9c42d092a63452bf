//! Source registry loading.
//!
//! The registry is a JSON array of [`SourceDescriptor`] records. Order
//! matters: sources are fetched in the order they are listed.

use crate::error::RunError;
use crate::models::SourceDescriptor;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Read and parse the source registry.
///
/// # Errors
///
/// Any read or parse failure is a [`RunError::Registry`]; the run must not
/// start without a valid registry.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_sources(path: &Path) -> Result<Vec<SourceDescriptor>, RunError> {
    let registry_err = |reason: String| RunError::Registry {
        path: path.display().to_string(),
        reason,
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| registry_err(e.to_string()))?;
    let sources: Vec<SourceDescriptor> =
        serde_json::from_str(&raw).map_err(|e| registry_err(e.to_string()))?;

    let mut seen = HashSet::new();
    for source in &sources {
        if !seen.insert(source.id.as_str()) {
            info!(id = %source.id, "Source id listed more than once");
        }
        if source.url.trim().is_empty() {
            return Err(registry_err(format!("source '{}' has an empty url", source.id)));
        }
    }

    info!(count = sources.len(), "Loaded source registry");
    Ok(sources)
}

/// Keep only the sources whose id is in `only`; an empty filter keeps all.
pub fn select(sources: Vec<SourceDescriptor>, only: &[String]) -> Vec<SourceDescriptor> {
    if only.is_empty() {
        return sources;
    }
    for id in only {
        if !sources.iter().any(|s| &s.id == id) {
            warn!(%id, "Requested source id is not in the registry");
        }
    }
    sources
        .into_iter()
        .filter(|s| only.contains(&s.id))
        .collect()
}
