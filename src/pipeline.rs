//! One complete harvest run: registry in, corpus and run log out.

use crate::adapters::feed::FeedClient;
use crate::browser::Browser;
use crate::error::RunError;
use crate::merge::{merge, sort_canonical};
use crate::orchestrator::Harvester;
use crate::outputs::{corpus, run_log};
use crate::registry;
use std::collections::HashSet;
use std::error::Error;
use std::path::PathBuf;
use tracing::{error, info, instrument, warn};

/// File locations used by a run.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub sources: PathBuf,
    pub corpus: PathBuf,
    pub run_log: PathBuf,
}

/// Counts reported at the end of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Articles that survived per-source filtering this run.
    pub fetched: usize,
    /// Articles that were not already in the corpus.
    pub added: usize,
    /// Corpus size after the run.
    pub total: usize,
    pub failures: Vec<String>,
}

/// Fetch every selected source, merge into the corpus and record the run.
///
/// The corpus is only rewritten when at least one source succeeded. The run
/// log is written in both cases.
///
/// # Errors
///
/// - the registry cannot be loaded, or `only` selects nothing
/// - every source failed ([`RunError::AllSourcesFailed`])
/// - the corpus cannot be written
#[instrument(level = "info", skip_all, fields(only = ?only))]
pub async fn run<F: FeedClient, B: Browser>(
    harvester: &Harvester<F, B>,
    paths: &RunPaths,
    only: &[String],
) -> Result<RunSummary, Box<dyn Error>> {
    let sources = registry::select(registry::load_sources(&paths.sources).await?, only);
    if sources.is_empty() {
        return Err(RunError::Registry {
            path: paths.sources.display().to_string(),
            reason: "no sources selected".to_string(),
        }
        .into());
    }

    let existing = corpus::load_corpus(&paths.corpus).await;

    let harvest = match harvester.harvest(&sources).await {
        Ok(harvest) => harvest,
        Err(RunError::AllSourcesFailed { failures }) => {
            if let Err(e) = run_log::write_today(&paths.run_log, &run_log::summarize(&failures)).await
            {
                error!(error = %e, "Failed to update run log");
            }
            warn!(path = %paths.corpus.display(), "Corpus left untouched");
            return Err(RunError::AllSourcesFailed { failures }.into());
        }
        Err(e) => return Err(e.into()),
    };

    let fetched = harvest.articles.len();
    let known: HashSet<String> = existing.iter().map(|a| a.title.clone()).collect();
    let articles = sort_canonical(merge(existing, harvest.articles));
    let total = articles.len();
    let added = articles.iter().filter(|a| !known.contains(&a.title)).count();
    corpus::save_corpus(&paths.corpus, &articles).await?;

    if let Err(e) = run_log::write_today(&paths.run_log, &run_log::summarize(&harvest.failures)).await
    {
        error!(error = %e, "Failed to update run log");
    }

    let summary = RunSummary {
        fetched,
        added,
        total,
        failures: harvest.failures,
    };
    info!(
        fetched = summary.fetched,
        added = summary.added,
        total = summary.total,
        failed = summary.failures.len(),
        "Run complete"
    );
    Ok(summary)
}
