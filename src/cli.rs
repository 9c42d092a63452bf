//! Command-line interface definitions for Article Harvest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every path can also be provided through an environment variable.

use clap::Parser;

/// Command-line arguments for the Article Harvest application.
///
/// # Examples
///
/// ```sh
/// # Default locations under ./data
/// article_harvest
///
/// # Explicit registry and corpus, with a YAML config
/// article_harvest -s ./sources.json -o ./articles.json -c ./harvest.yaml
///
/// # Re-run two sources with a wider recency window
/// article_harvest --only fed --only nber --recent-days 14
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the JSON source registry
    #[arg(short, long, env = "HARVEST_SOURCES", default_value = "data/sources.json")]
    pub sources: String,

    /// Path to the JSON article corpus
    #[arg(short = 'o', long, env = "HARVEST_CORPUS", default_value = "data/articles.json")]
    pub corpus: String,

    /// Path to the daily run log
    #[arg(short, long, env = "HARVEST_RUN_LOG", default_value = "data/run.log")]
    pub run_log: String,

    /// Optional path to a YAML config file
    #[arg(short, long, env = "HARVEST_CONFIG")]
    pub config: Option<String>,

    /// Only fetch the source with this id (repeatable)
    #[arg(long = "only", value_name = "ID")]
    pub only: Vec<String>,

    /// Override the recency window, in days
    #[arg(long, value_name = "DAYS")]
    pub recent_days: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["article_harvest"]);

        assert_eq!(cli.sources, "data/sources.json");
        assert_eq!(cli.corpus, "data/articles.json");
        assert_eq!(cli.run_log, "data/run.log");
        assert!(cli.config.is_none());
        assert!(cli.only.is_empty());
        assert!(cli.recent_days.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "article_harvest",
            "-s",
            "/tmp/sources.json",
            "-o",
            "/tmp/articles.json",
            "-r",
            "/tmp/run.log",
            "-c",
            "/tmp/harvest.yaml",
        ]);

        assert_eq!(cli.sources, "/tmp/sources.json");
        assert_eq!(cli.corpus, "/tmp/articles.json");
        assert_eq!(cli.run_log, "/tmp/run.log");
        assert_eq!(cli.config.as_deref(), Some("/tmp/harvest.yaml"));
    }

    #[test]
    fn test_cli_repeated_only() {
        let cli = Cli::parse_from([
            "article_harvest",
            "--only",
            "fed",
            "--only",
            "nber",
            "--recent-days",
            "14",
        ]);

        assert_eq!(cli.only, vec!["fed".to_string(), "nber".to_string()]);
        assert_eq!(cli.recent_days, Some(14));
    }
}
