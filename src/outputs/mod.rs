//! Persistent outputs: the article corpus and the daily run log.
//!
//! # Submodules
//!
//! - [`corpus`]: Loads and atomically replaces the JSON corpus
//! - [`run_log`]: Maintains one summary line per calendar date
//!
//! # Output Structure
//!
//! ```text
//! data/
//! ├── articles.json   # sorted, deduplicated corpus
//! └── run.log         # 2025-05-06: Failed sources: ...
//! ```

pub mod corpus;
pub mod run_log;
