//! Output module for run summaries and reports
//!
//! This module handles:
//! - Printing the summary of each run
//! - Generating the markdown summary of an invocation
//! - Store statistics for the `--stats` mode

mod markdown;
pub mod stats;
mod summary;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{load_statistics, print_statistics, AdStatistics};
pub use summary::{print_run_summary, OutputError, OutputResult, SweepReport};
