//! Run summaries and the report built from them
//!
//! The pipeline yields one [`RunSummary`] per seed. This module prints them
//! and folds them into a [`SweepReport`] for the markdown export.

use crate::crawler::RunSummary;
use crate::storage::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Every run of one invocation
#[derive(Debug, Clone)]
pub struct SweepReport {
    /// When the report was built (RFC 3339)
    pub generated_at: String,
    pub config_hash: String,
    pub runs: Vec<RunSummary>,
}

impl SweepReport {
    pub fn new(config_hash: impl Into<String>, runs: Vec<RunSummary>) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            config_hash: config_hash.into(),
            runs,
        }
    }

    pub fn total_success(&self) -> u64 {
        self.runs.iter().map(|r| r.success_count).sum()
    }

    pub fn total_fail(&self) -> u64 {
        self.runs.iter().map(|r| r.fail_count).sum()
    }

    pub fn total_duplicates(&self) -> u64 {
        self.runs.iter().map(|r| r.duplicate_count).sum()
    }

    pub fn total_processed(&self) -> u64 {
        self.runs.iter().map(RunSummary::processed).sum()
    }

    pub fn total_duration(&self) -> Duration {
        self.runs.iter().map(|r| r.duration).sum()
    }

    /// Stored ads as a percentage of processed jobs
    pub fn success_rate(&self) -> f64 {
        let processed = self.total_processed();
        if processed == 0 {
            return 0.0;
        }
        (self.total_success() as f64 / processed as f64) * 100.0
    }
}

/// Prints one run summary to stdout
pub fn print_run_summary(summary: &RunSummary) {
    println!("=== Run: {} ===", summary.seed_url);
    println!("  Stopped: {}", summary.stop_reason);
    println!("  Frames loaded: {}", summary.frames_loaded);
    println!("  Jobs enqueued: {}", summary.jobs_enqueued);
    println!("  Stored: {}", summary.success_count);
    println!("  Failed: {}", summary.fail_count);
    println!("  Duplicates: {}", summary.duplicate_count);
    if summary.surplus_count > 0 {
        println!("  Discarded past limit: {}", summary.surplus_count);
    }
    println!("  Duration: {:.1}s", summary.duration.as_secs_f64());
    println!();
}
