//! Statistics from the ad database
//!
//! This module provides functionality for extracting and displaying
//! store statistics for the `--stats` mode.

use crate::output::summary::OutputResult;
use crate::storage::{AdStore, RunLedger, RunRecord};

/// How many recent runs the statistics view lists
pub const RECENT_RUN_LIMIT: u32 = 10;

/// Store statistics summary
#[derive(Debug, Clone)]
pub struct AdStatistics {
    /// Total number of stored ads
    pub total_ads: u64,

    /// Stored ads per category, largest first
    pub ads_by_category: Vec<(String, u64)>,

    /// Most recent runs, newest first
    pub recent_runs: Vec<RunRecord>,
}

/// Loads statistics from the store
///
/// # Returns
///
/// * `Ok(AdStatistics)` - Successfully loaded statistics
/// * `Err(OutputError)` - Failed to query statistics
pub fn load_statistics<S>(store: &S) -> OutputResult<AdStatistics>
where
    S: AdStore + RunLedger,
{
    Ok(AdStatistics {
        total_ads: store.count_ads()?,
        ads_by_category: store.count_ads_by_category()?,
        recent_runs: store.list_runs(RECENT_RUN_LIMIT)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &AdStatistics) {
    println!("=== Ad Statistics ===\n");

    println!("Overview:");
    println!("  Total ads stored: {}", stats.total_ads);
    println!();

    if !stats.ads_by_category.is_empty() {
        println!("Ads by Category:");
        for (category, count) in &stats.ads_by_category {
            let percentage = if stats.total_ads > 0 {
                (*count as f64 / stats.total_ads as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", category, count, percentage);
        }
        println!();
    }

    if stats.recent_runs.is_empty() {
        println!("No runs recorded yet");
        return;
    }

    println!("Recent Runs ({}):", stats.recent_runs.len());
    for run in &stats.recent_runs {
        println!(
            "  #{} {} [{}] stored {}, failed {}, duplicates {}",
            run.id,
            run.seed_url,
            run.status.to_db_string(),
            run.success_count,
            run.fail_count,
            run.duplicate_count
        );
        if let Some(error) = &run.error_message {
            println!("      error: {}", error);
        }
    }
}
