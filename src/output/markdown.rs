//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of one
//! invocation: totals first, then a table with one row per seed.

use crate::output::summary::{OutputResult, SweepReport};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of `report` to `output_path`
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(report: &SweepReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a report as markdown
pub fn format_markdown_summary(report: &SweepReport) -> String {
    let mut md = String::new();

    md.push_str("# Estate-Sweep Crawl Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Generated**: {}\n", report.generated_at));
    md.push_str(&format!("- **Config Hash**: {}\n", report.config_hash));
    md.push_str(&format!("- **Seeds Crawled**: {}\n\n", report.runs.len()));

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Ads Stored**: {}\n", report.total_success()));
    md.push_str(&format!("- **Failed Pages**: {}\n", report.total_fail()));
    md.push_str(&format!("- **Duplicates**: {}\n", report.total_duplicates()));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        report.success_rate()
    ));
    md.push_str(&format!(
        "- **Total Duration**: {:.1} seconds\n\n",
        report.total_duration().as_secs_f64()
    ));

    if !report.runs.is_empty() {
        md.push_str("## Runs\n\n");
        md.push_str("| Seed | Stopped | Frames | Jobs | Stored | Failed | Duplicates | Duration |\n");
        md.push_str("|------|---------|--------|------|--------|--------|------------|----------|\n");
        for run in &report.runs {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {:.1}s |\n",
                run.seed_url,
                run.stop_reason,
                run.frames_loaded,
                run.jobs_enqueued,
                run.success_count,
                run.fail_count,
                run.duplicate_count,
                run.duration.as_secs_f64()
            ));
        }
        md.push('\n');
    }

    md
}
