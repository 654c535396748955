//! Crawler module: the concurrent crawl pipeline
//!
//! This module contains the core crawling logic, including:
//! - The bounded job queue between producer and workers
//! - The list producer revealing listing frames
//! - The detail-page worker pool
//! - Progress counters and the success limit
//! - Shutdown coordination and run wiring
//! - The page fetcher capability and its HTTP adapter

mod coordinator;
mod fetcher;
mod parser;
mod producer;
mod progress;
mod queue;
mod shutdown;
mod worker;

pub use coordinator::{Pipeline, RunConfig, RunSummary, StopReason};
pub use fetcher::{build_http_client, FetchError, HttpPageFetcher, ListingSession, PageFetcher};
pub use parser::{extract_ad_links, extract_ad_record, find_next_link, SiteSelectors};
pub use producer::{ListProducer, ProducerReport};
pub use progress::{CrawlSnapshot, ProgressController, Reservation, SuccessSlot};
pub use queue::{job_queue, Job, JobReceiver, JobSender, SendOutcome};
pub use shutdown::{wait_for_signal, ShutdownCoordinator};
pub use worker::{JobOutcome, Worker, WorkerReport};

use crate::config::{validate, Config};
use crate::storage::{RunLedger, SharedStore, SqliteAdStore, StoreError};
use crate::SweepError;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Runs every configured seed through the pipeline
///
/// This is the main entry point for a crawl. It will:
/// 1. Validate the configuration and open the ad database
/// 2. Build one HTTP fetcher per source
/// 3. Run the seeds one after another, recording each run
/// 4. Stop starting new seeds once `shutdown` is triggered
///
/// A seed whose listing cannot be opened is recorded as failed and the next
/// seed proceeds.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration file, stored with each run
/// * `shutdown` - Process-wide shutdown coordinator
///
/// # Returns
///
/// * `Ok(Vec<RunSummary>)` - One summary per completed run
/// * `Err(SweepError)` - The configuration is invalid, or storage or client
///   setup failed
pub async fn crawl(
    config: &Config,
    config_hash: &str,
    shutdown: &ShutdownCoordinator,
) -> crate::Result<Vec<RunSummary>> {
    validate(config)?;

    let database = Arc::new(Mutex::new(SqliteAdStore::new(Path::new(
        &config.output.database_path,
    ))?));
    let store: SharedStore = database.clone();
    let run_config = RunConfig::from_crawler(&config.crawler);

    let mut summaries = Vec::new();

    'sources: for source in &config.sources {
        let fetcher = Arc::new(HttpPageFetcher::new(
            source,
            &config.user_agent,
            run_config.fetch_timeout,
        )?);
        let pipeline = Pipeline::new(fetcher, Arc::clone(&store), run_config.clone());

        for seed in &source.seeds {
            if shutdown.is_triggered() {
                tracing::info!("Shutdown requested, not starting remaining seeds");
                break 'sources;
            }

            tracing::info!("Source {} ({}): seed {}", source.name, source.category, seed);
            let (hash, seed_url) = (config_hash.to_string(), seed.clone());
            let run_id =
                with_ledger(&database, move |ledger| ledger.create_run(&hash, &seed_url)).await?;

            match pipeline.run(seed, shutdown.token()).await {
                Ok(summary) => {
                    tracing::info!(
                        "Run {} finished ({}): {} stored, {} failed, {} duplicates",
                        run_id,
                        summary.stop_reason,
                        summary.success_count,
                        summary.fail_count,
                        summary.duplicate_count
                    );
                    let finished = summary.clone();
                    with_ledger(&database, move |ledger| ledger.finish_run(run_id, &finished))
                        .await?;
                    summaries.push(summary);
                }
                Err(e) => {
                    tracing::error!("Run {} for {} failed: {}", run_id, seed, e);
                    let message = e.to_string();
                    with_ledger(&database, move |ledger| ledger.fail_run(run_id, &message))
                        .await?;
                }
            }
        }
    }

    Ok(summaries)
}

/// Runs a ledger write on the blocking pool
async fn with_ledger<T, F>(database: &Arc<Mutex<SqliteAdStore>>, f: F) -> Result<T, SweepError>
where
    T: Send + 'static,
    F: FnOnce(&mut SqliteAdStore) -> Result<T, StoreError> + Send + 'static,
{
    let database = Arc::clone(database);
    let result = tokio::task::spawn_blocking(move || {
        let mut guard = database.lock().map_err(|_| StoreError::Lock)?;
        f(&mut guard)
    })
    .await
    .map_err(|e| StoreError::Task(e.to_string()))?;
    Ok(result?)
}
