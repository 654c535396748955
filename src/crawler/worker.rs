//! Detail-page worker
//!
//! Each worker takes one job at a time from the queue, fetches the ad page,
//! and hands the record to the dedup store. Every job it takes ends in
//! exactly one counter of the progress controller.

use crate::crawler::progress::ProgressController;
use crate::crawler::queue::{Job, JobReceiver};
use crate::crawler::{FetchError, PageFetcher};
use crate::record::AdRecord;
use crate::state::WorkerState;
use crate::storage::{SharedStore, StoreError, StoreResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// How one job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Stored,
    /// Stored, and this record met the success limit
    LimitReached,
    Duplicate,
    /// Fetched after the limit was met; discarded
    Surplus,
    Failed,
}

/// What a worker did before it stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub id: usize,
    pub processed: u64,
}

pub struct Worker {
    pub id: usize,
    pub fetcher: Arc<dyn PageFetcher>,
    pub store: SharedStore,
    pub progress: Arc<ProgressController>,
    pub jobs: JobReceiver,
    pub fetch_timeout: Duration,
}

impl Worker {
    /// Takes jobs until the queue is drained or `token` is cancelled
    ///
    /// A worker whose record meets the success limit cancels `token` itself.
    pub async fn run(self, token: CancellationToken) -> WorkerReport {
        let mut state = WorkerState::Idle;
        let mut report = WorkerReport {
            id: self.id,
            processed: 0,
        };

        while let Some(job) = self.jobs.recv(&token).await {
            if token.is_cancelled() {
                tracing::trace!("Worker {} dropping {} after cancellation", self.id, job.url);
                break;
            }

            self.advance(&mut state, WorkerState::Fetching);
            let outcome = self.process(&job).await;
            report.processed += 1;

            let settled = match outcome {
                JobOutcome::Failed => WorkerState::Failure,
                _ => WorkerState::Success,
            };
            self.advance(&mut state, settled);
            self.advance(&mut state, WorkerState::Idle);

            if outcome == JobOutcome::LimitReached {
                tracing::info!("Worker {} stored the last ad allowed, stopping the run", self.id);
                token.cancel();
                break;
            }
        }

        self.advance(&mut state, WorkerState::Stopped);
        tracing::debug!("Worker {} stopped after {} jobs", self.id, report.processed);
        report
    }

    /// Fetches one job and records its outcome
    pub async fn process(&self, job: &Job) -> JobOutcome {
        let record = match self.fetch(&job.url).await {
            Ok(record) => record,
            Err(e) => {
                if e.is_soft() {
                    tracing::debug!("Skipping {}: {}", job.url, e);
                } else {
                    tracing::warn!("Fetch failed: {}", e);
                }
                self.progress.record_failure();
                return JobOutcome::Failed;
            }
        };

        let Some(slot) = self.progress.reserve().await else {
            tracing::debug!("Ad limit already met, discarding {}", job.url);
            self.progress.record_surplus();
            return JobOutcome::Surplus;
        };

        match self.store(record).await {
            Ok(id) => {
                tracing::debug!("Stored {} as {}", job.url, id);
                if slot.commit() {
                    JobOutcome::LimitReached
                } else {
                    JobOutcome::Stored
                }
            }
            Err(e) if e.is_duplicate() => {
                tracing::info!("Duplicate ad {} ({})", job.url, e);
                slot.release_duplicate();
                JobOutcome::Duplicate
            }
            Err(e) => {
                tracing::error!("Failed to store {}: {}", job.url, e);
                slot.release_failure();
                JobOutcome::Failed
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<AdRecord, FetchError> {
        match timeout(self.fetch_timeout, self.fetcher.fetch_detail(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        }
    }

    /// Writes through the shared store on the blocking pool
    async fn store(&self, record: AdRecord) -> StoreResult<String> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let mut store = store.lock().map_err(|_| StoreError::Lock)?;
            store.put(&record)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    fn advance(&self, state: &mut WorkerState, next: WorkerState) {
        if state.can_transition_to(next) {
            tracing::trace!("Worker {}: {} -> {}", self.id, state, next);
            *state = next;
        } else {
            tracing::warn!("Worker {}: ignoring transition {} -> {}", self.id, state, next);
        }
    }
}
