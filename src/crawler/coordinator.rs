//! Pipeline coordinator - wiring of one crawl run
//!
//! A run takes one seed URL through the whole pipeline:
//! - Spawns the worker pool on a bounded job queue
//! - Drives the list producer for the seed
//! - Watches the run scope for cancellation and the run timeout
//! - Joins every worker before reporting the summary

use crate::config::{CrawlerConfig, StallPolicy};
use crate::crawler::producer::{ListProducer, ProducerReport};
use crate::crawler::progress::ProgressController;
use crate::crawler::queue::job_queue;
use crate::crawler::worker::{Worker, WorkerReport};
use crate::crawler::PageFetcher;
use crate::state::RunPhase;
use crate::storage::SharedStore;
use crate::SweepError;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Parameters of one run, supplied as a plain value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub worker_count: usize,
    pub max_ad_count: Option<u64>,
    pub frame_budget: u32,
    pub fetch_timeout: Duration,
    pub run_timeout: Option<Duration>,
    pub queue_capacity: usize,
    pub stall_policy: StallPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            max_ad_count: None,
            frame_budget: 10,
            fetch_timeout: Duration::from_secs(15),
            run_timeout: None,
            queue_capacity: 1,
            stall_policy: StallPolicy::Continue,
        }
    }
}

impl RunConfig {
    pub fn from_crawler(config: &CrawlerConfig) -> Self {
        Self {
            worker_count: config.worker_count as usize,
            max_ad_count: config.max_ad_count,
            frame_budget: config.frame_budget,
            fetch_timeout: Duration::from_millis(config.fetch_timeout_ms),
            run_timeout: config.run_timeout_secs.map(Duration::from_secs),
            queue_capacity: config.queue_capacity as usize,
            stall_policy: config.stall_policy,
        }
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The producer ran out of frames or links and the queue drained
    Exhausted,
    /// The success limit was met
    LimitReached,
    /// Shutdown was requested from outside the run
    Interrupted,
    /// The run timeout elapsed
    TimedOut,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exhausted => "exhausted",
            Self::LimitReached => "limit reached",
            Self::Interrupted => "interrupted",
            Self::TimedOut => "timed out",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final counters of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub seed_url: String,
    pub success_count: u64,
    pub fail_count: u64,
    pub duplicate_count: u64,
    /// Records fetched after the limit was already taken
    pub surplus_count: u64,
    pub jobs_enqueued: u64,
    pub frames_loaded: u32,
    pub duration: Duration,
    pub stop_reason: StopReason,
}

impl RunSummary {
    /// Jobs that were taken by a worker and reached an outcome
    pub fn processed(&self) -> u64 {
        self.success_count + self.fail_count + self.duplicate_count + self.surplus_count
    }
}

/// Crawl pipeline for one source
pub struct Pipeline {
    fetcher: Arc<dyn PageFetcher>,
    store: SharedStore,
    config: RunConfig,
    phase: watch::Sender<RunPhase>,
}

impl Pipeline {
    pub fn new(fetcher: Arc<dyn PageFetcher>, store: SharedStore, config: RunConfig) -> Self {
        let (phase, _) = watch::channel(RunPhase::Starting);
        Self {
            fetcher,
            store,
            config,
            phase,
        }
    }

    /// Subscribes to the run phase
    pub fn phase_watch(&self) -> watch::Receiver<RunPhase> {
        self.phase.subscribe()
    }

    fn set_phase(&self, next: RunPhase) {
        let current = *self.phase.borrow();
        if current == next {
            return;
        }
        if current.can_transition_to(next) {
            tracing::debug!("Run phase {} -> {}", current, next);
            self.phase.send_replace(next);
        } else {
            tracing::warn!("Ignoring run phase transition {} -> {}", current, next);
        }
    }

    /// Crawls one seed and blocks until every worker has returned
    ///
    /// The run stops early when `shutdown` is cancelled, when the success
    /// limit is met, or when the run timeout elapses. Cancelling `shutdown`
    /// more than once is harmless.
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - The run finished, however many jobs failed
    /// * `Err(SweepError::SeedNavigation)` - The seed listing could not be
    ///   opened; returned after the workers have exited
    pub async fn run(
        &self,
        seed_url: &str,
        shutdown: &CancellationToken,
    ) -> Result<RunSummary, SweepError> {
        let started = Instant::now();
        self.phase.send_replace(RunPhase::Starting);

        let run_token = shutdown.child_token();
        let progress = Arc::new(ProgressController::new(self.config.max_ad_count));
        let (jobs_tx, jobs_rx) = job_queue(self.config.queue_capacity);

        let worker_count = self.config.worker_count.max(1);
        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            let worker = Worker {
                id,
                fetcher: Arc::clone(&self.fetcher),
                store: Arc::clone(&self.store),
                progress: Arc::clone(&progress),
                jobs: jobs_rx.clone(),
                fetch_timeout: self.config.fetch_timeout,
            };
            workers.spawn(worker.run(run_token.clone()));
        }
        drop(jobs_rx);

        tracing::info!("Crawling {} with {} workers", seed_url, worker_count);
        self.set_phase(RunPhase::Running);

        let producer = ListProducer {
            fetcher: self.fetcher.as_ref(),
            frame_budget: self.config.frame_budget,
            fetch_timeout: self.config.fetch_timeout,
            stall_policy: self.config.stall_policy,
        };
        let produce = producer.run(seed_url, jobs_tx, &run_token);
        tokio::pin!(produce);

        let run_timeout = self.config.run_timeout;
        let deadline = async move {
            match run_timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let mut produced: Option<Result<ProducerReport, _>> = None;
        let mut workers_done = false;
        let mut cancelled = false;
        let mut timed_out = false;
        let mut reports: Vec<WorkerReport> = Vec::with_capacity(worker_count);

        while produced.is_none() || !workers_done {
            tokio::select! {
                result = &mut produce, if produced.is_none() => {
                    produced = Some(result);
                    self.set_phase(RunPhase::Draining);
                }
                joined = workers.join_next(), if !workers_done => match joined {
                    Some(Ok(report)) => reports.push(report),
                    Some(Err(e)) => tracing::error!("Worker task failed: {}", e),
                    None => workers_done = true,
                },
                _ = run_token.cancelled(), if !cancelled => {
                    cancelled = true;
                    self.set_phase(RunPhase::Draining);
                }
                _ = &mut deadline, if !timed_out => {
                    timed_out = true;
                    tracing::warn!("Run for {} timed out, draining", seed_url);
                    run_token.cancel();
                }
            }
        }

        self.set_phase(RunPhase::Finished);
        let duration = started.elapsed();

        let report = match produced {
            Some(Ok(report)) => report,
            Some(Err(source)) => {
                tracing::error!("Cannot open seed listing {}: {}", seed_url, source);
                return Err(SweepError::SeedNavigation {
                    url: seed_url.to_string(),
                    source,
                });
            }
            None => ProducerReport::default(),
        };

        let stop_reason = if progress.limit_reached() {
            StopReason::LimitReached
        } else if shutdown.is_cancelled() {
            StopReason::Interrupted
        } else if timed_out {
            StopReason::TimedOut
        } else {
            StopReason::Exhausted
        };

        let snapshot = progress.snapshot();
        tracing::debug!(
            "Workers processed {} jobs",
            reports.iter().map(|r| r.processed).sum::<u64>()
        );

        Ok(RunSummary {
            seed_url: seed_url.to_string(),
            success_count: snapshot.success,
            fail_count: snapshot.fail,
            duplicate_count: snapshot.duplicate,
            surplus_count: snapshot.surplus,
            jobs_enqueued: report.jobs_sent,
            frames_loaded: report.frames_loaded,
            duration,
            stop_reason,
        })
    }
}
