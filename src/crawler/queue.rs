//! Bounded job queue between the list producer and the worker pool
//!
//! One [`JobSender`] (owned by the producer) and any number of cloned
//! [`JobReceiver`]s (one per worker). Each job is delivered to exactly one
//! receiver. Only the producer can close the queue, and closing consumes the
//! sender, so a send after close cannot be written.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// A discovered ad URL waiting for a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub url: String,
}

impl Job {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Result of a cancellable send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// A worker (or the buffer) took the job
    Sent,
    /// The run was cancelled while waiting for capacity
    Cancelled,
    /// Every receiver is gone
    Closed,
}

/// Creates a queue holding at most `capacity` jobs that no worker has taken
///
/// A capacity of 0 is raised to 1, the smallest buffer a tokio channel
/// supports.
pub fn job_queue(capacity: usize) -> (JobSender, JobReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        JobSender { tx, sent: 0 },
        JobReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producer half of the job queue
#[derive(Debug)]
pub struct JobSender {
    tx: mpsc::Sender<Job>,
    sent: u64,
}

impl JobSender {
    /// Sends a job, waiting for capacity unless `token` is cancelled first
    ///
    /// Cancellation wins when both are ready, so no job is handed over after
    /// the run has been cancelled.
    pub async fn send(&mut self, job: Job, token: &CancellationToken) -> SendOutcome {
        if token.is_cancelled() {
            return SendOutcome::Cancelled;
        }

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => SendOutcome::Cancelled,
            result = self.tx.send(job) => match result {
                Ok(()) => SendOutcome::Sent,
                Err(_) => SendOutcome::Closed,
            },
        };

        if outcome == SendOutcome::Sent {
            self.sent += 1;
        }
        outcome
    }

    /// Number of jobs handed over so far
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Closes the queue and returns the number of jobs sent
    ///
    /// Buffered jobs are still delivered; receivers see the end of the queue
    /// once the buffer is empty.
    pub fn close(self) -> u64 {
        self.sent
    }
}

/// Consumer half of the job queue, cloned once per worker
#[derive(Debug, Clone)]
pub struct JobReceiver {
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
}

impl JobReceiver {
    /// Waits for the next job
    ///
    /// Returns `None` when `token` is cancelled or when the queue is closed
    /// and drained.
    pub async fn recv(&self, token: &CancellationToken) -> Option<Job> {
        if token.is_cancelled() {
            return None;
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => None,
            job = async {
                let mut rx = self.rx.lock().await;
                rx.recv().await
            } => job,
        }
    }
}
