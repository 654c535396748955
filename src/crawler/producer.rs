//! List producer
//!
//! Reveals up to `frame_budget` frames of a seed listing and feeds every
//! previously unseen ad link into the job queue. Frame 0 is the seed page as
//! first loaded; every later frame first asks the page for more content.

use crate::config::StallPolicy;
use crate::crawler::queue::{Job, JobSender, SendOutcome};
use crate::crawler::{FetchError, ListingSession, PageFetcher};
use crate::url::normalize_url;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// What the producer did for one seed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerReport {
    /// Frames whose links were extracted
    pub frames_loaded: u32,
    /// Distinct ad links seen
    pub links_discovered: u64,
    /// Jobs handed to the queue
    pub jobs_sent: u64,
}

pub struct ListProducer<'a> {
    pub fetcher: &'a dyn PageFetcher,
    pub frame_budget: u32,
    pub fetch_timeout: Duration,
    pub stall_policy: StallPolicy,
}

impl ListProducer<'_> {
    /// Runs the frame loop for one seed and closes the queue
    ///
    /// The queue is closed on every path, including the error path. The only
    /// error is failing to open the seed listing.
    pub async fn run(
        &self,
        seed_url: &str,
        mut jobs: JobSender,
        token: &CancellationToken,
    ) -> Result<ProducerReport, FetchError> {
        let mut report = ProducerReport::default();

        if token.is_cancelled() {
            jobs.close();
            return Ok(report);
        }

        let mut session = match self.open(seed_url).await {
            Ok(session) => session,
            Err(e) => {
                jobs.close();
                return Err(e);
            }
        };

        let mut seen = HashSet::new();
        let mut last_height = None;

        'frames: for frame in 0..self.frame_budget {
            if token.is_cancelled() {
                tracing::debug!("Producer for {} cancelled before frame {}", seed_url, frame);
                break;
            }

            if frame > 0 {
                match self.reveal_more(seed_url, session.as_mut(), &mut last_height).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!("Frame {} of {} revealed nothing new", frame, seed_url);
                        match self.stall_policy {
                            StallPolicy::Continue => continue,
                            StallPolicy::Stop => break,
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Frame {} of {} failed: {}", frame, seed_url, e);
                        continue;
                    }
                }
            } else {
                last_height = self.height(seed_url, session.as_mut()).await.ok();
            }

            let links = match self.with_timeout(seed_url, session.extract_links()).await {
                Ok(links) => links,
                Err(e) => {
                    tracing::warn!("Link extraction on frame {} of {} failed: {}", frame, seed_url, e);
                    continue;
                }
            };
            report.frames_loaded += 1;

            let mut fresh = 0u64;
            for link in links {
                let url = match normalize_url(&link) {
                    Ok(url) => url.to_string(),
                    Err(e) => {
                        tracing::trace!("Skipping link {}: {}", link, e);
                        continue;
                    }
                };

                if !seen.insert(url.clone()) {
                    continue;
                }
                report.links_discovered += 1;
                fresh += 1;

                match jobs.send(Job::new(url), token).await {
                    SendOutcome::Sent => {}
                    SendOutcome::Cancelled => {
                        tracing::debug!("Producer for {} cancelled while sending", seed_url);
                        break 'frames;
                    }
                    SendOutcome::Closed => {
                        tracing::debug!("All workers gone, producer for {} stops", seed_url);
                        break 'frames;
                    }
                }
            }

            tracing::debug!(
                "Frame {} of {}: {} new links ({} total)",
                frame,
                seed_url,
                fresh,
                report.links_discovered
            );
        }

        report.jobs_sent = jobs.close();
        tracing::info!(
            "Discovery for {} finished: {} frames, {} links, {} jobs",
            seed_url,
            report.frames_loaded,
            report.links_discovered,
            report.jobs_sent
        );
        Ok(report)
    }

    async fn open(&self, seed_url: &str) -> Result<Box<dyn ListingSession>, FetchError> {
        self.with_timeout(seed_url, self.fetcher.open_listing(seed_url))
            .await
    }

    /// Triggers more content and reports whether the height changed
    async fn reveal_more(
        &self,
        seed_url: &str,
        session: &mut dyn ListingSession,
        last_height: &mut Option<u64>,
    ) -> Result<bool, FetchError> {
        let before = match *last_height {
            Some(height) => height,
            None => self.height(seed_url, session).await?,
        };

        self.with_timeout(seed_url, session.load_more()).await?;

        let after = self.height(seed_url, session).await?;
        *last_height = Some(after);
        Ok(after != before)
    }

    async fn height(
        &self,
        seed_url: &str,
        session: &mut dyn ListingSession,
    ) -> Result<u64, FetchError> {
        self.with_timeout(seed_url, session.content_height()).await
    }

    async fn with_timeout<T, F>(&self, url: &str, fut: F) -> Result<T, FetchError>
    where
        F: std::future::Future<Output = Result<T, FetchError>>,
    {
        match timeout(self.fetch_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}
