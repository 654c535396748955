//! Deterministic page fetcher for pipeline tests

use async_trait::async_trait;
use estate_sweep::crawler::{FetchError, ListingSession, PageFetcher};
use estate_sweep::storage::{AdStore, SqliteAdStore, StoreResult};
use estate_sweep::AdRecord;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// What fetching a detail URL yields
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    /// A record unique to this URL
    Success,
    /// A navigation failure
    Fail,
    /// A page of the wrong category
    Mismatch,
    /// A record whose content is shared by every URL with the same title
    SameContent(&'static str),
}

pub struct FakeFetcher {
    /// Links visible after each load, cumulative per frame
    frames: Vec<Vec<String>>,
    outcomes: HashMap<String, FakeOutcome>,
    fail_open: bool,
    detail_delay: Duration,
    url_delays: HashMap<String, Duration>,
    /// When set, every detail fetch waits for a permit
    gate: Option<Arc<Semaphore>>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl FakeFetcher {
    /// One frame per entry of `frames`
    pub fn with_frames(frames: Vec<Vec<String>>) -> Self {
        Self {
            frames,
            outcomes: HashMap::new(),
            fail_open: false,
            detail_delay: Duration::ZERO,
            url_delays: HashMap::new(),
            gate: None,
            fetched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// All `urls` on the seed page, every other frame empty
    pub fn with_links(urls: &[String]) -> Self {
        Self::with_frames(vec![urls.to_vec()])
    }

    pub fn outcome(mut self, url: &str, outcome: FakeOutcome) -> Self {
        self.outcomes.insert(url.to_string(), outcome);
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.detail_delay = delay;
        self
    }

    /// Extra delay before the fetch of `url` completes
    pub fn delay_url(mut self, url: &str, delay: Duration) -> Self {
        self.url_delays.insert(url.to_string(), delay);
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Shared log of the detail URLs whose fetch started
    pub fn fetched_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.fetched)
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn open_listing(&self, seed_url: &str) -> Result<Box<dyn ListingSession>, FetchError> {
        if self.fail_open {
            return Err(FetchError::Navigation {
                url: seed_url.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(Box::new(FakeListing {
            frames: self.frames.clone(),
            revealed: 0,
        }))
    }

    async fn fetch_detail(&self, url: &str) -> Result<AdRecord, FetchError> {
        self.fetched.lock().unwrap().push(url.to_string());

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if !self.detail_delay.is_zero() {
            tokio::time::sleep(self.detail_delay).await;
        }
        if let Some(delay) = self.url_delays.get(url) {
            tokio::time::sleep(*delay).await;
        }

        match self.outcomes.get(url).cloned().unwrap_or(FakeOutcome::Success) {
            FakeOutcome::Success => Ok(AdRecord::new(url, "apartment", url)),
            FakeOutcome::Fail => Err(FetchError::Navigation {
                url: url.to_string(),
                message: "reset by peer".to_string(),
            }),
            FakeOutcome::Mismatch => Err(FetchError::CategoryMismatch {
                url: url.to_string(),
                expected: "apartment".to_string(),
            }),
            FakeOutcome::SameContent(title) => Ok(AdRecord::new(url, "apartment", title)),
        }
    }
}

struct FakeListing {
    frames: Vec<Vec<String>>,
    revealed: usize,
}

#[async_trait]
impl ListingSession for FakeListing {
    async fn content_height(&mut self) -> Result<u64, FetchError> {
        Ok(self.revealed as u64)
    }

    async fn load_more(&mut self) -> Result<(), FetchError> {
        if self.revealed + 1 < self.frames.len() {
            self.revealed += 1;
        }
        Ok(())
    }

    async fn extract_links(&mut self) -> Result<Vec<String>, FetchError> {
        Ok(self.frames.iter().take(self.revealed + 1).flatten().cloned().collect())
    }
}

/// `https://fake.example/ad/1` .. `/ad/n`
pub fn ad_urls(n: usize) -> Vec<String> {
    (1..=n)
        .map(|i| format!("https://fake.example/ad/{}", i))
        .collect()
}

/// In-memory store whose writes block for `delay`
pub struct SlowStore {
    inner: SqliteAdStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: SqliteAdStore::new_in_memory().unwrap(),
            delay,
        }
    }

    /// Stores `record` up front, without the delay
    pub fn with_record(mut self, record: &AdRecord) -> Self {
        self.inner.put(record).unwrap();
        self
    }
}

impl AdStore for SlowStore {
    fn put(&mut self, record: &AdRecord) -> StoreResult<String> {
        std::thread::sleep(self.delay);
        self.inner.put(record)
    }

    fn contains(&self, id: &str) -> StoreResult<bool> {
        self.inner.contains(id)
    }

    fn count_ads(&self) -> StoreResult<u64> {
        self.inner.count_ads()
    }
}
