//! Storage traits and error types
//!
//! [`AdStore`] is the dedup store the workers write to. [`RunLedger`] keeps
//! one row per crawl run and is used by the outer crawl loop, never by the
//! pipeline itself.

use crate::crawler::RunSummary;
use crate::record::AdRecord;
use crate::storage::{RunRecord, StoredAd};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record's content hash is already stored
    #[error("Duplicate content hash: {id}")]
    Duplicate { id: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Store lock poisoned")]
    Lock,

    #[error("Store task failed: {0}")]
    Task(String),
}

impl StoreError {
    /// Returns true for the duplicate sentinel, false for genuine faults
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Content-addressed store of ad records
///
/// Implementations key records by [`AdRecord::content_hash`]. A second
/// `put` of a record with the same hash must fail with
/// [`StoreError::Duplicate`] and leave the stored record untouched.
pub trait AdStore {
    /// Stores a record and returns its id (the content hash)
    fn put(&mut self, record: &AdRecord) -> StoreResult<String>;

    /// Returns true if a record with this id is stored
    fn contains(&self, id: &str) -> StoreResult<bool>;

    /// Counts stored records
    fn count_ads(&self) -> StoreResult<u64>;
}

/// Bookkeeping of crawl runs
pub trait RunLedger {
    /// Opens a run for a seed and returns its id
    fn create_run(&mut self, config_hash: &str, seed_url: &str) -> StoreResult<i64>;

    /// Records the final counters of a run
    fn finish_run(&mut self, run_id: i64, summary: &RunSummary) -> StoreResult<()>;

    /// Marks a run as failed without a summary
    fn fail_run(&mut self, run_id: i64, error: &str) -> StoreResult<()>;

    fn get_run(&self, run_id: i64) -> StoreResult<RunRecord>;

    fn get_latest_run(&self) -> StoreResult<Option<RunRecord>>;

    /// Lists the most recent runs, newest first
    fn list_runs(&self, limit: u32) -> StoreResult<Vec<RunRecord>>;

    /// Counts stored ads per category, largest first
    fn count_ads_by_category(&self) -> StoreResult<Vec<(String, u64)>>;

    /// Loads a stored ad by id
    fn get_ad(&self, id: &str) -> StoreResult<Option<StoredAd>>;
}
