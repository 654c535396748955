//! Storage module for persisting accepted ads
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Content-addressed ad storage with duplicate rejection
//! - Run tracking for the summary and stats views

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteAdStore;
pub use traits::{AdStore, RunLedger, StoreError, StoreResult};

use crate::crawler::StopReason;
use std::sync::{Arc, Mutex};

/// Store handle shared by all workers of a run
pub type SharedStore = Arc<Mutex<dyn AdStore + Send>>;

/// Wraps a store so it can be handed to a pipeline
pub fn shared<S: AdStore + Send + 'static>(store: S) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// An ad as read back from the database
#[derive(Debug, Clone)]
pub struct StoredAd {
    pub id: String,
    pub url: String,
    pub category: String,
    pub title: String,
    pub price: Option<u64>,
    pub area_sqm: Option<f64>,
    pub rooms: Option<u32>,
    pub location: Option<String>,
    pub amenities: Vec<String>,
    pub contact: Option<String>,
    pub reference: Option<String>,
    pub stored_at: String,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub seed_url: String,
    pub status: RunStatus,
    pub success_count: u64,
    pub fail_count: u64,
    pub duplicate_count: u64,
    pub surplus_count: u64,
    pub jobs_enqueued: u64,
    pub duration_ms: Option<u64>,
    pub error_message: Option<String>,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    LimitReached,
    Interrupted,
    TimedOut,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::LimitReached => "limit_reached",
            Self::Interrupted => "interrupted",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "limit_reached" => Some(Self::LimitReached),
            "interrupted" => Some(Self::Interrupted),
            "timed_out" => Some(Self::TimedOut),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl From<StopReason> for RunStatus {
    fn from(reason: StopReason) -> Self {
        match reason {
            StopReason::Exhausted => Self::Completed,
            StopReason::LimitReached => Self::LimitReached,
            StopReason::Interrupted => Self::Interrupted,
            StopReason::TimedOut => Self::TimedOut,
        }
    }
}
