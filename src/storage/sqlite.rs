//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the storage traits.

use crate::crawler::RunSummary;
use crate::record::AdRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{AdStore, RunLedger, StoreError, StoreResult};
use crate::storage::{RunRecord, RunStatus, StoredAd};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, seed_url, status,
     success_count, fail_count, duplicate_count, surplus_count, jobs_enqueued,
     duration_ms, error_message";

/// SQLite storage backend
pub struct SqliteAdStore {
    conn: Connection,
}

impl SqliteAdStore {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            config_hash: row.get(3)?,
            seed_url: row.get(4)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
                .unwrap_or(RunStatus::Failed),
            success_count: row.get(6)?,
            fail_count: row.get(7)?,
            duplicate_count: row.get(8)?,
            surplus_count: row.get(9)?,
            jobs_enqueued: row.get(10)?,
            duration_ms: row.get(11)?,
            error_message: row.get(12)?,
        })
    }
}

impl AdStore for SqliteAdStore {
    fn put(&mut self, record: &AdRecord) -> StoreResult<String> {
        let id = record.content_hash();
        let now = Utc::now().to_rfc3339();

        let inserted = self.conn.execute(
            "INSERT INTO ads (id, url, category, title, price, area_sqm, rooms, location,
             amenities, contact, reference, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(id) DO NOTHING",
            params![
                id,
                record.url,
                record.category,
                record.title,
                record.price,
                record.area_sqm,
                record.rooms,
                record.location,
                record.amenities.join("\n"),
                record.contact,
                record.reference,
                now
            ],
        )?;

        if inserted == 0 {
            return Err(StoreError::Duplicate { id });
        }

        Ok(id)
    }

    fn contains(&self, id: &str) -> StoreResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM ads WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    fn count_ads(&self) -> StoreResult<u64> {
        let count: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM ads", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl RunLedger for SqliteAdStore {
    fn create_run(&mut self, config_hash: &str, seed_url: &str) -> StoreResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, seed_url, status) VALUES (?1, ?2, ?3, ?4)",
            params![now, config_hash, seed_url, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(&mut self, run_id: i64, summary: &RunSummary) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();
        let status = RunStatus::from(summary.stop_reason);
        let duration_ms = u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX);

        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, success_count = ?3, fail_count = ?4,
             duplicate_count = ?5, surplus_count = ?6, jobs_enqueued = ?7, duration_ms = ?8
             WHERE id = ?9",
            params![
                status.to_db_string(),
                now,
                summary.success_count,
                summary.fail_count,
                summary.duplicate_count,
                summary.surplus_count,
                summary.jobs_enqueued,
                duration_ms,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StoreError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn fail_run(&mut self, run_id: i64, error: &str) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, error_message = ?3 WHERE id = ?4",
            params![RunStatus::Failed.to_db_string(), now, error, run_id],
        )?;

        if updated == 0 {
            return Err(StoreError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StoreResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], Self::run_from_row)
            .optional()?
            .ok_or(StoreError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StoreResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        let run = self.conn.query_row(&sql, [], Self::run_from_row).optional()?;
        Ok(run)
    }

    fn list_runs(&self, limit: u32) -> StoreResult<Vec<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT ?1", RUN_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let runs = stmt
            .query_map(params![limit], Self::run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    fn count_ads_by_category(&self) -> StoreResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*) FROM ads GROUP BY category ORDER BY COUNT(*) DESC, category",
        )?;
        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    fn get_ad(&self, id: &str) -> StoreResult<Option<StoredAd>> {
        let ad = self
            .conn
            .query_row(
                "SELECT id, url, category, title, price, area_sqm, rooms, location, amenities,
                 contact, reference, stored_at FROM ads WHERE id = ?1",
                params![id],
                |row| {
                    let amenities: String = row.get(8)?;
                    Ok(StoredAd {
                        id: row.get(0)?,
                        url: row.get(1)?,
                        category: row.get(2)?,
                        title: row.get(3)?,
                        price: row.get(4)?,
                        area_sqm: row.get(5)?,
                        rooms: row.get(6)?,
                        location: row.get(7)?,
                        amenities: amenities
                            .lines()
                            .filter(|line| !line.is_empty())
                            .map(str::to_string)
                            .collect(),
                        contact: row.get(9)?,
                        reference: row.get(10)?,
                        stored_at: row.get(11)?,
                    })
                },
            )
            .optional()?;
        Ok(ad)
    }
}
