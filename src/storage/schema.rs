//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Estate-Sweep database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs, one per seed URL
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    seed_url TEXT NOT NULL,
    status TEXT NOT NULL,
    success_count INTEGER NOT NULL DEFAULT 0,
    fail_count INTEGER NOT NULL DEFAULT 0,
    duplicate_count INTEGER NOT NULL DEFAULT 0,
    surplus_count INTEGER NOT NULL DEFAULT 0,
    jobs_enqueued INTEGER NOT NULL DEFAULT 0,
    duration_ms INTEGER,
    error_message TEXT
);

-- Ads keyed by the content hash of their business fields
CREATE TABLE IF NOT EXISTS ads (
    id TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    category TEXT NOT NULL,
    title TEXT NOT NULL,
    price INTEGER,
    area_sqm REAL,
    rooms INTEGER,
    location TEXT,
    amenities TEXT NOT NULL DEFAULT '',
    contact TEXT,
    reference TEXT,
    stored_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ads_category ON ads(category);
CREATE INDEX IF NOT EXISTS idx_ads_url ON ads(url);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
