// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Database handle and schema migration.

use crate::StoreError;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tg_core::Clock;

/// Telegraph tables plus the orchestrator tables the Watcher reads.
///
/// The orchestrator tables are created here only so tests and local runs
/// work against an empty file; production deployments point Telegraph at
/// the orchestrator's existing database and these statements are no-ops.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS dispatch_sessions (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    source             TEXT NOT NULL,
    user_name          TEXT NOT NULL,
    channel_id         TEXT NOT NULL,
    platform_thread_id TEXT NOT NULL,
    status             TEXT NOT NULL,
    cars_created       TEXT NOT NULL DEFAULT '[]',
    last_heartbeat     INTEGER NOT NULL,
    created_at         INTEGER NOT NULL,
    completed_at       INTEGER
);
CREATE INDEX IF NOT EXISTS idx_dispatch_sessions_thread
    ON dispatch_sessions (channel_id, platform_thread_id, status);

CREATE TABLE IF NOT EXISTS telegraph_conversations (
    session_id      INTEGER NOT NULL,
    sequence        INTEGER NOT NULL,
    role            TEXT NOT NULL,
    user_name       TEXT NOT NULL DEFAULT '',
    content         TEXT NOT NULL,
    platform_msg_id TEXT,
    cars_referenced TEXT NOT NULL DEFAULT '[]',
    created_at      INTEGER NOT NULL,
    UNIQUE (session_id, sequence)
);

CREATE TABLE IF NOT EXISTS cars (
    id           TEXT PRIMARY KEY,
    status       TEXT NOT NULL,
    track        TEXT NOT NULL DEFAULT '',
    title        TEXT NOT NULL DEFAULT '',
    car_type     TEXT NOT NULL DEFAULT '',
    created_at   INTEGER NOT NULL DEFAULT 0,
    claimed_at   INTEGER,
    completed_at INTEGER
);

CREATE TABLE IF NOT EXISTS engines (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    status      TEXT NOT NULL,
    current_car TEXT
);

CREATE TABLE IF NOT EXISTS messages (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    from_agent   TEXT NOT NULL DEFAULT '',
    to_agent     TEXT NOT NULL,
    subject      TEXT NOT NULL DEFAULT '',
    body         TEXT NOT NULL DEFAULT '',
    priority     TEXT NOT NULL DEFAULT 'normal',
    acknowledged INTEGER NOT NULL DEFAULT 0,
    created_at   INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS agent_log (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    engine      TEXT NOT NULL DEFAULT '',
    action      TEXT NOT NULL DEFAULT '',
    tokens_used INTEGER NOT NULL DEFAULT 0,
    created_at  INTEGER NOT NULL DEFAULT 0
);
";

/// Shared store handle.
///
/// Cheap to clone; all clones share one serialised connection.
pub struct Store<C: Clock> {
    pub(crate) conn: Arc<Mutex<Connection>>,
    pub(crate) clock: C,
}

impl<C: Clock> Clone for Store<C> {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            clock: self.clock.clone(),
        }
    }
}

impl<C: Clock> Store<C> {
    /// Open (or create) the database at `path` and run the migration.
    pub fn open(path: &Path, clock: C) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Self::with_connection(conn, clock)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory(clock: C) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, clock)
    }

    fn with_connection(conn: Connection, clock: C) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            clock,
        })
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

/// Encode a car-id list as the compact JSON array literal stored in TEXT
/// columns. Empty input stores `"[]"`.
pub(crate) fn encode_json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Decode a JSON array column; malformed data reads as empty.
pub(crate) fn decode_json_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Convert a stored epoch-seconds value back to a timestamp.
pub(crate) fn from_epoch(secs: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
