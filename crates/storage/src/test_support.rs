// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seeding helpers for orchestrator tables, used by this crate's tests and
//! (behind the `test-support` feature) by the engine crate's tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::db::Store;
use crate::StoreError;
use rusqlite::params;
use tg_core::Clock;

impl<C: Clock> Store<C> {
    /// Insert or replace a car row.
    pub fn seed_car(&self, id: &str, status: &str, track: &str, title: &str) -> Result<(), StoreError> {
        let now = self.clock.now().timestamp();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO cars (id, status, track, title, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, status, track, title, now],
        )?;
        Ok(())
    }

    /// Update one car's status.
    pub fn set_car_status(&self, id: &str, status: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE cars SET status = ?1 WHERE id = ?2",
            params![status, id],
        )?;
        Ok(())
    }

    /// Stamp claim/completion times on a car (epoch seconds).
    pub fn set_car_times(
        &self,
        id: &str,
        claimed_at: Option<i64>,
        completed_at: Option<i64>,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE cars SET claimed_at = ?1, completed_at = ?2 WHERE id = ?3",
            params![claimed_at, completed_at, id],
        )?;
        Ok(())
    }

    /// Remove a car row entirely.
    pub fn delete_car(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM cars WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Insert an engine row, returning its id.
    pub fn seed_engine(&self, name: &str, status: &str) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO engines (name, status) VALUES (?1, ?2)",
            params![name, status],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Update one engine's status.
    pub fn set_engine_status(&self, id: i64, status: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE engines SET status = ?1 WHERE id = ?2",
            params![status, id],
        )?;
        Ok(())
    }

    /// Insert an orchestrator message row, returning its id.
    pub fn seed_message(
        &self,
        to_agent: &str,
        subject: &str,
        body: &str,
        priority: &str,
    ) -> Result<i64, StoreError> {
        let now = self.clock.now().timestamp();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO messages (from_agent, to_agent, subject, body, priority, created_at)
             VALUES ('engine-1', ?1, ?2, ?3, ?4, ?5)",
            params![to_agent, subject, body, priority, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Read back a message's acknowledged flag.
    pub fn message_acknowledged(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let acked: i64 = conn.query_row(
            "SELECT acknowledged FROM messages WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(acked != 0)
    }

    /// Insert an agent-log row (stall markers, token usage).
    pub fn seed_agent_log(
        &self,
        engine: &str,
        action: &str,
        tokens_used: i64,
    ) -> Result<(), StoreError> {
        let now = self.clock.now().timestamp();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO agent_log (engine, action, tokens_used, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![engine, action, tokens_used, now],
        )?;
        Ok(())
    }
}
