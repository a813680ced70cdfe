// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DB-backed dispatch lease per `(channel, thread)`.
//!
//! The `status = active` row is the lock. Acquisition runs as one
//! transaction: expire stale holders, check for a live holder, insert the
//! new row. Under concurrent attempts exactly one insert commits; losers
//! observe the winner in the check step and fail with [`StoreError::LockHeld`].

use crate::db::{decode_json_list, from_epoch, Store};
use crate::StoreError;
use rusqlite::{params, OptionalExtension, Row};
use std::time::Duration;
use tg_core::{Clock, DispatchSession, SessionStatus, ThreadKey};

/// Default lease expiry threshold when the caller passes zero.
pub(crate) const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(90);

pub(crate) fn session_from_row(row: &Row<'_>) -> rusqlite::Result<DispatchSession> {
    let status: String = row.get("status")?;
    let cars: String = row.get("cars_created")?;
    Ok(DispatchSession {
        id: row.get("id")?,
        source: row.get("source")?,
        user_name: row.get("user_name")?,
        channel_id: row.get("channel_id")?,
        platform_thread_id: row.get("platform_thread_id")?,
        status: SessionStatus::parse(&status).unwrap_or(SessionStatus::Expired),
        cars_created: decode_json_list(&cars),
        last_heartbeat: from_epoch(row.get("last_heartbeat")?),
        created_at: from_epoch(row.get("created_at")?),
        completed_at: row
            .get::<_, Option<i64>>("completed_at")?
            .map(from_epoch),
    })
}

impl<C: Clock> Store<C> {
    /// Acquire the dispatch lease for a thread, creating the session row.
    ///
    /// `timeout` of zero means the 90 s default. The transaction first
    /// expires any active holder whose heartbeat is older than `timeout`,
    /// then fails if a live holder remains, then inserts the new session.
    pub fn acquire_lock(
        &self,
        source: &str,
        user_name: &str,
        thread_id: &str,
        channel_id: &str,
        timeout: Duration,
    ) -> Result<DispatchSession, StoreError> {
        let timeout = if timeout.is_zero() {
            DEFAULT_HEARTBEAT_TIMEOUT
        } else {
            timeout
        };
        let now = self.clock.now();
        let cutoff = now.timestamp() - timeout.as_secs() as i64;

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "UPDATE dispatch_sessions
             SET status = 'expired', completed_at = ?1
             WHERE status = 'active'
               AND channel_id = ?2 AND platform_thread_id = ?3
               AND last_heartbeat < ?4",
            params![now.timestamp(), channel_id, thread_id, cutoff],
        )?;

        let holder: Option<(i64, String)> = tx
            .query_row(
                "SELECT id, user_name FROM dispatch_sessions
                 WHERE status = 'active'
                   AND channel_id = ?1 AND platform_thread_id = ?2",
                params![channel_id, thread_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        if let Some((holder_id, holder_name)) = holder {
            // Dropping the transaction rolls back the expiry update too;
            // the holder we just saw is fresh, so nothing was expired.
            return Err(StoreError::LockHeld {
                holder_name,
                holder_id,
            });
        }

        tx.execute(
            "INSERT INTO dispatch_sessions
                 (source, user_name, channel_id, platform_thread_id,
                  status, cars_created, last_heartbeat, created_at)
             VALUES (?1, ?2, ?3, ?4, 'active', '[]', ?5, ?5)",
            params![source, user_name, channel_id, thread_id, now.timestamp()],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(session_id = id, channel_id, thread_id, user_name, "lock acquired");

        Ok(DispatchSession {
            id,
            source: source.to_string(),
            user_name: user_name.to_string(),
            channel_id: channel_id.to_string(),
            platform_thread_id: thread_id.to_string(),
            status: SessionStatus::Active,
            cars_created: Vec::new(),
            last_heartbeat: now,
            created_at: now,
            completed_at: None,
        })
    }

    /// Complete an active session, releasing its lease.
    ///
    /// A second release is an error, not a no-op.
    pub fn release_lock(&self, session_id: i64) -> Result<(), StoreError> {
        let now = self.clock.now();
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE dispatch_sessions
             SET status = 'completed', completed_at = ?1
             WHERE id = ?2 AND status = 'active'",
            params![now.timestamp(), session_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFoundOrInactive(session_id));
        }
        tracing::debug!(session_id, "lock released");
        Ok(())
    }

    /// Refresh an active session's lease.
    pub fn heartbeat(&self, session_id: i64) -> Result<(), StoreError> {
        let now = self.clock.now();
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE dispatch_sessions
             SET last_heartbeat = ?1
             WHERE id = ?2 AND status = 'active'",
            params![now.timestamp(), session_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFoundOrInactive(session_id));
        }
        Ok(())
    }

    /// Fetch a session row by id.
    pub fn get_session(&self, session_id: i64) -> Result<DispatchSession, StoreError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT * FROM dispatch_sessions WHERE id = ?1",
            params![session_id],
            session_from_row,
        )
        .optional()?
        .ok_or(StoreError::SessionNotFound(session_id))
    }

    /// Whether the thread has a past conversation worth resuming.
    ///
    /// Completed and expired sessions count, as do orphaned active rows
    /// whose heartbeat is older than `timeout` (their monitor died before
    /// releasing). An active session with a fresh heartbeat does not.
    pub fn has_historic_session(
        &self,
        key: &ThreadKey,
        timeout: Duration,
    ) -> Result<bool, StoreError> {
        let timeout = if timeout.is_zero() {
            DEFAULT_HEARTBEAT_TIMEOUT
        } else {
            timeout
        };
        let cutoff = self.clock.now().timestamp() - timeout.as_secs() as i64;
        let conn = self.conn.lock();
        let found: i64 = conn.query_row(
            "SELECT EXISTS (
                 SELECT 1 FROM dispatch_sessions
                 WHERE channel_id = ?1 AND platform_thread_id = ?2
                   AND (status IN ('completed', 'expired')
                        OR (status = 'active' AND last_heartbeat < ?3))
             )",
            params![key.channel_id, key.thread_id, cutoff],
            |row| row.get(0),
        )?;
        Ok(found != 0)
    }

    /// Append a created car to the session's `cars_created` list.
    pub fn record_car_created(&self, session_id: i64, car_id: &str) -> Result<(), StoreError> {
        let mut session = self.get_session(session_id)?;
        if session.cars_created.iter().any(|c| c == car_id) {
            return Ok(());
        }
        session.cars_created.push(car_id.to_string());
        let encoded = crate::db::encode_json_list(&session.cars_created);
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE dispatch_sessions SET cars_created = ?1 WHERE id = ?2",
            params![encoded, session_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
