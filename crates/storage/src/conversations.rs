// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable, monotonically-sequenced conversation log.
//!
//! Sequence numbers are computed as `MAX(sequence) + 1` with a fresh read
//! and no transaction. That is safe only under the single-instance
//! deployment model; a multi-writer deployment would need a per-session
//! counter or row lock around the compute-and-insert.

use crate::db::{decode_json_list, encode_json_list, from_epoch, Store};
use crate::locks::session_from_row;
use crate::StoreError;
use rusqlite::{params, Row};
use tg_core::{Clock, ConversationTurn, DispatchSession, Role, ThreadKey};

fn turn_from_row(row: &Row<'_>) -> rusqlite::Result<ConversationTurn> {
    let role: String = row.get("role")?;
    let cars: String = row.get("cars_referenced")?;
    Ok(ConversationTurn {
        session_id: row.get("session_id")?,
        sequence: row.get("sequence")?,
        role: Role::parse(&role).unwrap_or(Role::User),
        user_name: row.get("user_name")?,
        content: row.get("content")?,
        platform_msg_id: row.get("platform_msg_id")?,
        cars_referenced: decode_json_list(&cars),
        created_at: from_epoch(row.get("created_at")?),
    })
}

impl<C: Clock> Store<C> {
    /// Append one turn to a session's conversation.
    ///
    /// Fails with [`StoreError::MaxTurnsExceeded`] before writing anything
    /// once the session holds `max_turns` rows.
    pub fn write_turn(
        &self,
        session_id: i64,
        role: Role,
        user_name: &str,
        content: &str,
        platform_msg_id: Option<&str>,
        cars_referenced: &[String],
        max_turns: i64,
    ) -> Result<ConversationTurn, StoreError> {
        let now = self.clock.now();
        let conn = self.conn.lock();

        let sequence: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sequence), 0) + 1
             FROM telegraph_conversations WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        if sequence > max_turns {
            return Err(StoreError::MaxTurnsExceeded {
                session_id,
                max: max_turns,
            });
        }

        conn.execute(
            "INSERT INTO telegraph_conversations
                 (session_id, sequence, role, user_name, content,
                  platform_msg_id, cars_referenced, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                session_id,
                sequence,
                role.as_str(),
                user_name,
                content,
                platform_msg_id,
                encode_json_list(cars_referenced),
                now.timestamp(),
            ],
        )?;

        Ok(ConversationTurn {
            session_id,
            sequence,
            role,
            user_name: user_name.to_string(),
            content: content.to_string(),
            platform_msg_id: platform_msg_id.map(String::from),
            cars_referenced: cars_referenced.to_vec(),
            created_at: now,
        })
    }

    /// All turns of one session, ordered by sequence.
    pub fn load_history(&self, session_id: i64) -> Result<Vec<ConversationTurn>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT * FROM telegraph_conversations
             WHERE session_id = ?1 ORDER BY sequence",
        )?;
        let turns = stmt
            .query_map(params![session_id], turn_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(turns)
    }

    /// Number of turns recorded for a session.
    pub fn turn_count(&self, session_id: i64) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM telegraph_conversations WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Turns of every session on this thread created within the lookback
    /// window, ordered by `(session_id, sequence)`.
    ///
    /// This is the primary source for resume prompts; callers fall back to
    /// platform thread history when it comes back empty.
    pub fn thread_turns(
        &self,
        key: &ThreadKey,
        lookback_days: i64,
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        let since = self.clock.now().timestamp() - lookback_days * 86_400;
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT c.* FROM telegraph_conversations c
             JOIN dispatch_sessions s ON s.id = c.session_id
             WHERE s.channel_id = ?1 AND s.platform_thread_id = ?2
               AND s.created_at >= ?3
             ORDER BY c.session_id, c.sequence",
        )?;
        let turns = stmt
            .query_map(params![key.channel_id, key.thread_id, since], turn_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(turns)
    }

    /// Sessions recorded for a thread, oldest first. Admin/introspection.
    pub fn thread_sessions(&self, key: &ThreadKey) -> Result<Vec<DispatchSession>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT * FROM dispatch_sessions
             WHERE channel_id = ?1 AND platform_thread_id = ?2
             ORDER BY id",
        )?;
        let sessions = stmt
            .query_map(params![key.channel_id, key.thread_id], session_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions)
    }

    /// Admin op: delete all sessions and turns recorded for a thread.
    ///
    /// Returns `(sessions_deleted, turns_deleted)`.
    pub fn clear_session_history(&self, key: &ThreadKey) -> Result<(usize, usize), StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let turns = tx.execute(
            "DELETE FROM telegraph_conversations
             WHERE session_id IN (
                 SELECT id FROM dispatch_sessions
                 WHERE channel_id = ?1 AND platform_thread_id = ?2
             )",
            params![key.channel_id, key.thread_id],
        )?;
        let sessions = tx.execute(
            "DELETE FROM dispatch_sessions
             WHERE channel_id = ?1 AND platform_thread_id = ?2",
            params![key.channel_id, key.thread_id],
        )?;
        tx.commit()?;
        tracing::info!(%key, sessions, turns, "cleared session history");
        Ok((sessions, turns))
    }
}

#[cfg(test)]
#[path = "conversations_tests.rs"]
mod tests;
