// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage error types.

use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another user already holds the dispatch lease for the thread.
    #[error("dispatch lock held by {holder_name} (session {holder_id})")]
    LockHeld {
        holder_name: String,
        holder_id: i64,
    },

    /// Release or heartbeat on a session that is missing or not active.
    #[error("session {0} not found or not active")]
    NotFoundOrInactive(i64),

    /// The conversation hit its turn cap; nothing was written.
    #[error("session {session_id} reached the {max} turn cap")]
    MaxTurnsExceeded { session_id: i64, max: i64 },

    /// Lookup of a session that does not exist.
    #[error("session {0} not found")]
    SessionNotFound(i64),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}
