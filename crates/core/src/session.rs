// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch session and conversation records.
//!
//! A dispatch session binds one chat thread to one agent subprocess run.
//! The `status = active` row doubles as the cross-process lease on the
//! thread; see the storage crate for the acquisition protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key identifying a conversation location on the platform.
///
/// Top-level dispatches that could not open a dedicated thread use the
/// channel id as the thread id, so the key is always fully populated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadKey {
    pub channel_id: String,
    pub thread_id: String,
}

impl ThreadKey {
    pub fn new(channel_id: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            thread_id: thread_id.into(),
        }
    }
}

impl std::fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.channel_id, self.thread_id)
    }
}

/// Lifecycle status of a dispatch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Expired,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SessionStatus::Active),
            "completed" => Some(SessionStatus::Completed),
            "expired" => Some(SessionStatus::Expired),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted dispatch session row.
///
/// Invariant: at most one `active` row per [`ThreadKey`]; `completed_at`
/// is set exactly when the status is not `active`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSession {
    pub id: i64,
    /// Origin tag, e.g. "telegraph" for chat dispatches or "local".
    pub source: String,
    pub user_name: String,
    pub channel_id: String,
    pub platform_thread_id: String,
    pub status: SessionStatus,
    pub cars_created: Vec<String>,
    pub last_heartbeat: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Author role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One turn of a persisted conversation.
///
/// `sequence` is dense and starts at 1 within a session. Synthetic rows
/// recovered from platform thread history have `session_id = 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub session_id: i64,
    pub sequence: i64,
    pub role: Role,
    /// Empty for assistant turns.
    pub user_name: String,
    pub content: String,
    pub platform_msg_id: Option<String>,
    pub cars_referenced: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
