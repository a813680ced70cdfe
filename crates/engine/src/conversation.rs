// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversation recording and recovery.
//!
//! Wraps the storage turn log with the adapter-facing halves of the
//! conversation contract: assistant turns are echoed to the thread in
//! size-limited chunks (best-effort, never rolled back), and resume
//! prompts are rebuilt from the database with a platform-history fallback.

use crate::chunk::{split_message, MAX_CHUNK};
use tg_adapters::ChatAdapter;
use tg_core::config::ConvConfig;
use tg_core::{Clock, ConversationTurn, DispatchSession, OutboundMessage, Role, ThreadKey};
use tg_storage::{Store, StoreError};

/// Where recovered context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySource {
    /// Rows from our own conversation log.
    Database,
    /// Synthetic rows projected from platform thread history.
    PlatformFallback,
}

/// Turn log facade used by the session manager.
pub struct ConversationStore<A: ChatAdapter, C: Clock> {
    store: Store<C>,
    adapter: Option<A>,
    max_turns: i64,
    lookback_days: i64,
}

impl<A: ChatAdapter, C: Clock> Clone for ConversationStore<A, C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            adapter: self.adapter.clone(),
            max_turns: self.max_turns,
            lookback_days: self.lookback_days,
        }
    }
}

impl<A: ChatAdapter, C: Clock> ConversationStore<A, C> {
    pub fn new(store: Store<C>, adapter: Option<A>, config: &ConvConfig) -> Self {
        Self {
            store,
            adapter,
            max_turns: config.max_turns_per_session,
            lookback_days: config.recovery_lookback_days,
        }
    }

    /// Record a user turn. No echo: the message is already visible in the
    /// thread it came from.
    pub fn record_user(
        &self,
        session_id: i64,
        user_name: &str,
        content: &str,
        platform_msg_id: Option<&str>,
    ) -> Result<ConversationTurn, StoreError> {
        self.store.write_turn(
            session_id,
            Role::User,
            user_name,
            content,
            platform_msg_id,
            &[],
            self.max_turns,
        )
    }

    /// Record an assistant turn and deliver it to the session's thread.
    ///
    /// The database row stores the unchunked text; delivery splits it into
    /// chunks of at most [`MAX_CHUNK`] bytes, sent in order. Send failures
    /// are logged and never roll back the row.
    pub async fn record_assistant(
        &self,
        session: &DispatchSession,
        content: &str,
    ) -> Result<ConversationTurn, StoreError> {
        let turn = self.store.write_turn(
            session.id,
            Role::Assistant,
            "",
            content,
            None,
            &[],
            self.max_turns,
        )?;

        if let Some(adapter) = &self.adapter {
            for piece in split_message(content, MAX_CHUNK) {
                let msg = OutboundMessage::text(
                    session.channel_id.clone(),
                    session.platform_thread_id.clone(),
                    piece,
                );
                if let Err(e) = adapter.send(&msg).await {
                    tracing::warn!(
                        session_id = session.id,
                        error = %e,
                        "assistant echo failed; conversation row kept"
                    );
                }
            }
        }

        Ok(turn)
    }

    /// All turns of one session, ordered by sequence.
    pub fn load_history(&self, session_id: i64) -> Result<Vec<ConversationTurn>, StoreError> {
        self.store.load_history(session_id)
    }

    pub fn turn_count(&self, session_id: i64) -> Result<i64, StoreError> {
        self.store.turn_count(session_id)
    }

    /// Rebuild conversation context for a thread.
    ///
    /// Primary source: our own rows for sessions created within the
    /// lookback window. When that is empty and an adapter is configured,
    /// falls back to platform thread history (most recent 50 entries),
    /// projected as synthetic turns with no session. Entries the platform
    /// attributes to the bot itself are projected as assistant turns.
    pub async fn recover_from_thread(
        &self,
        key: &ThreadKey,
    ) -> Result<(Vec<ConversationTurn>, RecoverySource), StoreError> {
        let turns = self.store.thread_turns(key, self.lookback_days)?;
        if !turns.is_empty() {
            return Ok((turns, RecoverySource::Database));
        }

        let Some(adapter) = &self.adapter else {
            return Ok((Vec::new(), RecoverySource::Database));
        };
        let history = match adapter
            .thread_history(&key.channel_id, &key.thread_id, 50)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(%key, error = %e, "thread history fallback failed");
                return Ok((Vec::new(), RecoverySource::Database));
            }
        };
        if history.is_empty() {
            return Ok((Vec::new(), RecoverySource::Database));
        }

        let turns = history
            .into_iter()
            .enumerate()
            .map(|(i, entry)| ConversationTurn {
                session_id: 0,
                sequence: i as i64 + 1,
                role: if entry.is_bot { Role::Assistant } else { Role::User },
                user_name: entry.user_name,
                content: entry.text,
                platform_msg_id: None,
                cars_referenced: Vec::new(),
                created_at: entry.timestamp,
            })
            .collect();
        Ok((turns, RecoverySource::PlatformFallback))
    }

}

/// Render the spawn-time prompt for a resumed session.
pub fn render_recovery_prompt(
    turns: &[ConversationTurn],
    source: RecoverySource,
    user_name: &str,
    new_message: &str,
) -> String {
    let mut prompt = String::from(match source {
        RecoverySource::Database => "Previous conversation context:\n\n",
        RecoverySource::PlatformFallback => "Previous thread context (from chat platform):\n\n",
    });
    for turn in turns {
        prompt.push_str(&format!(
            "[{}] {}: {}\n",
            turn.role, turn.user_name, turn.content
        ));
    }
    if !new_message.is_empty() {
        prompt.push_str(&format!("\n[user] {}: {}", user_name, new_message));
    }
    prompt
}

#[cfg(test)]
#[path = "conversation_tests.rs"]
mod tests;
