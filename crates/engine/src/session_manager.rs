// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-thread dispatch session management.
//!
//! The manager owns the in-memory table of active sessions, keyed by
//! `(channel, thread)`. Each entry binds a DB session row (the lease) to a
//! one-shot agent subprocess, with two background tasks per session:
//! `relay_output` pumps the agent's stdout into the conversation log and
//! the chat thread, and `monitor_process` cleans up when the agent exits.
//!
//! Because processes are single-shot, an active session answers exactly
//! one `route`; follow-up messages find no entry and go through `resume`,
//! which replays recovered context as a spawn-time prompt.

use crate::conversation::{render_recovery_prompt, ConversationStore};
use crate::EngineError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tg_adapters::{ChatAdapter, Process, ProcessSpawner};
use tg_core::{Clock, DispatchSession, ThreadKey};
use tg_storage::Store;

/// Session manager settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Origin tag stamped on created sessions (e.g. "telegraph").
    pub source: String,
    /// Lease expiry threshold passed to lock acquisition.
    pub heartbeat_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            source: "telegraph".to_string(),
            heartbeat_timeout: Duration::from_secs(90),
        }
    }
}

struct ActiveSession<H> {
    session: DispatchSession,
    process: Arc<H>,
}

struct Inner<A: ChatAdapter, P: ProcessSpawner, C: Clock> {
    sessions: RwLock<HashMap<ThreadKey, ActiveSession<P::Handle>>>,
    store: Store<C>,
    conversations: ConversationStore<A, C>,
    spawner: P,
    config: SessionConfig,
}

/// Owns active dispatch sessions and their subprocess lifecycles.
pub struct SessionManager<A: ChatAdapter, P: ProcessSpawner, C: Clock> {
    inner: Arc<Inner<A, P, C>>,
}

impl<A: ChatAdapter, P: ProcessSpawner, C: Clock> Clone for SessionManager<A, P, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: ChatAdapter, P: ProcessSpawner, C: Clock> SessionManager<A, P, C> {
    pub fn new(
        store: Store<C>,
        conversations: ConversationStore<A, C>,
        spawner: P,
        config: SessionConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                sessions: RwLock::new(HashMap::new()),
                store,
                conversations,
                spawner,
                config,
            }),
        }
    }

    /// Start a new session: acquire the lease, spawn the agent, install
    /// the entry, and launch the relay and monitor tasks.
    ///
    /// The initial user message is not written here; callers invoke
    /// [`SessionManager::route`] next.
    pub async fn new_session(
        &self,
        user_name: &str,
        key: &ThreadKey,
    ) -> Result<DispatchSession, EngineError> {
        let session = self.inner.store.acquire_lock(
            &self.inner.config.source,
            user_name,
            &key.thread_id,
            &key.channel_id,
            self.inner.config.heartbeat_timeout,
        )?;

        let process = match self.inner.spawner.spawn("").await {
            Ok(process) => process,
            Err(e) => {
                self.release_quietly(session.id);
                return Err(EngineError::Process(e));
            }
        };

        self.install(key.clone(), session.clone(), process);
        Ok(session)
    }

    /// Deliver a user message to the thread's active session.
    ///
    /// Writes the user turn, sends the text to the subprocess (closing its
    /// stdin, which starts the agent), and refreshes the lease heartbeat.
    pub async fn route(
        &self,
        key: &ThreadKey,
        user_name: &str,
        text: &str,
    ) -> Result<(), EngineError> {
        let (session_id, process) = {
            let sessions = self.inner.sessions.read();
            let Some(entry) = sessions.get(key) else {
                return Err(EngineError::NoActiveSession(key.clone()));
            };
            (entry.session.id, Arc::clone(&entry.process))
        };

        self.inner
            .conversations
            .record_user(session_id, user_name, text, None)?;
        process.send(text).await?;
        self.inner.store.heartbeat(session_id)?;
        Ok(())
    }

    /// Resume a thread whose previous session has ended.
    ///
    /// Recovered context (database rows, falling back to platform thread
    /// history) is rendered into a prompt delivered at spawn time; the
    /// subprocess needs no subsequent `send`.
    pub async fn resume(
        &self,
        key: &ThreadKey,
        user_name: &str,
        new_message: &str,
    ) -> Result<DispatchSession, EngineError> {
        let (turns, source) = self.inner.conversations.recover_from_thread(key).await?;
        let prompt = render_recovery_prompt(&turns, source, user_name, new_message);

        let session = self.inner.store.acquire_lock(
            &self.inner.config.source,
            user_name,
            &key.thread_id,
            &key.channel_id,
            self.inner.config.heartbeat_timeout,
        )?;

        let process = match self.inner.spawner.spawn(&prompt).await {
            Ok(process) => process,
            Err(e) => {
                self.release_quietly(session.id);
                return Err(EngineError::Process(e));
            }
        };

        if !new_message.is_empty() {
            self.inner
                .conversations
                .record_user(session.id, user_name, new_message, None)?;
        }

        self.install(key.clone(), session.clone(), process);
        Ok(session)
    }

    /// Tear down a thread's active session and release its lease.
    pub async fn close_session(&self, key: &ThreadKey) -> Result<(), EngineError> {
        let entry = {
            let mut sessions = self.inner.sessions.write();
            sessions.remove(key)
        };
        let Some(entry) = entry else {
            return Err(EngineError::NoActiveSession(key.clone()));
        };
        entry.process.close().await;
        self.inner.store.release_lock(entry.session.id)?;
        Ok(())
    }

    /// Close every active session (daemon shutdown).
    pub async fn close_all(&self) {
        let keys: Vec<ThreadKey> = self.inner.sessions.read().keys().cloned().collect();
        for key in keys {
            if let Err(e) = self.close_session(&key).await {
                tracing::warn!(%key, error = %e, "failed to close session during shutdown");
            }
        }
    }

    /// In-memory check: does this thread have a live session?
    pub fn has_session(&self, key: &ThreadKey) -> bool {
        self.inner.sessions.read().contains_key(key)
    }

    /// DB check: does this thread have a resumable past?
    pub fn has_historic_session(&self, key: &ThreadKey) -> Result<bool, EngineError> {
        Ok(self
            .inner
            .store
            .has_historic_session(key, self.inner.config.heartbeat_timeout)?)
    }

    /// Number of live sessions.
    pub fn active_count(&self) -> usize {
        self.inner.sessions.read().len()
    }

    fn install(&self, key: ThreadKey, session: DispatchSession, process: P::Handle) {
        let process = Arc::new(process);
        let output = process.take_output();
        {
            let mut sessions = self.inner.sessions.write();
            sessions.insert(
                key.clone(),
                ActiveSession {
                    session: session.clone(),
                    process: Arc::clone(&process),
                },
            );
        }

        // relay_output: pump agent stdout into the log and the thread
        {
            let inner = Arc::clone(&self.inner);
            let session = session.clone();
            tokio::spawn(async move {
                let Some(mut rx) = output else { return };
                let mut lines: Vec<String> = Vec::new();
                while let Some(line) = rx.recv().await {
                    lines.push(line);
                }
                let text = lines.join("\n");
                let text = text.trim();
                if text.is_empty() {
                    return;
                }
                if let Err(e) = inner.conversations.record_assistant(&session, text).await {
                    tracing::error!(
                        session_id = session.id,
                        error = %e,
                        "failed to record assistant output"
                    );
                }
            });
        }

        // monitor_process: on exit, drop the entry and release the lease
        {
            let inner = Arc::clone(&self.inner);
            let session_id = session.id;
            tokio::spawn(async move {
                process.wait_done().await;
                let removed = {
                    let mut sessions = inner.sessions.write();
                    match sessions.get(&key) {
                        Some(entry) if entry.session.id == session_id => sessions.remove(&key),
                        _ => None,
                    }
                };
                if removed.is_some() {
                    match inner.store.release_lock(session_id) {
                        Ok(()) => {
                            tracing::debug!(session_id, %key, "session completed");
                        }
                        Err(e) => {
                            tracing::warn!(session_id, error = %e, "monitor failed to release lock");
                        }
                    }
                }
            });
        }
    }

    fn release_quietly(&self, session_id: i64) {
        if let Err(e) = self.inner.store.release_lock(session_id) {
            tracing::warn!(session_id, error = %e, "failed to release lock after spawn failure");
        }
    }
}

#[cfg(test)]
#[path = "session_manager_tests.rs"]
mod tests;
