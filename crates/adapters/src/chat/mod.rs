// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat platform adapters.
//!
//! [`ChatAdapter`] is the only platform-coupled boundary the core knows
//! about. Slack/Discord SDK integrations implement it externally; the
//! in-tree [`ConsoleChatAdapter`] covers local runs and the fake covers
//! tests. Rate limiting is an adapter-internal concern: implementations
//! surface [`ChatError::RateLimited`] and callers wrap platform calls in
//! [`with_backoff`].

mod console;
mod retry;

pub use console::ConsoleChatAdapter;
pub use retry::{with_backoff, BackoffPolicy};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeChatAdapter, StartThreadCall};

use async_trait::async_trait;
use std::time::Duration;
use tg_core::{InboundMessage, OutboundMessage, ThreadMessage};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from chat platform operations
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("adapter not connected")]
    NotConnected,
    #[error("adapter closed")]
    Closed,
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("history fetch failed: {0}")]
    HistoryFailed(String),
    #[error("thread create failed: {0}")]
    ThreadFailed(String),
}

/// Adapter for a chat platform (Slack, Discord, console).
///
/// `connect` must succeed before any other call. `close` is idempotent and
/// fails every later call with [`ChatError::Closed`]. The stream returned
/// by `listen` closes on adapter close; delivery is at-most-once.
#[async_trait]
pub trait ChatAdapter: Clone + Send + Sync + 'static {
    /// Establish the platform connection. Idempotent.
    async fn connect(&self) -> Result<(), ChatError>;

    /// Start receiving messages. The receiver closes when the adapter does.
    async fn listen(&self) -> Result<mpsc::Receiver<InboundMessage>, ChatError>;

    /// Deliver a message. Best-effort; permanent failures return an error.
    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChatError>;

    /// Fetch thread history, oldest first. `limit = 0` means all.
    async fn thread_history(
        &self,
        channel_id: &str,
        thread_id: &str,
        limit: usize,
    ) -> Result<Vec<ThreadMessage>, ChatError>;

    /// Tear down the connection. Idempotent.
    async fn close(&self);

    /// The bot's own user id, for self-filtering. `None` when unknown.
    fn bot_user_id(&self) -> Option<String> {
        None
    }

    /// Create a thread under `channel_id`, posting `reply_text` as its
    /// first message. `Ok(None)` when the platform has no threads.
    async fn start_thread(
        &self,
        channel_id: &str,
        reply_text: &str,
        thread_name: &str,
    ) -> Result<Option<String>, ChatError> {
        let _ = (channel_id, reply_text, thread_name);
        Ok(None)
    }
}
