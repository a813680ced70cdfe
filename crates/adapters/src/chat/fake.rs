// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake chat adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ChatAdapter, ChatError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tg_core::{InboundMessage, OutboundMessage, ThreadMessage};
use tokio::sync::{mpsc, Notify};

/// Recorded `start_thread` invocation
#[derive(Debug, Clone)]
pub struct StartThreadCall {
    pub channel_id: String,
    pub reply_text: String,
    pub thread_name: String,
    pub thread_id: String,
}

struct FakeChatState {
    connected: bool,
    closed: bool,
    bot_user_id: Option<String>,
    supports_threads: bool,
    fail_sends: bool,
    rate_limited_sends: u32,
    sends: Vec<OutboundMessage>,
    start_threads: Vec<StartThreadCall>,
    history: HashMap<(String, String), Vec<ThreadMessage>>,
    thread_counter: u32,
    inbound_tx: Option<mpsc::Sender<InboundMessage>>,
}

/// Fake chat adapter recording every outbound call.
#[derive(Clone)]
pub struct FakeChatAdapter {
    inner: Arc<Mutex<FakeChatState>>,
    send_notify: Arc<Notify>,
}

impl Default for FakeChatAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeChatState {
                connected: false,
                closed: false,
                bot_user_id: None,
                supports_threads: true,
                fail_sends: false,
                rate_limited_sends: 0,
                sends: Vec::new(),
                start_threads: Vec::new(),
                history: HashMap::new(),
                thread_counter: 0,
                inbound_tx: None,
            })),
            send_notify: Arc::new(Notify::new()),
        }
    }
}

impl FakeChatAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded sends, in order.
    pub fn sends(&self) -> Vec<OutboundMessage> {
        self.inner.lock().sends.clone()
    }

    /// Text of every recorded send, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.inner.lock().sends.iter().map(|m| m.text.clone()).collect()
    }

    /// All recorded `start_thread` calls.
    pub fn start_thread_calls(&self) -> Vec<StartThreadCall> {
        self.inner.lock().start_threads.clone()
    }

    pub fn set_bot_user_id(&self, id: impl Into<String>) {
        self.inner.lock().bot_user_id = Some(id.into());
    }

    /// Make `start_thread` report "unsupported" (`Ok(None)`).
    pub fn set_supports_threads(&self, supported: bool) {
        self.inner.lock().supports_threads = supported;
    }

    /// Make every subsequent `send` fail permanently.
    pub fn set_fail_sends(&self, fail: bool) {
        self.inner.lock().fail_sends = fail;
    }

    /// Make the next `n` sends fail with `RateLimited`.
    pub fn set_rate_limited_sends(&self, n: u32) {
        self.inner.lock().rate_limited_sends = n;
    }

    /// Seed platform history for a `(channel, thread)`.
    pub fn set_history(&self, channel_id: &str, thread_id: &str, msgs: Vec<ThreadMessage>) {
        self.inner
            .lock()
            .history
            .insert((channel_id.to_string(), thread_id.to_string()), msgs);
    }

    /// Deliver an inbound message to the listener, if any.
    pub async fn push_inbound(&self, msg: InboundMessage) {
        let tx = self.inner.lock().inbound_tx.clone();
        if let Some(tx) = tx {
            let _ = tx.send(msg).await;
        }
    }

    /// Block until at least `n` sends have been recorded.
    pub async fn wait_for_sends(&self, n: usize) {
        loop {
            if self.inner.lock().sends.len() >= n {
                return;
            }
            self.send_notify.notified().await;
        }
    }
}

#[async_trait]
impl ChatAdapter for FakeChatAdapter {
    async fn connect(&self) -> Result<(), ChatError> {
        let mut state = self.inner.lock();
        if state.closed {
            return Err(ChatError::Closed);
        }
        state.connected = true;
        Ok(())
    }

    async fn listen(&self) -> Result<mpsc::Receiver<InboundMessage>, ChatError> {
        let (tx, rx) = mpsc::channel(64);
        self.inner.lock().inbound_tx = Some(tx);
        Ok(rx)
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChatError> {
        {
            let mut state = self.inner.lock();
            if state.closed {
                return Err(ChatError::Closed);
            }
            if state.rate_limited_sends > 0 {
                state.rate_limited_sends -= 1;
                return Err(ChatError::RateLimited {
                    retry_after: Some(Duration::from_millis(1)),
                });
            }
            if state.fail_sends {
                return Err(ChatError::SendFailed("injected failure".to_string()));
            }
            state.sends.push(msg.clone());
        }
        self.send_notify.notify_waiters();
        Ok(())
    }

    async fn thread_history(
        &self,
        channel_id: &str,
        thread_id: &str,
        limit: usize,
    ) -> Result<Vec<ThreadMessage>, ChatError> {
        let state = self.inner.lock();
        if state.closed {
            return Err(ChatError::Closed);
        }
        let mut msgs = state
            .history
            .get(&(channel_id.to_string(), thread_id.to_string()))
            .cloned()
            .unwrap_or_default();
        if limit > 0 && msgs.len() > limit {
            msgs.truncate(limit);
        }
        Ok(msgs)
    }

    async fn close(&self) {
        let mut state = self.inner.lock();
        state.closed = true;
        state.inbound_tx = None;
    }

    fn bot_user_id(&self) -> Option<String> {
        self.inner.lock().bot_user_id.clone()
    }

    async fn start_thread(
        &self,
        channel_id: &str,
        reply_text: &str,
        thread_name: &str,
    ) -> Result<Option<String>, ChatError> {
        let mut state = self.inner.lock();
        if state.closed {
            return Err(ChatError::Closed);
        }
        if !state.supports_threads {
            return Ok(None);
        }
        state.thread_counter += 1;
        let thread_id = format!("thread-{}", state.thread_counter);
        state.start_threads.push(StartThreadCall {
            channel_id: channel_id.to_string(),
            reply_text: reply_text.to_string(),
            thread_name: thread_name.to_string(),
            thread_id: thread_id.clone(),
        });
        // The platform posts reply_text as the thread's first message
        state.sends.push(OutboundMessage::text(
            channel_id,
            thread_id.clone(),
            reply_text,
        ));
        drop(state);
        self.send_notify.notify_waiters();
        Ok(Some(thread_id))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
