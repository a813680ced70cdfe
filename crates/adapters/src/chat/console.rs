// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Console chat adapter.
//!
//! Line-oriented local adapter for running the daemon without a platform
//! SDK: stdin lines become top-level inbound messages tagged `"local"`,
//! outbound messages print to stdout. No threads, no history.

use super::{ChatAdapter, ChatError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tg_core::{InboundMessage, OutboundMessage, ThreadMessage};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const CHANNEL: &str = "console";

#[derive(Clone, Default)]
pub struct ConsoleChatAdapter {
    connected: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
    listening: Arc<Mutex<bool>>,
}

impl ConsoleChatAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_open(&self) -> Result<(), ChatError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChatError::Closed);
        }
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ChatError::NotConnected);
        }
        Ok(())
    }
}

#[async_trait]
impl ChatAdapter for ConsoleChatAdapter {
    async fn connect(&self) -> Result<(), ChatError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChatError::Closed);
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn listen(&self) -> Result<mpsc::Receiver<InboundMessage>, ChatError> {
        self.check_open()?;
        {
            let mut listening = self.listening.lock();
            if *listening {
                return Err(ChatError::SendFailed("already listening".to_string()));
            }
            *listening = true;
        }

        let (tx, rx) = mpsc::channel(64);
        let closed = Arc::clone(&self.closed);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let line = tokio::select! {
                    line = lines.next_line() => line,
                    _ = tx.closed() => break,
                };
                if closed.load(Ordering::SeqCst) {
                    break;
                }
                let Ok(Some(line)) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let msg = InboundMessage {
                    platform: "console".to_string(),
                    channel_id: CHANNEL.to_string(),
                    thread_id: String::new(),
                    message_id: uuid::Uuid::new_v4().to_string(),
                    user_id: "local".to_string(),
                    user_name: "local".to_string(),
                    text: line,
                    timestamp: chrono::Utc::now(),
                };
                if tx.send(msg).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChatError> {
        self.check_open()?;
        if !msg.text.is_empty() {
            if msg.thread_id.is_empty() {
                println!("[{}] {}", msg.channel_id, msg.text);
            } else {
                println!("[{}/{}] {}", msg.channel_id, msg.thread_id, msg.text);
            }
        }
        for event in &msg.events {
            println!("[{}] {} {}", msg.channel_id, event.severity, event.title);
            if !event.body.is_empty() {
                println!("  {}", event.body.replace('\n', "\n  "));
            }
            for field in &event.fields {
                println!("  {}: {}", field.name, field.value);
            }
        }
        Ok(())
    }

    async fn thread_history(
        &self,
        _channel_id: &str,
        _thread_id: &str,
        _limit: usize,
    ) -> Result<Vec<ThreadMessage>, ChatError> {
        self.check_open()?;
        Ok(Vec::new())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "console_tests.rs"]
mod tests;
