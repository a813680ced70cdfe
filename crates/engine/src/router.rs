// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound message classification and dispatch.
//!
//! Policy, first match wins: self-filter, command, thread reply (active
//! session / historic session / addressed to the bot), top-level mention.
//! Commands never ack; every dispatch path acks exactly once before any
//! work begins. Top-level mentions get a dedicated thread when the
//! platform can create one, falling back to channel-keyed sessions.

use crate::acks::AckDeck;
use crate::chunk::{split_message, MAX_CHUNK};
use crate::commands::{is_command_word, CommandHandler};
use crate::session_manager::SessionManager;
use crate::EngineError;
use regex::Regex;
use tg_adapters::{ChatAdapter, ProcessSpawner};
use tg_core::{Clock, InboundMessage, OutboundMessage, ThreadKey};

/// Thread name used for dispatch threads created by the router.
const DISPATCH_THREAD_NAME: &str = "Dispatch";

/// How an inbound message was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The bot's own message; dropped.
    SelfMessage,
    /// A `!ry` query command.
    Command,
    /// A turn delivered to an active session.
    ActiveTurn,
    /// A follow-up that resumed a historic session.
    Resumed,
    /// A new dispatch session (in-thread or via a fresh thread).
    NewSession,
    /// Nothing to do.
    Ignored,
}

/// Classifies inbound messages and drives the session manager.
pub struct Router<A: ChatAdapter, P: ProcessSpawner, C: Clock> {
    adapter: A,
    sessions: SessionManager<A, P, C>,
    commands: CommandHandler<C>,
    acks: AckDeck,
    mention: Regex,
}

impl<A: ChatAdapter, P: ProcessSpawner, C: Clock> Router<A, P, C> {
    pub fn new(
        adapter: A,
        sessions: SessionManager<A, P, C>,
        commands: CommandHandler<C>,
    ) -> Self {
        // Discord-style mention markers: <@123> or <@!123>
        #[allow(clippy::unwrap_used)] // fixed pattern, covered by tests
        let mention = Regex::new(r"^<@!?\d+>\s*").unwrap();
        Self {
            adapter,
            sessions,
            commands,
            acks: AckDeck::new(),
            mention,
        }
    }

    /// Classify and act on one inbound message.
    ///
    /// Errors never escape: lock contention and adapter failures are
    /// logged and the message dropped.
    pub async fn handle(&self, msg: &InboundMessage) -> Disposition {
        // Self-filter: never react to our own messages
        if let Some(bot_id) = self.adapter.bot_user_id() {
            if msg.user_id == bot_id {
                return Disposition::SelfMessage;
            }
        }

        if let Some(input) = self.command_input(&msg.text) {
            let reply = self.commands.handle(&input);
            self.send_chunked(&msg.channel_id, &msg.thread_id, &reply)
                .await;
            return Disposition::Command;
        }

        if msg.is_top_level() {
            return self.handle_top_level(msg).await;
        }
        self.handle_thread_reply(msg).await
    }

    async fn handle_thread_reply(&self, msg: &InboundMessage) -> Disposition {
        let key = ThreadKey::new(&msg.channel_id, &msg.thread_id);

        if self.sessions.has_session(&key) {
            self.send_ack(&key).await;
            match self.sessions.route(&key, &msg.user_name, &msg.text).await {
                Ok(()) => return Disposition::ActiveTurn,
                Err(EngineError::NoActiveSession(_)) => {
                    // The process exited between the check and the route;
                    // recover through the resume path.
                    return self.resume(&key, msg).await;
                }
                Err(e) => {
                    tracing::warn!(%key, error = %e, "failed to route turn");
                    return Disposition::ActiveTurn;
                }
            }
        }

        match self.sessions.has_historic_session(&key) {
            Ok(true) => {
                self.send_ack(&key).await;
                return self.resume(&key, msg).await;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(%key, error = %e, "historic session check failed");
            }
        }

        if is_dispatch_text(&msg.text) {
            self.send_ack(&key).await;
            match self.sessions.new_session(&msg.user_name, &key).await {
                Ok(_) => {
                    if let Err(e) = self.sessions.route(&key, &msg.user_name, &msg.text).await {
                        tracing::warn!(%key, error = %e, "failed to route initial turn");
                    }
                }
                Err(e) if e.is_lock_held() => {
                    tracing::info!(%key, error = %e, "dispatch skipped, lock held");
                }
                Err(e) => {
                    tracing::warn!(%key, error = %e, "failed to open session");
                }
            }
            return Disposition::NewSession;
        }

        Disposition::Ignored
    }

    async fn handle_top_level(&self, msg: &InboundMessage) -> Disposition {
        if !is_dispatch_text(&msg.text) {
            return Disposition::Ignored;
        }

        // Every top-level mention gets its own conversation thread when
        // the platform can make one; the ack rides along as the thread's
        // first message.
        let ack = self.acks.next();
        let thread_id = match self
            .adapter
            .start_thread(&msg.channel_id, ack, DISPATCH_THREAD_NAME)
            .await
        {
            Ok(Some(thread_id)) => thread_id,
            Ok(None) => {
                self.send_text(&msg.channel_id, "", ack).await;
                msg.channel_id.clone()
            }
            Err(e) => {
                tracing::warn!(channel_id = %msg.channel_id, error = %e, "start_thread failed");
                self.send_text(&msg.channel_id, "", ack).await;
                msg.channel_id.clone()
            }
        };

        let key = ThreadKey::new(&msg.channel_id, thread_id);
        match self.sessions.new_session(&msg.user_name, &key).await {
            Ok(_) => {
                if let Err(e) = self.sessions.route(&key, &msg.user_name, &msg.text).await {
                    tracing::warn!(%key, error = %e, "failed to route initial turn");
                }
            }
            Err(e) if e.is_lock_held() => {
                tracing::info!(%key, error = %e, "dispatch skipped, lock held");
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "failed to open session");
            }
        }
        Disposition::NewSession
    }

    async fn resume(&self, key: &ThreadKey, msg: &InboundMessage) -> Disposition {
        match self.sessions.resume(key, &msg.user_name, &msg.text).await {
            Ok(_) => Disposition::Resumed,
            Err(e) if e.is_lock_held() => {
                tracing::info!(%key, error = %e, "resume skipped, lock held");
                Disposition::Resumed
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "failed to resume session");
                Disposition::Resumed
            }
        }
    }

    /// Extract command input: `!ry`, `!ry <known-word> …`, or a mention
    /// marker followed by a known word.
    fn command_input(&self, text: &str) -> Option<String> {
        let text = text.trim();
        if text == "!ry" {
            return Some(String::new());
        }
        if let Some(rest) = text.strip_prefix("!ry ") {
            let first = rest.split_whitespace().next().unwrap_or("");
            if is_command_word(first) {
                return Some(rest.trim().to_string());
            }
            return None;
        }
        let stripped = self.mention.replace(text, "");
        if stripped != text {
            let first = stripped.split_whitespace().next().unwrap_or("");
            if is_command_word(first) {
                return Some(stripped.trim().to_string());
            }
        }
        None
    }

    async fn send_ack(&self, key: &ThreadKey) {
        self.send_text(&key.channel_id, &key.thread_id, self.acks.next())
            .await;
    }

    async fn send_text(&self, channel_id: &str, thread_id: &str, text: &str) {
        let msg = OutboundMessage::text(channel_id, thread_id, text);
        if let Err(e) = self.adapter.send(&msg).await {
            tracing::warn!(channel_id, error = %e, "send failed");
        }
    }

    async fn send_chunked(&self, channel_id: &str, thread_id: &str, text: &str) {
        for piece in split_message(text, MAX_CHUNK) {
            self.send_text(channel_id, thread_id, &piece).await;
        }
    }
}

/// Whether free text addresses the bot: a mention anywhere or a `!ry `
/// prefix (known commands were peeled off earlier).
fn is_dispatch_text(text: &str) -> bool {
    text.contains('@') || text.trim_start().starts_with("!ry ")
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
