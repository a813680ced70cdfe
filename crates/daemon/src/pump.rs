// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound event dispatch.
//!
//! Watcher events flow through here on their way to chat. Sends retry
//! rate limits with bounded backoff; any other failure is logged and the
//! event dropped. Delivery to chat is at-most-once.

use tg_adapters::{with_backoff, BackoffPolicy, ChatAdapter};
use tg_core::{DetectedEvent, OutboundMessage};
use tg_engine::format_event;
use tokio::sync::watch;

/// Render and deliver one watcher event to the notify channel.
pub async fn dispatch_event<A: ChatAdapter>(
    adapter: &A,
    channel_id: &str,
    event: &DetectedEvent,
    shutdown: watch::Receiver<bool>,
) {
    let formatted = format_event(event);
    let msg = OutboundMessage::event(channel_id, formatted);
    let result = with_backoff(BackoffPolicy::default(), shutdown, || adapter.send(&msg)).await;
    if let Err(e) = result {
        tracing::warn!(channel_id, error = %e, "failed to deliver event");
    }
}

#[cfg(test)]
#[path = "pump_tests.rs"]
mod tests;
