// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire DTOs crossing the chat-adapter boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message received from the chat platform.
///
/// `thread_id` is empty for top-level channel messages; the Router decides
/// whether such a message opens a new dispatch thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub platform: String,
    pub channel_id: String,
    #[serde(default)]
    pub thread_id: String,
    pub message_id: String,
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl InboundMessage {
    /// True for messages posted at channel top level (not inside a thread).
    pub fn is_top_level(&self) -> bool {
        self.thread_id.is_empty()
    }
}

/// A message to deliver to the chat platform.
///
/// Empty `thread_id` means post at channel top level. `events` carry
/// rich-formatted notification payloads; `text` is the plain fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel_id: String,
    #[serde(default)]
    pub thread_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<FormattedEvent>,
}

impl OutboundMessage {
    /// Plain text message addressed to a channel or thread.
    pub fn text(
        channel_id: impl Into<String>,
        thread_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            thread_id: thread_id.into(),
            text: text.into(),
            events: Vec::new(),
        }
    }

    /// Rich notification addressed to a channel top level.
    pub fn event(channel_id: impl Into<String>, event: FormattedEvent) -> Self {
        Self {
            channel_id: channel_id.into(),
            thread_id: String::new(),
            text: String::new(),
            events: vec![event],
        }
    }
}

/// Severity of a formatted notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Success,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Success => write!(f, "success"),
        }
    }
}

/// A rendered notification ready for platform-specific display.
///
/// `color` is a hex hint (e.g. `"#36a64f"`); adapters that cannot render
/// color drop it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedEvent {
    pub title: String,
    pub body: String,
    pub severity: Severity,
    pub color: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

/// A labelled key/value pair attached to a [`FormattedEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    /// Hint that the field can share a row with another short field.
    pub short: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>, short: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            short,
        }
    }
}

/// One entry of platform thread history, oldest-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Whether the platform attributes this entry to the bot itself.
    #[serde(default)]
    pub is_bot: bool,
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
