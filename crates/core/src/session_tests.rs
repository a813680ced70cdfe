// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    active = { SessionStatus::Active, "active" },
    completed = { SessionStatus::Completed, "completed" },
    expired = { SessionStatus::Expired, "expired" },
)]
fn session_status_round_trips(status: SessionStatus, text: &str) {
    assert_eq!(status.as_str(), text);
    assert_eq!(SessionStatus::parse(text), Some(status));
}

#[test]
fn session_status_rejects_unknown() {
    assert_eq!(SessionStatus::parse("paused"), None);
}

#[parameterized(
    user = { Role::User, "user" },
    assistant = { Role::Assistant, "assistant" },
)]
fn role_round_trips(role: Role, text: &str) {
    assert_eq!(role.as_str(), text);
    assert_eq!(Role::parse(text), Some(role));
}

#[test]
fn thread_key_display() {
    let key = ThreadKey::new("C1", "T9");
    assert_eq!(key.to_string(), "C1/T9");
}

#[test]
fn thread_key_equality_is_exact() {
    assert_eq!(ThreadKey::new("C1", "T1"), ThreadKey::new("C1", "T1"));
    assert_ne!(ThreadKey::new("C1", "T1"), ThreadKey::new("C1", "T2"));
    assert_ne!(ThreadKey::new("C1", "T1"), ThreadKey::new("C2", "T1"));
}
