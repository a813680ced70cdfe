// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn inbound(thread_id: &str) -> InboundMessage {
    InboundMessage {
        platform: "slack".to_string(),
        channel_id: "C1".to_string(),
        thread_id: thread_id.to_string(),
        message_id: "m-1".to_string(),
        user_id: "U1".to_string(),
        user_name: "alice".to_string(),
        text: "hello".to_string(),
        timestamp: Utc.timestamp_opt(1_767_225_600, 0).unwrap(),
    }
}

#[test]
fn top_level_detection() {
    assert!(inbound("").is_top_level());
    assert!(!inbound("T1").is_top_level());
}

#[test]
fn outbound_text_constructor() {
    let msg = OutboundMessage::text("C1", "T1", "hi");
    assert_eq!(msg.channel_id, "C1");
    assert_eq!(msg.thread_id, "T1");
    assert_eq!(msg.text, "hi");
    assert!(msg.events.is_empty());
}

#[test]
fn outbound_event_goes_top_level() {
    let ev = FormattedEvent {
        title: "t".to_string(),
        body: "b".to_string(),
        severity: Severity::Info,
        color: "#2196f3".to_string(),
        fields: vec![],
    };
    let msg = OutboundMessage::event("C1", ev);
    assert!(msg.thread_id.is_empty());
    assert_eq!(msg.events.len(), 1);
}

#[test]
fn severity_serializes_lowercase() {
    let json = serde_json::to_string(&Severity::Warning).unwrap();
    assert_eq!(json, "\"warning\"");
    assert_eq!(Severity::Success.to_string(), "success");
}

#[test]
fn inbound_round_trips_without_thread_id() {
    // thread_id defaults to empty when absent on the wire
    let json = r#"{
        "platform": "slack",
        "channel_id": "C1",
        "message_id": "m-1",
        "user_id": "U1",
        "user_name": "alice",
        "text": "hello",
        "timestamp": "2026-01-01T00:00:00Z"
    }"#;
    let msg: InboundMessage = serde_json::from_str(json).unwrap();
    assert!(msg.is_top_level());
}
