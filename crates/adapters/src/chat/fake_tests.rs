// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tg_core::OutboundMessage;

#[tokio::test]
async fn records_sends_in_order() {
    let adapter = FakeChatAdapter::new();
    adapter.connect().await.unwrap();

    adapter
        .send(&OutboundMessage::text("C1", "T1", "one"))
        .await
        .unwrap();
    adapter
        .send(&OutboundMessage::text("C1", "T1", "two"))
        .await
        .unwrap();

    assert_eq!(adapter.sent_texts(), vec!["one", "two"]);
}

#[tokio::test]
async fn start_thread_assigns_ids_and_posts_reply() {
    let adapter = FakeChatAdapter::new();
    adapter.connect().await.unwrap();

    let id = adapter
        .start_thread("C1", "on it", "Dispatch")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(id, "thread-1");

    let calls = adapter.start_thread_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].reply_text, "on it");
    assert_eq!(calls[0].thread_name, "Dispatch");

    // Reply text lands in the new thread
    let sends = adapter.sends();
    assert_eq!(sends[0].thread_id, "thread-1");
    assert_eq!(sends[0].text, "on it");
}

#[tokio::test]
async fn start_thread_unsupported_returns_none() {
    let adapter = FakeChatAdapter::new();
    adapter.set_supports_threads(false);
    assert_eq!(
        adapter.start_thread("C1", "ack", "Dispatch").await.unwrap(),
        None
    );
}

#[tokio::test]
async fn rate_limit_injection_is_consumed() {
    let adapter = FakeChatAdapter::new();
    adapter.set_rate_limited_sends(1);
    let msg = OutboundMessage::text("C1", "", "x");

    assert!(matches!(
        adapter.send(&msg).await,
        Err(ChatError::RateLimited { .. })
    ));
    adapter.send(&msg).await.unwrap();
    assert_eq!(adapter.sends().len(), 1);
}

#[tokio::test]
async fn inbound_round_trip() {
    let adapter = FakeChatAdapter::new();
    let mut rx = adapter.listen().await.unwrap();

    adapter
        .push_inbound(InboundMessage {
            platform: "fake".to_string(),
            channel_id: "C1".to_string(),
            thread_id: String::new(),
            message_id: "m1".to_string(),
            user_id: "U1".to_string(),
            user_name: "alice".to_string(),
            text: "hi".to_string(),
            timestamp: chrono::Utc::now(),
        })
        .await;

    let msg = rx.recv().await.unwrap();
    assert_eq!(msg.text, "hi");
}

#[tokio::test]
async fn history_honours_limit() {
    let adapter = FakeChatAdapter::new();
    let entry = |text: &str| ThreadMessage {
        user_id: "U1".to_string(),
        user_name: "alice".to_string(),
        text: text.to_string(),
        timestamp: chrono::Utc::now(),
        is_bot: false,
    };
    adapter.set_history("C1", "T1", vec![entry("a"), entry("b"), entry("c")]);

    assert_eq!(adapter.thread_history("C1", "T1", 0).await.unwrap().len(), 3);
    assert_eq!(adapter.thread_history("C1", "T1", 2).await.unwrap().len(), 2);
    assert!(adapter.thread_history("C1", "T9", 0).await.unwrap().is_empty());
}
