// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::acks::ACK_PHRASES;
use crate::conversation::ConversationStore;
use crate::session_manager::SessionConfig;
use std::time::Duration;
use tg_adapters::{FakeChatAdapter, FakeProcessSpawner};
use tg_core::config::ConvConfig;
use tg_core::{FakeClock, Role};
use tg_storage::Store;

struct Harness {
    router: Router<FakeChatAdapter, FakeProcessSpawner, FakeClock>,
    manager: SessionManager<FakeChatAdapter, FakeProcessSpawner, FakeClock>,
    store: Store<FakeClock>,
    adapter: FakeChatAdapter,
    spawner: FakeProcessSpawner,
}

fn harness() -> Harness {
    let store = Store::open_in_memory(FakeClock::new()).unwrap();
    let adapter = FakeChatAdapter::new();
    let spawner = FakeProcessSpawner::new();
    let conversations = ConversationStore::new(
        store.clone(),
        Some(adapter.clone()),
        &ConvConfig::default(),
    );
    let manager = SessionManager::new(
        store.clone(),
        conversations,
        spawner.clone(),
        SessionConfig::default(),
    );
    let router = Router::new(
        adapter.clone(),
        manager.clone(),
        CommandHandler::new(store.clone()),
    );
    Harness {
        router,
        manager,
        store,
        adapter,
        spawner,
    }
}

fn msg(channel: &str, thread: &str, user_id: &str, user: &str, text: &str) -> InboundMessage {
    InboundMessage {
        platform: "fake".to_string(),
        channel_id: channel.to_string(),
        thread_id: thread.to_string(),
        message_id: "m-1".to_string(),
        user_id: user_id.to_string(),
        user_name: user.to_string(),
        text: text.to_string(),
        timestamp: chrono::Utc::now(),
    }
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..400 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn own_messages_are_dropped() {
    let h = harness();
    h.adapter.set_bot_user_id("B1");

    let disposition = h
        .router
        .handle(&msg("C1", "", "B1", "railyard", "@railyard hello"))
        .await;
    assert_eq!(disposition, Disposition::SelfMessage);
    assert!(h.adapter.sends().is_empty());
    assert_eq!(h.manager.active_count(), 0);
}

#[tokio::test]
async fn bare_bang_ry_is_a_command() {
    let h = harness();
    let disposition = h.router.handle(&msg("C1", "", "U1", "alice", "!ry")).await;
    assert_eq!(disposition, Disposition::Command);

    // Help reply, no ack, no session
    let sends = h.adapter.sends();
    assert_eq!(sends.len(), 1);
    assert!(sends[0].text.contains("!ry status"));
    assert!(!ACK_PHRASES.contains(&sends[0].text.as_str()));
    assert_eq!(h.manager.active_count(), 0);
}

#[tokio::test]
async fn known_command_word_routes_to_handler() {
    let h = harness();
    h.store.seed_car("car-1", "open", "main", "Thing").unwrap();

    let disposition = h
        .router
        .handle(&msg("C1", "T1", "U1", "alice", "!ry car list"))
        .await;
    assert_eq!(disposition, Disposition::Command);
    let sends = h.adapter.sends();
    assert_eq!(sends.len(), 1);
    assert!(sends[0].text.contains("car-1"));
    // Reply lands where the command was issued
    assert_eq!(sends[0].thread_id, "T1");
}

#[tokio::test]
async fn mention_prefixed_command_is_equivalent() {
    let h = harness();
    let disposition = h
        .router
        .handle(&msg("C1", "", "U1", "alice", "<@12345> status"))
        .await;
    assert_eq!(disposition, Disposition::Command);
    assert!(h.adapter.sends()[0].text.contains("Active:"));

    let disposition = h
        .router
        .handle(&msg("C1", "", "U1", "alice", "<@!99> help"))
        .await;
    assert_eq!(disposition, Disposition::Command);
}

#[tokio::test]
async fn mention_with_free_text_is_a_dispatch_not_a_command() {
    let h = harness();
    let disposition = h
        .router
        .handle(&msg("C1", "", "U1", "alice", "<@12345> fix the flaky test"))
        .await;
    assert_eq!(disposition, Disposition::NewSession);
}

#[tokio::test]
async fn top_level_mention_creates_thread_and_session() {
    let h = harness();
    h.spawner.push_script(&["ticket filed"]);

    let disposition = h
        .router
        .handle(&msg("C1", "", "U1", "alice", "@railyard create a bug ticket"))
        .await;
    assert_eq!(disposition, Disposition::NewSession);

    // One thread created, ack as its first message
    let threads = h.adapter.start_thread_calls();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].channel_id, "C1");
    assert_eq!(threads[0].thread_name, "Dispatch");
    assert!(ACK_PHRASES.contains(&threads[0].reply_text.as_str()));

    // Session keyed by the new thread, not the channel
    let thread_key = ThreadKey::new("C1", "thread-1");
    let channel_key = ThreadKey::new("C1", "C1");
    assert!(h.manager.has_session(&thread_key) || {
        // The one-shot process may already have completed
        h.store.thread_sessions(&thread_key).unwrap().len() == 1
    });
    assert!(h.store.thread_sessions(&channel_key).unwrap().is_empty());

    // The initial message was routed as turn 1
    let sessions = h.store.thread_sessions(&thread_key).unwrap();
    let history = h.store.load_history(sessions[0].id).unwrap();
    assert_eq!(history[0].sequence, 1);
    assert_eq!(history[0].role, Role::User);
    assert!(history[0].content.contains("bug ticket"));
}

#[tokio::test]
async fn thread_fallback_uses_channel_as_key() {
    let h = harness();
    h.adapter.set_supports_threads(false);

    let disposition = h
        .router
        .handle(&msg("C1", "", "U1", "alice", "@railyard do the thing"))
        .await;
    assert_eq!(disposition, Disposition::NewSession);

    // Ack went to the channel top level
    let sends = h.adapter.sends();
    assert!(ACK_PHRASES.contains(&sends[0].text.as_str()));
    assert!(sends[0].thread_id.is_empty());

    // Session keyed by the channel id
    let key = ThreadKey::new("C1", "C1");
    assert_eq!(h.store.thread_sessions(&key).unwrap().len(), 1);
}

#[tokio::test]
async fn plain_top_level_chatter_is_ignored() {
    let h = harness();
    let disposition = h
        .router
        .handle(&msg("C1", "", "U1", "alice", "lunch anyone?"))
        .await;
    assert_eq!(disposition, Disposition::Ignored);
    assert!(h.adapter.sends().is_empty());
    assert_eq!(h.manager.active_count(), 0);
}

#[tokio::test]
async fn thread_reply_routes_to_active_session() {
    let h = harness();
    let key = ThreadKey::new("C1", "T1");
    h.manager.new_session("alice", &key).await.unwrap();

    let disposition = h
        .router
        .handle(&msg("C1", "T1", "U1", "alice", "and make it urgent"))
        .await;
    assert_eq!(disposition, Disposition::ActiveTurn);

    // Exactly one ack before the turn was delivered
    let sends = h.adapter.sends();
    assert_eq!(sends.len(), 1);
    assert!(ACK_PHRASES.contains(&sends[0].text.as_str()));
    assert_eq!(sends[0].thread_id, "T1");

    let process = &h.spawner.spawned()[0];
    assert_eq!(process.sent().as_deref(), Some("and make it urgent"));
}

#[tokio::test]
async fn thread_follow_up_resumes_completed_session() {
    let h = harness();
    let key = ThreadKey::new("C1", "T1");
    h.spawner.push_script(&["done"]);

    // Run a session to completion
    h.manager.new_session("alice", &key).await.unwrap();
    h.manager.route(&key, "alice", "create a bug ticket").await.unwrap();
    wait_until(|| !h.manager.has_session(&key)).await;
    let sends_before = h.adapter.sends().len();

    let disposition = h
        .router
        .handle(&msg("C1", "T1", "U1", "alice", "go ahead"))
        .await;
    assert_eq!(disposition, Disposition::Resumed);

    // Ack sent to the thread, new session spawned with recovery prompt
    let sends = h.adapter.sends();
    assert!(ACK_PHRASES.contains(&sends[sends_before].text.as_str()));

    let prompts = h.spawner.prompts();
    let prompt = prompts.last().unwrap();
    assert!(prompt.starts_with("Previous conversation context:\n\n"));
    assert!(prompt.contains("[user] alice: create a bug ticket"));
    assert!(prompt.ends_with("[user] alice: go ahead"));
}

#[tokio::test]
async fn addressed_thread_reply_opens_new_session() {
    let h = harness();
    let disposition = h
        .router
        .handle(&msg("C1", "T7", "U1", "alice", "!ry please fix the build"))
        .await;
    assert_eq!(disposition, Disposition::NewSession);

    let key = ThreadKey::new("C1", "T7");
    assert_eq!(h.store.thread_sessions(&key).unwrap().len(), 1);
    // Ack preceded the dispatch
    assert!(ACK_PHRASES.contains(&h.adapter.sends()[0].text.as_str()));
}

#[tokio::test]
async fn unaddressed_thread_reply_is_ignored() {
    let h = harness();
    let disposition = h
        .router
        .handle(&msg("C1", "T7", "U1", "alice", "sounds good to me"))
        .await;
    assert_eq!(disposition, Disposition::Ignored);
    assert!(h.adapter.sends().is_empty());
}

#[tokio::test]
async fn second_user_joins_the_active_session_thread() {
    let h = harness();
    let key = ThreadKey::new("C1", "T1");
    h.manager.new_session("alice", &key).await.unwrap();

    // bob's reply rides the existing session; no second session appears
    let disposition = h
        .router
        .handle(&msg("C1", "T1", "U2", "bob", "@railyard my turn"))
        .await;
    assert_eq!(disposition, Disposition::ActiveTurn);
    assert_eq!(h.store.thread_sessions(&key).unwrap().len(), 1);
}

#[tokio::test]
async fn acks_exhaust_the_deck_across_dispatches() {
    let h = harness();
    // Ten addressed thread replies in distinct threads, each acked once
    for i in 0..10 {
        h.router
            .handle(&msg(
                "C1",
                &format!("T{i}"),
                "U1",
                "alice",
                "!ry do something",
            ))
            .await;
    }
    let acks: Vec<String> = h
        .adapter
        .sends()
        .iter()
        .filter(|m| ACK_PHRASES.contains(&m.text.as_str()))
        .map(|m| m.text.clone())
        .collect();
    assert_eq!(acks.len(), 10);
    let unique: std::collections::HashSet<&String> = acks.iter().collect();
    assert_eq!(unique.len(), 10, "each phrase appears exactly once per ten");
}
