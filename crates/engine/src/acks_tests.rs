// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashSet;

#[test]
fn every_phrase_appears_once_per_run_of_ten() {
    let deck = AckDeck::new();
    for _ in 0..5 {
        let run: HashSet<&'static str> = (0..10).map(|_| deck.next()).collect();
        assert_eq!(run.len(), 10, "a run of ten acks must use every phrase");
    }
}

#[test]
fn phrases_come_from_the_canned_set() {
    let deck = AckDeck::new();
    for _ in 0..30 {
        assert!(ACK_PHRASES.contains(&deck.next()));
    }
}

#[test]
fn deck_is_shared_across_threads() {
    let deck = std::sync::Arc::new(AckDeck::new());
    let mut handles = Vec::new();
    for _ in 0..5 {
        let deck = std::sync::Arc::clone(&deck);
        handles.push(std::thread::spawn(move || {
            (0..2).map(|_| deck.next()).collect::<Vec<_>>()
        }));
    }
    let mut all: Vec<&'static str> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_unstable();
    all.dedup();
    // 10 draws across threads still exhaust the deck exactly
    assert_eq!(all.len(), 10);
}
