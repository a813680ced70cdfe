// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Acknowledgement phrase deck.
//!
//! A shuffled deck of canned phrases sent the moment a dispatch request is
//! accepted. Dealing from a deck (rather than sampling) guarantees every
//! phrase appears exactly once per ten acks.

use parking_lot::Mutex;
use rand::seq::SliceRandom;

/// The canned acknowledgement phrases.
pub const ACK_PHRASES: [&str; 10] = [
    "On it.",
    "Right away.",
    "Coupling up.",
    "Dispatching now.",
    "Consider it done.",
    "Picking that up.",
    "Switching tracks.",
    "Full steam ahead.",
    "Signal received.",
    "Rolling.",
];

/// Shuffled deck of acknowledgement phrases.
pub struct AckDeck {
    deck: Mutex<Vec<&'static str>>,
}

impl Default for AckDeck {
    fn default() -> Self {
        Self::new()
    }
}

impl AckDeck {
    pub fn new() -> Self {
        Self {
            deck: Mutex::new(shuffled()),
        }
    }

    /// Deal the next phrase; refills and reshuffles when the deck empties.
    pub fn next(&self) -> &'static str {
        let mut deck = self.deck.lock();
        if let Some(phrase) = deck.pop() {
            return phrase;
        }
        *deck = shuffled();
        deck.pop().unwrap_or(ACK_PHRASES[0])
    }
}

fn shuffled() -> Vec<&'static str> {
    let mut deck = ACK_PHRASES.to_vec();
    deck.shuffle(&mut rand::rng());
    deck
}

#[cfg(test)]
#[path = "acks_tests.rs"]
mod tests;
