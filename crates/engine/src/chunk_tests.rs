// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn short_text_is_one_chunk() {
    assert_eq!(split_message("hello", 2000), vec!["hello"]);
}

#[test]
fn empty_text_yields_no_chunks() {
    assert!(split_message("", 2000).is_empty());
}

#[test]
fn splits_at_newline_in_second_half() {
    // Newline at byte 70 of a 100-byte window, past the halfway mark
    let text = format!("{}\n{}", "a".repeat(70), "b".repeat(60));
    let chunks = split_message(&text, 100);
    assert_eq!(chunks, vec!["a".repeat(70), "b".repeat(60)]);
}

#[test]
fn ignores_newline_in_first_half() {
    // Only newline sits at byte 10, before the halfway mark of the window
    let text = format!("{}\n{}", "a".repeat(10), "b".repeat(150));
    let chunks = split_message(&text, 100);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].len(), 100);
    assert_eq!(chunks[1].len(), 61);
}

#[test]
fn hard_splits_without_newlines() {
    let text = "x".repeat(4500);
    let chunks = split_message(&text, 2000);
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].len(), 2000);
    assert_eq!(chunks[1].len(), 2000);
    assert_eq!(chunks[2].len(), 500);
    assert_eq!(chunks.concat(), text);
}

#[test]
fn five_thousand_chars_chunk_within_limit() {
    let line = "the quick brown fox jumps over the lazy dog\n";
    let text = line.repeat(120); // ~5400 bytes
    let chunks = split_message(&text, 2000);

    assert!(chunks.len() >= 3);
    for chunk in &chunks {
        assert!(chunk.len() <= 2000);
    }
    // Rejoining with newlines restores the text (trailing newline aside)
    let rejoined = chunks.join("\n");
    assert_eq!(rejoined.trim_end(), text.trim_end());
}

#[test]
fn never_splits_inside_utf8() {
    let text = "é".repeat(1500); // 2 bytes each: 3000 bytes total
    let chunks = split_message(&text, 2000);
    assert!(chunks.len() >= 2);
    for chunk in &chunks {
        assert!(chunk.len() <= 2000);
        // Valid UTF-8 by construction: &str chunks can't hold split chars
        assert!(chunk.chars().all(|c| c == 'é'));
    }
    assert_eq!(chunks.concat(), text);
}

#[test]
fn exact_boundary_is_one_chunk() {
    let text = "y".repeat(2000);
    assert_eq!(split_message(&text, 2000), vec![text]);
}
