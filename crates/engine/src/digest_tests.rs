// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{TimeZone, Utc};
use tg_core::CompletionSample;

#[test]
fn quiet_window_yields_no_digest() {
    assert!(build_digest("Daily digest", &DigestWindow::default()).is_none());
}

#[test]
fn renders_headline_metrics() {
    let window = DigestWindow {
        cars_created: 4,
        cars_completed: 3,
        cars_merged: 2,
        merge_failures: 2,
        engine_stalls: 1,
        tokens_used: 12_345,
        completions: vec![],
    };
    let Some(DetectedEvent::Digest { title, body }) = build_digest("Daily digest", &window)
    else {
        panic!("expected a digest");
    };
    assert_eq!(title, "Daily digest");
    assert!(body.contains("Cars created: 4"));
    assert!(body.contains("Cars merged: 2"));
    assert!(body.contains("Merge success rate: 50%"));
    assert!(body.contains("Engine stalls: 1"));
    assert!(body.contains("Tokens used: 12345"));
    assert!(!body.contains("Average completion time"));
}

#[test]
fn omits_rate_when_denominator_zero() {
    let window = DigestWindow {
        cars_created: 1,
        ..Default::default()
    };
    let Some(DetectedEvent::Digest { body, .. }) = build_digest("Weekly digest", &window)
    else {
        panic!("expected a digest");
    };
    assert!(!body.contains("Merge success rate"));
}

#[test]
fn renders_per_track_completion_means() {
    let claimed = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    let window = DigestWindow {
        cars_completed: 2,
        completions: vec![
            CompletionSample {
                track: "main".to_string(),
                claimed_at: claimed,
                completed_at: claimed + chrono::TimeDelta::minutes(90),
            },
            CompletionSample {
                track: "main".to_string(),
                claimed_at: claimed,
                completed_at: claimed + chrono::TimeDelta::minutes(30),
            },
        ],
        ..Default::default()
    };
    let Some(DetectedEvent::Digest { body, .. }) = build_digest("Daily digest", &window)
    else {
        panic!("expected a digest");
    };
    // (90 + 30) / 2 = 60 minutes
    assert!(body.contains("main: 1h"));
}
