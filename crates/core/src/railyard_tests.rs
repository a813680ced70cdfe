// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use yare::parameterized;

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn engine(name: &str, status: &str) -> EngineRow {
    EngineRow {
        id: 1,
        name: name.to_string(),
        status: status.to_string(),
        current_car: None,
    }
}

#[test]
fn status_digest_counts_working_engines() {
    let status = StatusInfo {
        total_active: 2,
        total_ready: 1,
        total_done: 5,
        total_blocked: 0,
        tracks: vec![],
        engines: vec![
            engine("e1", "working"),
            engine("e2", "idle"),
            engine("e3", "working"),
        ],
    };
    let digest = status.digest();
    assert_eq!(digest.engines, 3);
    assert_eq!(digest.working, 2);
    assert!(!status.is_idle());
}

#[test]
fn status_idle_when_nothing_active_or_ready() {
    let status = StatusInfo {
        total_done: 10,
        ..Default::default()
    };
    assert!(status.is_idle());
}

#[parameterized(
    high = { "high", true },
    urgent = { "urgent", true },
    normal = { "normal", false },
    low = { "low", false },
)]
fn escalation_priority(priority: &str, expected: bool) {
    let row = EscalationRow {
        id: 1,
        from_agent: "engine-3".to_string(),
        subject: "s".to_string(),
        body: "b".to_string(),
        priority: priority.to_string(),
        created_at: ts(0),
    };
    assert_eq!(row.is_high_priority(), expected);
}

#[test]
fn digest_window_empty_detection() {
    assert!(DigestWindow::default().is_empty());

    let window = DigestWindow {
        tokens_used: 12,
        ..Default::default()
    };
    assert!(!window.is_empty());
}

#[test]
fn merge_success_rate_undefined_on_zero_denominator() {
    let window = DigestWindow {
        cars_created: 3,
        ..Default::default()
    };
    assert_eq!(window.merge_success_rate(), None);

    let window = DigestWindow {
        cars_merged: 3,
        merge_failures: 1,
        ..Default::default()
    };
    let rate = window.merge_success_rate().unwrap();
    assert!((rate - 75.0).abs() < f64::EPSILON);
}

#[test]
fn track_completion_means_average_per_track() {
    let window = DigestWindow {
        cars_completed: 3,
        completions: vec![
            CompletionSample {
                track: "main".to_string(),
                claimed_at: ts(0),
                completed_at: ts(100),
            },
            CompletionSample {
                track: "main".to_string(),
                claimed_at: ts(0),
                completed_at: ts(300),
            },
            CompletionSample {
                track: "infra".to_string(),
                claimed_at: ts(50),
                completed_at: ts(60),
            },
        ],
        ..Default::default()
    };

    let means = window.track_completion_means();
    assert_eq!(means.len(), 2);
    assert_eq!(means[0].0, "infra");
    assert!((means[0].1 - 10.0).abs() < f64::EPSILON);
    assert_eq!(means[1].0, "main");
    assert!((means[1].1 - 200.0).abs() < f64::EPSILON);
}
