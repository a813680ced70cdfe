// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daily and weekly activity digests.

use tg_core::{format_elapsed, DetectedEvent, DigestWindow};

/// Render a digest event from a window of activity.
///
/// Returns `None` when every headline metric is zero so quiet periods stay
/// quiet.
pub fn build_digest(title: &str, window: &DigestWindow) -> Option<DetectedEvent> {
    if window.is_empty() {
        return None;
    }

    let mut lines = vec![
        format!("Cars created: {}", window.cars_created),
        format!("Cars completed: {}", window.cars_completed),
        format!("Cars merged: {}", window.cars_merged),
    ];
    if let Some(rate) = window.merge_success_rate() {
        lines.push(format!("Merge success rate: {:.0}%", rate));
    }
    lines.push(format!("Engine stalls: {}", window.engine_stalls));
    lines.push(format!("Tokens used: {}", window.tokens_used));

    let means = window.track_completion_means();
    if !means.is_empty() {
        lines.push("Average completion time:".to_string());
        for (track, secs) in means {
            lines.push(format!("  {}: {}", track, format_elapsed(secs as u64)));
        }
    }

    Some(DetectedEvent::Digest {
        title: title.to_string(),
        body: lines.join("\n"),
    })
}

#[cfg(test)]
#[path = "digest_tests.rs"]
mod tests;
