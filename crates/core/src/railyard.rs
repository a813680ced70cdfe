// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-model rows observed from the Railyard orchestrator database.
//!
//! Telegraph never writes these tables (with one exception: flipping
//! `messages.acknowledged` after an escalation has been delivered).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One car (unit of work) as the Watcher sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub id: String,
    pub status: String,
    pub track: String,
    pub title: String,
}

/// One engine (worker agent) row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineRow {
    pub id: i64,
    pub name: String,
    pub status: String,
    /// Car the engine is currently pulling, if any.
    pub current_car: Option<String>,
}

/// An unacknowledged message addressed to a human operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationRow {
    pub id: i64,
    pub from_agent: String,
    pub subject: String,
    pub body: String,
    pub priority: String,
    pub created_at: DateTime<Utc>,
}

impl EscalationRow {
    /// High and urgent escalations are rendered at error severity.
    pub fn is_high_priority(&self) -> bool {
        matches!(self.priority.as_str(), "high" | "urgent")
    }
}

/// Per-track car counts for the status summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackStat {
    pub track: String,
    pub active: i64,
    pub ready: i64,
    pub done: i64,
    pub blocked: i64,
}

/// Full orchestration status, rendered by pulse and `!ry status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StatusInfo {
    pub total_active: i64,
    pub total_ready: i64,
    pub total_done: i64,
    pub total_blocked: i64,
    pub tracks: Vec<TrackStat>,
    pub engines: Vec<EngineRow>,
}

impl StatusInfo {
    /// Collapse to the tuple compared for pulse suppression.
    pub fn digest(&self) -> PulseDigest {
        PulseDigest {
            active: self.total_active,
            ready: self.total_ready,
            done: self.total_done,
            blocked: self.total_blocked,
            engines: self.engines.len() as i64,
            working: self
                .engines
                .iter()
                .filter(|e| e.status == "working")
                .count() as i64,
        }
    }

    /// Nothing in flight and nothing queued.
    pub fn is_idle(&self) -> bool {
        self.total_active == 0 && self.total_ready == 0
    }
}

/// Equality-compared summary used to suppress duplicate pulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseDigest {
    pub active: i64,
    pub ready: i64,
    pub done: i64,
    pub blocked: i64,
    pub engines: i64,
    pub working: i64,
}

/// A closed car's timing sample for per-track mean completion time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSample {
    pub track: String,
    pub claimed_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Raw activity counts over a digest window.
///
/// Mean completion times are derived from `completions` in process, not in
/// SQL, so the math stays portable across backends.
#[derive(Debug, Clone, Default)]
pub struct DigestWindow {
    pub cars_created: i64,
    pub cars_completed: i64,
    pub cars_merged: i64,
    pub merge_failures: i64,
    pub engine_stalls: i64,
    pub tokens_used: i64,
    pub completions: Vec<CompletionSample>,
}

impl DigestWindow {
    /// True when every headline metric is zero; such digests are suppressed.
    pub fn is_empty(&self) -> bool {
        self.cars_created == 0
            && self.cars_completed == 0
            && self.cars_merged == 0
            && self.merge_failures == 0
            && self.engine_stalls == 0
            && self.tokens_used == 0
    }

    /// Merge success percentage, `None` when nothing was merged or failed.
    pub fn merge_success_rate(&self) -> Option<f64> {
        let denominator = self.cars_merged + self.merge_failures;
        if denominator == 0 {
            return None;
        }
        Some(self.cars_merged as f64 / denominator as f64 * 100.0)
    }

    /// Mean completion seconds per track, sorted by track name.
    pub fn track_completion_means(&self) -> Vec<(String, f64)> {
        let mut sums: std::collections::BTreeMap<&str, (f64, u32)> = Default::default();
        for sample in &self.completions {
            let secs = (sample.completed_at - sample.claimed_at).num_seconds().max(0) as f64;
            let entry = sums.entry(sample.track.as_str()).or_insert((0.0, 0));
            entry.0 += secs;
            entry.1 += 1;
        }
        sums.into_iter()
            .map(|(track, (sum, n))| (track.to_string(), sum / n as f64))
            .collect()
    }
}

#[cfg(test)]
#[path = "railyard_tests.rs"]
mod tests;
