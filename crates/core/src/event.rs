// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change events detected by the Watcher.

use crate::railyard::{Car, EngineRow, EscalationRow, StatusInfo};
use serde::{Deserialize, Serialize};

/// An orchestration change worth telling the operators about.
///
/// Serializes with `{"type": "event:name", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DetectedEvent {
    /// A car appeared or changed status. `old_status` is empty for new cars.
    #[serde(rename = "car:status")]
    CarStatusChange { car: Car, old_status: String },

    /// An engine reported the `stalled` status.
    #[serde(rename = "engine:stalled")]
    EngineStalled { engine: EngineRow },

    /// An unacknowledged message addressed to the operators.
    #[serde(rename = "escalation")]
    Escalation { escalation: EscalationRow },

    /// Periodic orchestration summary.
    #[serde(rename = "pulse")]
    Pulse { status: StatusInfo },

    /// Cron-scheduled daily or weekly activity digest, pre-rendered.
    #[serde(rename = "digest")]
    Digest { title: String, body: String },
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
