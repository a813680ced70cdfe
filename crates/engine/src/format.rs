// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure rendering of detected events into platform notifications.

use tg_core::{DetectedEvent, Field, FormattedEvent, Severity, StatusInfo};

const COLOR_INFO: &str = "#2196f3";
const COLOR_SUCCESS: &str = "#36a64f";
const COLOR_WARNING: &str = "#ff9800";
const COLOR_ERROR: &str = "#e53935";

/// Verb, severity, and color for a car status.
///
/// Unknown statuses render verbatim at info severity.
fn status_style(status: &str) -> (String, Severity, &'static str) {
    match status {
        "open" => ("opened".to_string(), Severity::Info, COLOR_INFO),
        "draft" => ("created".to_string(), Severity::Info, COLOR_INFO),
        "in_progress" => ("claimed".to_string(), Severity::Info, COLOR_INFO),
        "done" => ("completed".to_string(), Severity::Success, COLOR_SUCCESS),
        "merged" => ("merged".to_string(), Severity::Success, COLOR_SUCCESS),
        "blocked" => ("blocked".to_string(), Severity::Warning, COLOR_WARNING),
        "merge-failed" => ("merge failed".to_string(), Severity::Warning, COLOR_WARNING),
        "cancelled" => ("cancelled".to_string(), Severity::Info, COLOR_INFO),
        other => (other.to_string(), Severity::Info, COLOR_INFO),
    }
}

/// Render one detected event. Total: every event maps to something.
pub fn format_event(event: &DetectedEvent) -> FormattedEvent {
    match event {
        DetectedEvent::CarStatusChange { car, old_status } => {
            let (verb, severity, color) = status_style(&car.status);
            let mut fields = vec![Field::new("Track", &car.track, true)];
            if old_status.is_empty() {
                fields.push(Field::new("Status", &car.status, true));
            } else {
                fields.push(Field::new(
                    "Status",
                    format!("{} → {}", old_status, car.status),
                    true,
                ));
            }
            FormattedEvent {
                title: format!("Car {} {}", car.id, verb),
                body: car.title.clone(),
                severity,
                color: color.to_string(),
                fields,
            }
        }

        DetectedEvent::EngineStalled { engine } => {
            let mut fields = Vec::new();
            if let Some(car) = &engine.current_car {
                fields.push(Field::new("Car", car, true));
            }
            FormattedEvent {
                title: format!("Engine {} stalled", engine.name),
                body: "No progress reported; the engine may need attention.".to_string(),
                severity: Severity::Warning,
                color: COLOR_WARNING.to_string(),
                fields,
            }
        }

        DetectedEvent::Escalation { escalation } => {
            let (severity, color) = if escalation.is_high_priority() {
                (Severity::Error, COLOR_ERROR)
            } else {
                (Severity::Warning, COLOR_WARNING)
            };
            FormattedEvent {
                title: format!("Escalation: {}", escalation.subject),
                body: escalation.body.clone(),
                severity,
                color: color.to_string(),
                fields: vec![
                    Field::new("From", &escalation.from_agent, true),
                    Field::new("Priority", &escalation.priority, true),
                ],
            }
        }

        DetectedEvent::Pulse { status } => FormattedEvent {
            title: "Railyard pulse".to_string(),
            body: render_status(status),
            severity: Severity::Info,
            color: COLOR_INFO.to_string(),
            fields: Vec::new(),
        },

        DetectedEvent::Digest { title, body } => FormattedEvent {
            title: title.clone(),
            body: body.clone(),
            severity: Severity::Info,
            color: COLOR_INFO.to_string(),
            fields: Vec::new(),
        },
    }
}

/// Render the full status summary used by pulses and `!ry status`.
pub fn render_status(status: &StatusInfo) -> String {
    let mut out = format!(
        "Active: {} | Ready: {} | Done: {} | Blocked: {}",
        status.total_active, status.total_ready, status.total_done, status.total_blocked
    );
    for track in &status.tracks {
        out.push_str(&format!(
            "\n  {}: {} active, {} ready, {} done, {} blocked",
            track.track, track.active, track.ready, track.done, track.blocked
        ));
    }
    if !status.engines.is_empty() {
        let working = status
            .engines
            .iter()
            .filter(|e| e.status == "working")
            .count();
        out.push_str(&format!(
            "\nEngines: {}/{} working",
            working,
            status.engines.len()
        ));
        for engine in &status.engines {
            match &engine.current_car {
                Some(car) => out.push_str(&format!(
                    "\n  {} [{}] pulling {}",
                    engine.name, engine.status, car
                )),
                None => out.push_str(&format!("\n  {} [{}]", engine.name, engine.status)),
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
