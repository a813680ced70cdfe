// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change detection over the orchestrator database.
//!
//! The watcher polls cars, engines, and messages on a fixed interval and
//! emits [`DetectedEvent`]s for the differences. Car changes are detected
//! by diffing against an in-memory snapshot that is seeded silently on the
//! first poll, so a restart never replays the whole yard into chat.
//! Escalations are acknowledged in the same poll that emits them.
//!
//! Pulses ride a second, slower ticker and are suppressed when the yard is
//! idle or nothing changed since the last pulse. Digest crons are
//! evaluated once per minute against the injected clock.

use crate::cron::CronExpr;
use crate::digest::build_digest;
use crate::EngineError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tg_core::config::{DigestConfig, DigestSchedule, EventsConfig};
use tg_core::{Car, Clock, DetectedEvent, PulseDigest};
use tg_storage::{CarFilter, Store};
use tokio::sync::{mpsc, watch};

struct CarSnap {
    status: String,
}

struct DigestTimer {
    expr: Option<CronExpr>,
    last_fired_minute: Option<i64>,
}

impl DigestTimer {
    fn new(schedule: &DigestSchedule, label: &str) -> Self {
        let expr = if schedule.enabled {
            match CronExpr::parse(&schedule.cron) {
                Ok(expr) => Some(expr),
                Err(e) => {
                    tracing::warn!(label, cron = %schedule.cron, error = %e, "invalid digest cron, disabled");
                    None
                }
            }
        } else {
            None
        };
        Self {
            expr,
            last_fired_minute: None,
        }
    }

    /// Whether the schedule fires at `now`, at most once per minute.
    fn due(&mut self, now: DateTime<Utc>) -> bool {
        let Some(expr) = &self.expr else { return false };
        let minute = now.timestamp() / 60;
        if self.last_fired_minute == Some(minute) {
            return false;
        }
        if expr.matches(now) {
            self.last_fired_minute = Some(minute);
            return true;
        }
        false
    }
}

struct WatcherState {
    seeded: bool,
    snapshot: HashMap<String, CarSnap>,
    last_pulse_digest: Option<PulseDigest>,
    last_pulse_at: Option<DateTime<Utc>>,
    daily: DigestTimer,
    weekly: DigestTimer,
}

/// Periodic change detector over the shared orchestrator tables.
pub struct Watcher<C: Clock> {
    store: Store<C>,
    clock: C,
    events: EventsConfig,
    state: Mutex<WatcherState>,
}

impl<C: Clock> Watcher<C> {
    pub fn new(store: Store<C>, clock: C, events: EventsConfig, digest: &DigestConfig) -> Self {
        Self {
            store,
            clock,
            events,
            state: Mutex::new(WatcherState {
                seeded: false,
                snapshot: HashMap::new(),
                last_pulse_digest: None,
                last_pulse_at: None,
                daily: DigestTimer::new(&digest.daily, "daily"),
                weekly: DigestTimer::new(&digest.weekly, "weekly"),
            }),
        }
    }

    /// One detection pass. Events come out in `{car, stall, escalation}`
    /// order so downstream formatting is deterministic.
    pub fn poll(&self) -> Result<Vec<DetectedEvent>, EngineError> {
        let mut events = Vec::new();

        if self.events.car_lifecycle {
            self.detect_car_changes(&mut events)?;
        }

        if self.events.engine_stalls {
            for engine in self.store.stalled_engines()? {
                events.push(DetectedEvent::EngineStalled { engine });
            }
        }

        if self.events.escalations {
            let rows = self.store.unacked_escalations()?;
            if !rows.is_empty() {
                let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
                for escalation in rows {
                    events.push(DetectedEvent::Escalation { escalation });
                }
                // Flip acknowledged so these never surface again
                self.store.ack_escalations(&ids)?;
            }
        }

        Ok(events)
    }

    fn detect_car_changes(&self, events: &mut Vec<DetectedEvent>) -> Result<(), EngineError> {
        let cars = self.store.list_cars(&CarFilter::default())?;
        let mut state = self.state.lock();

        if !state.seeded {
            // First poll seeds silently: no startup burst
            state.snapshot = snapshot_of(&cars);
            state.seeded = true;
            return Ok(());
        }

        for car in &cars {
            match state.snapshot.get(&car.id) {
                None => {
                    events.push(DetectedEvent::CarStatusChange {
                        car: car.clone(),
                        old_status: String::new(),
                    });
                }
                Some(snap) if snap.status != car.status => {
                    events.push(DetectedEvent::CarStatusChange {
                        car: car.clone(),
                        old_status: snap.status.clone(),
                    });
                }
                Some(_) => {}
            }
        }
        // Replacing wholesale also drops ids deleted from the DB
        state.snapshot = snapshot_of(&cars);
        Ok(())
    }

    /// Pulse pass: the current status summary, suppressed when the yard is
    /// idle or nothing changed since the last emitted pulse.
    pub fn pulse(&self) -> Result<Option<DetectedEvent>, EngineError> {
        let status = self.store.status_info()?;
        let digest = status.digest();
        let mut state = self.state.lock();

        if status.is_idle() {
            return Ok(None);
        }
        if state.last_pulse_digest == Some(digest) {
            return Ok(None);
        }
        state.last_pulse_digest = Some(digest);
        state.last_pulse_at = Some(self.clock.now());
        Ok(Some(DetectedEvent::Pulse { status }))
    }

    /// When the last pulse was emitted, if ever.
    pub fn last_pulse_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().last_pulse_at
    }

    /// Evaluate digest crons against the current minute.
    pub fn check_digests(&self) -> Result<Vec<DetectedEvent>, EngineError> {
        let now = self.clock.now();
        let (daily_due, weekly_due) = {
            let mut state = self.state.lock();
            (state.daily.due(now), state.weekly.due(now))
        };

        let mut events = Vec::new();
        if daily_due {
            if let Some(event) = self.build_daily_digest()? {
                events.push(event);
            }
        }
        if weekly_due {
            if let Some(event) = self.build_weekly_digest()? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Digest of the trailing 24 hours; `None` when nothing happened.
    pub fn build_daily_digest(&self) -> Result<Option<DetectedEvent>, EngineError> {
        Ok(build_digest("Daily digest", &self.store.digest_window(24)?))
    }

    /// Digest of the trailing 7 days; `None` when nothing happened.
    pub fn build_weekly_digest(&self) -> Result<Option<DetectedEvent>, EngineError> {
        Ok(build_digest(
            "Weekly digest",
            &self.store.digest_window(7 * 24)?,
        ))
    }

    /// Background loop: poll ticker, pulse ticker, and a minute-resolution
    /// cron check. Exits when `shutdown` flips or the channel closes.
    pub async fn run(self, tx: mpsc::Sender<DetectedEvent>, mut shutdown: watch::Receiver<bool>) {
        let mut poll_tick = tokio::time::interval(self.events.poll_interval());
        let mut pulse_tick = tokio::time::interval(self.events.pulse_interval());
        let mut cron_tick = tokio::time::interval(Duration::from_secs(20));
        // Intervals fire immediately; only the seeding poll should
        pulse_tick.tick().await;
        cron_tick.tick().await;

        tracing::info!(
            poll_secs = self.events.poll_interval_secs,
            pulse_secs = self.events.pulse_interval_secs,
            "watcher started"
        );

        loop {
            let batch = tokio::select! {
                _ = poll_tick.tick() => self.poll(),
                _ = pulse_tick.tick() => self.pulse().map(|e| e.into_iter().collect()),
                _ = cron_tick.tick() => self.check_digests(),
                _ = shutdown.changed() => break,
            };

            match batch {
                Ok(events) => {
                    for event in events {
                        if tx.send(event).await.is_err() {
                            tracing::info!("watcher channel closed, stopping");
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "watcher pass failed");
                }
            }

            if *shutdown.borrow() {
                break;
            }
        }
        tracing::info!("watcher stopped");
    }
}

fn snapshot_of(cars: &[Car]) -> HashMap<String, CarSnap> {
    cars.iter()
        .map(|car| {
            (
                car.id.clone(),
                CarSnap {
                    status: car.status.clone(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
