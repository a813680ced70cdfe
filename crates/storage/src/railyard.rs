// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-side queries over the orchestrator tables.
//!
//! Everything here is read-only except [`Store::ack_escalations`], which
//! flips `messages.acknowledged` after delivery so an escalation never
//! surfaces twice.

use crate::db::{from_epoch, Store};
use crate::StoreError;
use rusqlite::{params, OptionalExtension, Row};
use tg_core::{
    Car, Clock, CompletionSample, DigestWindow, EngineRow, EscalationRow, StatusInfo, TrackStat,
};

fn car_from_row(row: &Row<'_>) -> rusqlite::Result<Car> {
    Ok(Car {
        id: row.get("id")?,
        status: row.get("status")?,
        track: row.get("track")?,
        title: row.get("title")?,
    })
}

fn engine_from_row(row: &Row<'_>) -> rusqlite::Result<EngineRow> {
    Ok(EngineRow {
        id: row.get("id")?,
        name: row.get("name")?,
        status: row.get("status")?,
        current_car: row.get("current_car")?,
    })
}

/// Optional filters for car listings (`!ry car list`).
#[derive(Debug, Clone, Default)]
pub struct CarFilter {
    pub track: Option<String>,
    pub status: Option<String>,
    pub car_type: Option<String>,
}

impl<C: Clock> Store<C> {
    /// Every car's current lifecycle fields, for snapshot diffing.
    pub fn list_cars(&self, filter: &CarFilter) -> Result<Vec<Car>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, status, track, title FROM cars
             WHERE (?1 IS NULL OR track = ?1)
               AND (?2 IS NULL OR status = ?2)
               AND (?3 IS NULL OR car_type = ?3)
             ORDER BY id",
        )?;
        let cars = stmt
            .query_map(
                params![filter.track, filter.status, filter.car_type],
                car_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cars)
    }

    /// One car by id.
    pub fn get_car(&self, car_id: &str) -> Result<Option<Car>, StoreError> {
        let conn = self.conn.lock();
        let car = conn
            .query_row(
                "SELECT id, status, track, title FROM cars WHERE id = ?1",
                params![car_id],
                car_from_row,
            )
            .optional()?;
        Ok(car)
    }

    /// All engines, for `!ry engine list` and pulse rendering.
    pub fn list_engines(&self) -> Result<Vec<EngineRow>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT id, name, status, current_car FROM engines ORDER BY name")?;
        let engines = stmt
            .query_map([], engine_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(engines)
    }

    /// Engines currently reporting the stalled status.
    pub fn stalled_engines(&self) -> Result<Vec<EngineRow>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, status, current_car FROM engines
             WHERE status = 'stalled' ORDER BY name",
        )?;
        let engines = stmt
            .query_map([], engine_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(engines)
    }

    /// Unacknowledged messages addressed to the operators, oldest first.
    pub fn unacked_escalations(&self) -> Result<Vec<EscalationRow>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, from_agent, subject, body, priority, created_at
             FROM messages
             WHERE to_agent IN ('human', 'telegraph') AND acknowledged = 0
             ORDER BY created_at ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(EscalationRow {
                    id: row.get("id")?,
                    from_agent: row.get("from_agent")?,
                    subject: row.get("subject")?,
                    body: row.get("body")?,
                    priority: row.get("priority")?,
                    created_at: from_epoch(row.get("created_at")?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Mark a batch of escalations acknowledged in one statement.
    pub fn ack_escalations(&self, ids: &[i64]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "UPDATE messages SET acknowledged = 1 WHERE id IN ({placeholders})"
        );
        let conn = self.conn.lock();
        conn.execute(&sql, rusqlite::params_from_iter(ids.iter()))?;
        Ok(())
    }

    /// Full orchestration status: totals, per-track breakdown, engines.
    pub fn status_info(&self) -> Result<StatusInfo, StoreError> {
        let (total_active, total_ready, total_done, total_blocked) = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT
                     COUNT(*) FILTER (WHERE status = 'in_progress'),
                     COUNT(*) FILTER (WHERE status IN ('open', 'draft')),
                     COUNT(*) FILTER (WHERE status IN ('done', 'merged')),
                     COUNT(*) FILTER (WHERE status = 'blocked')
                 FROM cars",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )?
        };

        let tracks = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare(
                "SELECT track,
                        COUNT(*) FILTER (WHERE status = 'in_progress'),
                        COUNT(*) FILTER (WHERE status IN ('open', 'draft')),
                        COUNT(*) FILTER (WHERE status IN ('done', 'merged')),
                        COUNT(*) FILTER (WHERE status = 'blocked')
                 FROM cars GROUP BY track ORDER BY track",
            )?;
            let result = stmt
                .query_map([], |row| {
                    Ok(TrackStat {
                        track: row.get(0)?,
                        active: row.get(1)?,
                        ready: row.get(2)?,
                        done: row.get(3)?,
                        blocked: row.get(4)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            result
        };

        Ok(StatusInfo {
            total_active,
            total_ready,
            total_done,
            total_blocked,
            tracks,
            engines: self.list_engines()?,
        })
    }

    /// Raw activity counts over the trailing `window_hours`.
    ///
    /// Completion-time samples are returned raw; averaging happens in the
    /// caller so the math stays out of SQL.
    pub fn digest_window(&self, window_hours: i64) -> Result<DigestWindow, StoreError> {
        let since = self.clock.now().timestamp() - window_hours * 3600;
        let conn = self.conn.lock();

        let (cars_created, cars_completed, cars_merged, merge_failures) = conn.query_row(
            "SELECT
                 COUNT(*) FILTER (WHERE created_at >= ?1),
                 COUNT(*) FILTER (WHERE completed_at >= ?1
                                    AND status IN ('done', 'merged')),
                 COUNT(*) FILTER (WHERE completed_at >= ?1 AND status = 'merged'),
                 COUNT(*) FILTER (WHERE completed_at >= ?1 AND status = 'merge-failed')
             FROM cars",
            params![since],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )?;

        let (engine_stalls, tokens_used) = conn.query_row(
            "SELECT
                 COUNT(*) FILTER (WHERE action = 'stalled'),
                 COALESCE(SUM(tokens_used), 0)
             FROM agent_log WHERE created_at >= ?1",
            params![since],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )?;

        let mut stmt = conn.prepare(
            "SELECT track, claimed_at, completed_at FROM cars
             WHERE completed_at >= ?1 AND claimed_at IS NOT NULL
               AND status IN ('done', 'merged')",
        )?;
        let completions = stmt
            .query_map(params![since], |row| {
                Ok(CompletionSample {
                    track: row.get(0)?,
                    claimed_at: from_epoch(row.get(1)?),
                    completed_at: from_epoch(row.get(2)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(DigestWindow {
            cars_created,
            cars_completed,
            cars_merged,
            merge_failures,
            engine_stalls,
            tokens_used,
            completions,
        })
    }
}

#[cfg(test)]
#[path = "railyard_tests.rs"]
mod tests;
