// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal 5-field cron expressions for digest scheduling.
//!
//! Supports `*`, single values, ranges, steps, and lists per field
//! (`minute hour day-of-month month day-of-week`). Day-of-week accepts
//! 0-7 with both 0 and 7 meaning Sunday. As in classic cron, when both
//! day fields are restricted a timestamp matches if either does.
//! Evaluation is minute-resolution against UTC.

use chrono::{DateTime, Datelike, Timelike, Utc};
use thiserror::Error;

/// Cron parse errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CronError {
    #[error("expected 5 fields, got {0}")]
    FieldCount(usize),
    #[error("invalid field value: {0}")]
    Invalid(String),
    #[error("value {value} out of range {min}-{max}")]
    OutOfRange { value: u32, min: u32, max: u32 },
}

/// A parsed 5-field cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpr {
    minutes: u64,
    hours: u32,
    days_of_month: u32,
    months: u16,
    days_of_week: u8,
    dom_restricted: bool,
    dow_restricted: bool,
}

impl CronExpr {
    /// Parse an expression like `"0 9 * * 1-5"`.
    pub fn parse(expr: &str) -> Result<Self, CronError> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(CronError::FieldCount(fields.len()));
        }

        let minutes = parse_field(fields[0], 0, 59)?;
        let hours = parse_field(fields[1], 0, 23)?;
        let days_of_month = parse_field(fields[2], 1, 31)?;
        let months = parse_field(fields[3], 1, 12)?;
        // 7 is an alias for Sunday (0)
        let raw_dow = parse_field(fields[4], 0, 7)?;
        let days_of_week = ((raw_dow | (raw_dow >> 7)) & 0x7f) as u8;

        Ok(Self {
            minutes,
            hours: hours as u32,
            days_of_month: days_of_month as u32,
            months: months as u16,
            days_of_week,
            dom_restricted: fields[2] != "*",
            dow_restricted: fields[4] != "*",
        })
    }

    /// Whether `at` (truncated to the minute) matches this expression.
    pub fn matches(&self, at: DateTime<Utc>) -> bool {
        if self.minutes & (1 << at.minute()) == 0 {
            return false;
        }
        if self.hours & (1 << at.hour()) == 0 {
            return false;
        }
        if self.months & (1 << at.month()) == 0 {
            return false;
        }

        let dom_match = self.days_of_month & (1 << at.day()) != 0;
        let dow_match = self.days_of_week & (1 << at.weekday().num_days_from_sunday()) != 0;

        // Classic cron: both day fields restricted means either may match
        match (self.dom_restricted, self.dow_restricted) {
            (true, true) => dom_match || dow_match,
            _ => dom_match && dow_match,
        }
    }
}

/// Parse one field into a bitmask over `min..=max`.
fn parse_field(field: &str, min: u32, max: u32) -> Result<u64, CronError> {
    let mut mask = 0u64;
    for part in field.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step
                    .parse()
                    .map_err(|_| CronError::Invalid(part.to_string()))?;
                if step == 0 {
                    return Err(CronError::Invalid(part.to_string()));
                }
                (range, step)
            }
            None => (part, 1),
        };

        let (start, end) = if range == "*" {
            (min, max)
        } else if let Some((a, b)) = range.split_once('-') {
            let a = parse_value(a, min, max)?;
            let b = parse_value(b, min, max)?;
            if a > b {
                return Err(CronError::Invalid(part.to_string()));
            }
            (a, b)
        } else {
            let v = parse_value(range, min, max)?;
            // A bare value with a step ("5/15") ranges to the max
            if step > 1 {
                (v, max)
            } else {
                (v, v)
            }
        };

        let mut v = start;
        while v <= end {
            mask |= 1 << v;
            v += step;
        }
    }
    Ok(mask)
}

fn parse_value(s: &str, min: u32, max: u32) -> Result<u32, CronError> {
    let value: u32 = s
        .parse()
        .map_err(|_| CronError::Invalid(s.to_string()))?;
    if value < min || value > max {
        return Err(CronError::OutOfRange { value, min, max });
    }
    Ok(value)
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
