// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telegraph configuration.
//!
//! Loaded from a TOML file; every field has a default so an absent or empty
//! file yields a working configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration for the Telegraph daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegraphConfig {
    pub dispatch: DispatchConfig,
    pub events: EventsConfig,
    pub digest: DigestConfig,
    pub conv: ConvConfig,
    pub process: ProcessConfig,
}

impl TelegraphConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(toml::from_str(&content)?)
    }
}

/// Session lease settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Lease expiry threshold; an active session whose heartbeat is older
    /// than this is reclaimable.
    pub heartbeat_timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            heartbeat_timeout_secs: 90,
        }
    }
}

impl DispatchConfig {
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }
}

/// Watcher polling and per-category emission toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub poll_interval_secs: u64,
    pub pulse_interval_secs: u64,
    pub car_lifecycle: bool,
    pub engine_stalls: bool,
    pub escalations: bool,
    /// Channel that receives watcher notifications.
    pub notify_channel: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 15,
            pulse_interval_secs: 30 * 60,
            car_lifecycle: true,
            engine_stalls: true,
            escalations: true,
            notify_channel: "console".to_string(),
        }
    }
}

impl EventsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn pulse_interval(&self) -> Duration {
        Duration::from_secs(self.pulse_interval_secs)
    }
}

/// Cron-scheduled digest settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub daily: DigestSchedule,
    pub weekly: DigestSchedule,
}

/// One digest schedule: a 5-field cron expression and an enable switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestSchedule {
    pub enabled: bool,
    pub cron: String,
}

impl Default for DigestSchedule {
    fn default() -> Self {
        Self {
            enabled: false,
            cron: "0 9 * * *".to_string(),
        }
    }
}

/// Conversation persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvConfig {
    /// Hard cap on turns per session; writes past it fail.
    pub max_turns_per_session: i64,
    /// How far back `recover_from_thread` searches for prior sessions.
    pub recovery_lookback_days: i64,
}

impl Default for ConvConfig {
    fn default() -> Self {
        Self {
            max_turns_per_session: 100,
            recovery_lookback_days: 30,
        }
    }
}

/// Agent subprocess settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Argv of the one-shot agent binary.
    pub command: Vec<String>,
    /// Wall-clock bound on every spawned subprocess.
    pub timeout_secs: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            command: vec!["railyard-agent".to_string()],
            timeout_secs: 5 * 60,
        }
    }
}

impl ProcessConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
