// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;

#[test]
fn defaults_match_documented_values() {
    let config = TelegraphConfig::default();
    assert_eq!(config.dispatch.heartbeat_timeout_secs, 90);
    assert_eq!(config.events.poll_interval_secs, 15);
    assert_eq!(config.events.pulse_interval_secs, 1800);
    assert!(config.events.car_lifecycle);
    assert!(config.events.engine_stalls);
    assert!(config.events.escalations);
    assert!(!config.digest.daily.enabled);
    assert_eq!(config.conv.max_turns_per_session, 100);
    assert_eq!(config.conv.recovery_lookback_days, 30);
    assert_eq!(config.process.timeout_secs, 300);
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = TelegraphConfig::load(&dir.path().join("nope.toml")).unwrap();
    assert_eq!(config.conv.max_turns_per_session, 100);
}

#[test]
fn partial_file_overrides_only_named_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("telegraph.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        r#"
[dispatch]
heartbeat_timeout_secs = 30

[events]
poll_interval_secs = 5
escalations = false

[digest.weekly]
enabled = true
cron = "0 9 * * 1"

[conv]
max_turns_per_session = 3
"#
    )
    .unwrap();

    let config = TelegraphConfig::load(&path).unwrap();
    assert_eq!(config.dispatch.heartbeat_timeout_secs, 30);
    assert_eq!(config.events.poll_interval_secs, 5);
    assert!(!config.events.escalations);
    // untouched sections keep defaults
    assert!(config.events.car_lifecycle);
    assert_eq!(config.events.pulse_interval_secs, 1800);
    assert!(config.digest.weekly.enabled);
    assert_eq!(config.digest.weekly.cron, "0 9 * * 1");
    assert!(!config.digest.daily.enabled);
    assert_eq!(config.conv.max_turns_per_session, 3);
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("telegraph.toml");
    std::fs::write(&path, "not [valid").unwrap();
    assert!(matches!(
        TelegraphConfig::load(&path),
        Err(ConfigError::Parse(_))
    ));
}
