// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn paths_root_under_the_state_dir() {
    let config = Config::for_state_dir(PathBuf::from("/tmp/tg-test"));
    assert_eq!(config.db_path, PathBuf::from("/tmp/tg-test/telegraph.db"));
    assert_eq!(
        config.config_path,
        PathBuf::from("/tmp/tg-test/telegraph.toml")
    );
    assert_eq!(config.log_path, PathBuf::from("/tmp/tg-test/telegraph.log"));
    assert_eq!(config.lock_path, PathBuf::from("/tmp/tg-test/telegraph.pid"));
}

#[tokio::test]
async fn startup_creates_state_and_holds_the_lock() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_state_dir(dir.path().join("state"));

    let result = startup(&config).await.unwrap();
    assert!(config.db_path.exists());
    assert!(config.lock_path.exists());

    // PID file holds our pid
    let pid: u32 = std::fs::read_to_string(&config.lock_path)
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert_eq!(pid, std::process::id());

    // A second daemon on the same state dir is refused
    let second = startup(&config).await;
    assert!(matches!(second, Err(LifecycleError::LockFailed(_))));

    result.daemon.shutdown().await;
    assert!(!config.lock_path.exists());
}

#[tokio::test]
async fn startup_reads_settings_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state");
    std::fs::create_dir_all(&state).unwrap();
    std::fs::write(
        state.join("telegraph.toml"),
        "[conv]\nmax_turns_per_session = 7\n\n[events]\nnotify_channel = \"ops\"\n",
    )
    .unwrap();

    let config = Config::for_state_dir(state);
    let result = startup(&config).await.unwrap();
    assert_eq!(result.daemon.settings.conv.max_turns_per_session, 7);
    assert_eq!(result.daemon.settings.events.notify_channel, "ops");
    result.daemon.shutdown().await;
}

#[tokio::test]
async fn startup_wires_a_working_session_manager() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_state_dir(dir.path().join("state"));
    let result = startup(&config).await.unwrap();

    // No sessions at startup; the historic check hits the real store
    let key = tg_core::ThreadKey::new("console", "T1");
    assert!(!result.daemon.sessions.has_session(&key));
    assert!(!result.daemon.sessions.has_historic_session(&key).unwrap());
    result.daemon.shutdown().await;
}
