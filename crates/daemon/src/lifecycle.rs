// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: paths, startup wiring, shutdown.

use std::fs::File;
use std::path::PathBuf;

use fs2::FileExt;
use tg_adapters::{AgentSpawner, ChatAdapter, ConsoleChatAdapter};
use tg_core::{SystemClock, TelegraphConfig};
use tg_engine::{
    CommandHandler, ConversationStore, Router, SessionConfig, SessionManager, Watcher,
};
use tg_storage::Store;
use thiserror::Error;
use tracing::info;

/// Concrete session manager type for the daemon wiring.
pub type DaemonSessionManager = SessionManager<ConsoleChatAdapter, AgentSpawner, SystemClock>;
/// Concrete router type for the daemon wiring.
pub type DaemonRouter = Router<ConsoleChatAdapter, AgentSpawner, SystemClock>;

/// Daemon file locations.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/telegraph)
    pub state_dir: PathBuf,
    /// SQLite database path
    pub db_path: PathBuf,
    /// TOML configuration path
    pub config_path: PathBuf,
    /// Daemon log file
    pub log_path: PathBuf,
    /// Lock/PID file
    pub lock_path: PathBuf,
}

impl Config {
    /// Resolve paths for the user-level daemon.
    ///
    /// `TELEGRAPH_STATE_DIR` takes priority (tests use it for isolation),
    /// then `$XDG_STATE_HOME/telegraph`, then `~/.local/state/telegraph`.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = state_dir()?;
        Ok(Self::for_state_dir(state_dir))
    }

    /// Paths rooted at an explicit state directory.
    pub fn for_state_dir(state_dir: PathBuf) -> Self {
        Self {
            db_path: state_dir.join("telegraph.db"),
            config_path: state_dir.join("telegraph.toml"),
            log_path: state_dir.join("telegraph.log"),
            lock_path: state_dir.join("telegraph.pid"),
            state_dir,
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] tg_core::ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] tg_storage::StoreError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] tg_adapters::ChatError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wired daemon subsystems, ready to pump.
pub struct DaemonState {
    pub config: Config,
    pub settings: TelegraphConfig,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub adapter: ConsoleChatAdapter,
    pub sessions: DaemonSessionManager,
    pub router: DaemonRouter,
}

/// Result of daemon startup.
pub struct StartupResult {
    pub daemon: DaemonState,
    /// Watcher, to be spawned as a background task.
    pub watcher: Watcher<SystemClock>,
}

/// Start the daemon: lock, load config, open the store, wire subsystems.
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Acquire lock file FIRST - prevents races.
    // Use OpenOptions to avoid truncating the file before we hold the lock,
    // which would wipe the running daemon's PID.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // Write PID now that we hold the lock
    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    let settings = TelegraphConfig::load(&config.config_path)?;
    let store = Store::open(&config.db_path, SystemClock)?;

    let adapter = ConsoleChatAdapter::new();
    adapter.connect().await?;

    let spawner = AgentSpawner::new(settings.process.command.clone(), settings.process.timeout());

    let conversations = ConversationStore::new(store.clone(), Some(adapter.clone()), &settings.conv);
    let sessions = SessionManager::new(
        store.clone(),
        conversations,
        spawner,
        SessionConfig {
            source: "telegraph".to_string(),
            heartbeat_timeout: settings.dispatch.heartbeat_timeout(),
        },
    );
    let router = Router::new(
        adapter.clone(),
        sessions.clone(),
        CommandHandler::new(store.clone()),
    );
    let watcher = Watcher::new(
        store,
        SystemClock,
        settings.events.clone(),
        &settings.digest,
    );

    info!(
        db = %config.db_path.display(),
        "daemon wired"
    );

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            settings,
            lock_file,
            adapter,
            sessions,
            router,
        },
        watcher,
    })
}

impl DaemonState {
    /// Graceful teardown: close sessions, then the platform connection,
    /// then drop state files.
    pub async fn shutdown(&self) {
        info!("Shutting down daemon...");
        self.sessions.close_all().await;
        self.adapter.close().await;

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                tracing::warn!("Failed to remove PID file: {}", e);
            }
        }
        info!("Daemon shutdown complete");
    }
}

/// Get the state directory for telegraph
fn state_dir() -> Result<PathBuf, LifecycleError> {
    // TELEGRAPH_STATE_DIR takes priority (used by tests for isolation)
    if let Ok(dir) = std::env::var("TELEGRAPH_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }

    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("telegraph"));
    }

    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/telegraph"))
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
