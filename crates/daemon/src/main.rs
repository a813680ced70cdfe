// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telegraph Daemon (tgd)
//!
//! Background process bridging chat threads to the Railyard orchestrator.
//!
//! Architecture:
//! - Inbound pump: adapter listen stream → Router
//! - Watcher task: orchestrator DB polling → formatted notifications
//! - Per-session tasks owned by the SessionManager

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use tg_adapters::ChatAdapter;
use tg_daemon::{lifecycle, pump, Config, LifecycleError, StartupResult};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("tgd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("tgd {}", env!("CARGO_PKG_VERSION"));
                println!("Telegraph Daemon - bridges chat threads to the Railyard orchestrator");
                println!();
                println!("USAGE:");
                println!("    tgd");
                println!();
                println!("Configuration is read from telegraph.toml in the state directory");
                println!("(TELEGRAPH_STATE_DIR, $XDG_STATE_HOME/telegraph, or");
                println!("~/.local/state/telegraph).");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: tgd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    // Rotate log file if it has grown too large
    rotate_log_if_needed(&config.log_path);

    // Set up logging
    let log_guard = setup_logging(&config)?;

    info!("Starting telegraph daemon");

    let StartupResult { daemon, watcher } = match lifecycle::startup(&config).await {
        Ok(result) => result,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("tgd is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    // Shutdown signal shared by the watcher, backoff loops, and this loop
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn the watcher task
    let (event_tx, mut event_rx) = mpsc::channel(64);
    tokio::spawn(watcher.run(event_tx, shutdown_rx.clone()));

    // Inbound message stream
    let mut inbound = daemon.adapter.listen().await.map_err(|e| {
        error!("Failed to start listening: {}", e);
        e
    })?;

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let notify_channel = daemon.settings.events.notify_channel.clone();
    info!("Daemon ready");

    loop {
        tokio::select! {
            msg = inbound.recv() => {
                match msg {
                    Some(msg) => {
                        daemon.router.handle(&msg).await;
                    }
                    None => {
                        info!("Inbound stream closed, shutting down...");
                        break;
                    }
                }
            }

            event = event_rx.recv() => {
                if let Some(event) = event {
                    pump::dispatch_event(
                        &daemon.adapter,
                        &notify_channel,
                        &event,
                        shutdown_rx.clone(),
                    )
                    .await;
                }
            }

            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }

            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
        }
    }

    let _ = shutdown_tx.send(true);
    daemon.shutdown().await;
    info!("Daemon stopped");
    Ok(())
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (telegraph.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `telegraph.log` → `telegraph.log.1` → `.2` → `.3`, deleting the
/// oldest. Best-effort: rotation failures are silently ignored so the
/// daemon still starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();

    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
