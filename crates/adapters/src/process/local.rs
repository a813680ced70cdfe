// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local subprocess spawner.
//!
//! Children run in their own process group so teardown can terminate the
//! whole tree. Group termination shells out to `kill` rather than linking
//! a signal crate; the workspace forbids unsafe code.

use super::{Process, ProcessError, ProcessSpawner};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, Command};
use tokio::sync::{mpsc, watch};

/// Output line channel depth per process.
const OUTPUT_BUFFER: usize = 256;

/// Spawner for the configured agent binary.
#[derive(Clone, Debug)]
pub struct AgentSpawner {
    argv: Vec<String>,
    timeout: Duration,
}

impl AgentSpawner {
    /// `argv` is the agent command line; `timeout` bounds every child.
    pub fn new(argv: Vec<String>, timeout: Duration) -> Self {
        Self { argv, timeout }
    }
}

#[async_trait]
impl ProcessSpawner for AgentSpawner {
    type Handle = AgentProcess;

    async fn spawn(&self, prompt: &str) -> Result<AgentProcess, ProcessError> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(ProcessError::SpawnFailed("empty agent command".to_string()));
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .process_group(0);

        let mut child = cmd
            .spawn()
            .map_err(|e| ProcessError::SpawnFailed(format!("{program}: {e}")))?;
        let pid = child.id();

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Pump stderr into the log so agent failures are diagnosable.
        if let Some(stderr) = stderr {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(target: "tg_adapters::agent", "{line}");
                }
            });
        }

        let slot = match stdin {
            Some(mut stdin) if !prompt.is_empty() => {
                // Spawn-time prompt: deliver and close the stream now.
                stdin
                    .write_all(prompt.as_bytes())
                    .await
                    .map_err(|e| ProcessError::SpawnFailed(format!("prompt write: {e}")))?;
                stdin
                    .shutdown()
                    .await
                    .map_err(|e| ProcessError::SpawnFailed(format!("prompt close: {e}")))?;
                StdinSlot::Absent
            }
            Some(stdin) => StdinSlot::Ready(stdin),
            None => StdinSlot::Absent,
        };

        let (line_tx, line_rx) = mpsc::channel(OUTPUT_BUFFER);
        let reader = tokio::spawn(async move {
            let Some(stdout) = stdout else { return };
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line_tx.send(line).await.is_err() {
                    return;
                }
            }
        });

        let (done_tx, done_rx) = watch::channel(false);
        tokio::spawn(async move {
            let status = child.wait().await;
            let _ = reader.await;
            tracing::debug!(pid, exit = ?status.as_ref().ok().and_then(|s| s.code()), "agent process reaped");
            let _ = done_tx.send(true);
        });

        let closed = Arc::new(AtomicBool::new(false));

        // Timeout takes the same path as close(): terminate the group.
        {
            let mut done = done_rx.clone();
            let closed = Arc::clone(&closed);
            let timeout = self.timeout;
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(timeout) => {
                        if !closed.swap(true, Ordering::SeqCst) {
                            tracing::warn!(pid, timeout_secs = timeout.as_secs(), "agent process timed out");
                            if let Some(pid) = pid {
                                terminate_group(pid).await;
                            }
                        }
                    }
                    _ = done.changed() => {}
                }
            });
        }

        Ok(AgentProcess {
            pid,
            stdin: tokio::sync::Mutex::new(slot),
            output: Mutex::new(Some(line_rx)),
            done_rx,
            closed,
        })
    }
}

enum StdinSlot {
    Ready(ChildStdin),
    Consumed,
    Absent,
}

/// A running agent subprocess.
pub struct AgentProcess {
    pid: Option<u32>,
    stdin: tokio::sync::Mutex<StdinSlot>,
    output: Mutex<Option<mpsc::Receiver<String>>>,
    done_rx: watch::Receiver<bool>,
    closed: Arc<AtomicBool>,
}

impl AgentProcess {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

#[async_trait]
impl Process for AgentProcess {
    async fn send(&self, input: &str) -> Result<(), ProcessError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ProcessError::Closed);
        }
        let mut slot = self.stdin.lock().await;
        match std::mem::replace(&mut *slot, StdinSlot::Consumed) {
            StdinSlot::Ready(mut stdin) => {
                stdin
                    .write_all(input.as_bytes())
                    .await
                    .map_err(|e| ProcessError::WriteFailed(e.to_string()))?;
                stdin
                    .shutdown()
                    .await
                    .map_err(|e| ProcessError::WriteFailed(e.to_string()))?;
                Ok(())
            }
            StdinSlot::Consumed => Err(ProcessError::AlreadySent),
            StdinSlot::Absent => {
                *slot = StdinSlot::Absent;
                Err(ProcessError::NoInput)
            }
        }
    }

    fn take_output(&self) -> Option<mpsc::Receiver<String>> {
        self.output.lock().take()
    }

    async fn wait_done(&self) {
        let mut done = self.done_rx.clone();
        while !*done.borrow() {
            if done.changed().await.is_err() {
                return;
            }
        }
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        // Drop any unconsumed stdin so the child sees EOF even if the
        // group signal races with process startup.
        {
            let mut slot = self.stdin.lock().await;
            *slot = StdinSlot::Absent;
        }
        if let Some(pid) = self.pid {
            terminate_group(pid).await;
        }
    }
}

/// Send SIGTERM to the child's whole process group.
async fn terminate_group(pid: u32) {
    let result = Command::new("kill")
        .arg("-TERM")
        .arg("--")
        .arg(format!("-{pid}"))
        .output()
        .await;
    if let Err(e) = result {
        tracing::warn!(pid, error = %e, "failed to signal agent process group");
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
