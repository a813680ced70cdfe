// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot agent subprocess adapters.
//!
//! A [`Process`] reads its entire input once, either written through
//! [`Process::send`] (which closes stdin, signalling the agent to start)
//! or pre-delivered as a spawn-time prompt. It produces a stream of output
//! lines and exits. The spawner bounds every child with a wall-clock
//! timeout that takes the same teardown path as [`Process::close`].

mod local;

pub use local::{AgentProcess, AgentSpawner};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcess, FakeProcessSpawner};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from subprocess operations
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("input already sent")]
    AlreadySent,
    #[error("process has no input stream")]
    NoInput,
    #[error("process closed")]
    Closed,
    #[error("write failed: {0}")]
    WriteFailed(String),
}

/// Handle to a running one-shot subprocess.
#[async_trait]
pub trait Process: Send + Sync + 'static {
    /// Write the single input message and close stdin.
    ///
    /// At most one call succeeds. Processes that received their prompt at
    /// spawn time have no input stream and fail with
    /// [`ProcessError::NoInput`]; a second call fails with
    /// [`ProcessError::AlreadySent`]; any call after [`Process::close`]
    /// fails with [`ProcessError::Closed`].
    async fn send(&self, input: &str) -> Result<(), ProcessError>;

    /// Take the output line stream. The channel closes at stdout EOF.
    ///
    /// Returns `None` on every call after the first.
    fn take_output(&self) -> Option<mpsc::Receiver<String>>;

    /// Completes once the output stream has closed and the child is reaped.
    async fn wait_done(&self);

    /// Tear the subprocess down (terminates the whole process group).
    /// Idempotent; returns promptly.
    async fn close(&self);
}

/// Spawns one-shot agent subprocesses.
#[async_trait]
pub trait ProcessSpawner: Clone + Send + Sync + 'static {
    type Handle: Process;

    /// Spawn a subprocess. A non-empty `prompt` is delivered on stdin at
    /// spawn time and the input stream is closed immediately; the handle's
    /// `send` then fails with [`ProcessError::NoInput`].
    async fn spawn(&self, prompt: &str) -> Result<Self::Handle, ProcessError>;
}
