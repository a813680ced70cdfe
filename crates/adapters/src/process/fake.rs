// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake subprocess spawner for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Process, ProcessError, ProcessSpawner};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

struct FakeProcessState {
    prompt: String,
    sent: Option<String>,
    closed: bool,
    script: Vec<String>,
    output_tx: Option<mpsc::Sender<String>>,
}

/// Scripted stand-in for an agent subprocess.
///
/// Spawned with a prompt, it emits its scripted output immediately (the
/// prompt-at-spawn model). Spawned without one, it emits when `send`
/// arrives. [`FakeProcess::exit_now`] simulates an exit with no output.
#[derive(Clone)]
pub struct FakeProcess {
    inner: Arc<Mutex<FakeProcessState>>,
    output_rx: Arc<Mutex<Option<mpsc::Receiver<String>>>>,
    done_tx: Arc<watch::Sender<bool>>,
    done_rx: watch::Receiver<bool>,
}

impl FakeProcess {
    fn new(prompt: &str, script: Vec<String>) -> Self {
        let (output_tx, output_rx) = mpsc::channel(script.len().max(1));
        let (done_tx, done_rx) = watch::channel(false);
        let process = Self {
            inner: Arc::new(Mutex::new(FakeProcessState {
                prompt: prompt.to_string(),
                sent: None,
                closed: false,
                script,
                output_tx: Some(output_tx),
            })),
            output_rx: Arc::new(Mutex::new(Some(output_rx))),
            done_tx: Arc::new(done_tx),
            done_rx,
        };
        if !process.inner.lock().prompt.is_empty() {
            process.emit();
        }
        process
    }

    /// The spawn-time prompt, empty for send-driven processes.
    pub fn prompt(&self) -> String {
        self.inner.lock().prompt.clone()
    }

    /// What `send` delivered, if anything.
    pub fn sent(&self) -> Option<String> {
        self.inner.lock().sent.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Simulate the subprocess exiting without emitting output.
    pub fn exit_now(&self) {
        let mut state = self.inner.lock();
        state.script.clear();
        state.output_tx = None;
        drop(state);
        let _ = self.done_tx.send(true);
    }

    /// Queue the scripted lines and close the stream (process "exits").
    fn emit(&self) {
        let mut state = self.inner.lock();
        if let Some(tx) = state.output_tx.take() {
            for line in state.script.drain(..) {
                let _ = tx.try_send(line);
            }
        }
        drop(state);
        let _ = self.done_tx.send(true);
    }
}

#[async_trait]
impl Process for FakeProcess {
    async fn send(&self, input: &str) -> Result<(), ProcessError> {
        {
            let mut state = self.inner.lock();
            if state.closed {
                return Err(ProcessError::Closed);
            }
            if !state.prompt.is_empty() {
                return Err(ProcessError::NoInput);
            }
            if state.sent.is_some() {
                return Err(ProcessError::AlreadySent);
            }
            state.sent = Some(input.to_string());
        }
        self.emit();
        Ok(())
    }

    fn take_output(&self) -> Option<mpsc::Receiver<String>> {
        self.output_rx.lock().take()
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
        {
            let mut state = self.inner.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.output_tx = None;
        }
        let _ = self.done_tx.send(true);
    }
}

struct FakeSpawnerState {
    scripts: VecDeque<Vec<String>>,
    fail_next: bool,
    spawned: Vec<FakeProcess>,
}

/// Fake spawner handing out [`FakeProcess`] handles.
#[derive(Clone)]
pub struct FakeProcessSpawner {
    inner: Arc<Mutex<FakeSpawnerState>>,
}

impl Default for FakeProcessSpawner {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeSpawnerState {
                scripts: VecDeque::new(),
                fail_next: false,
                spawned: Vec::new(),
            })),
        }
    }
}

impl FakeProcessSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the output script for the next spawn. Unscripted spawns emit
    /// nothing.
    pub fn push_script(&self, lines: &[&str]) {
        self.inner
            .lock()
            .scripts
            .push_back(lines.iter().map(|l| l.to_string()).collect());
    }

    /// Make the next spawn fail.
    pub fn fail_next_spawn(&self) {
        self.inner.lock().fail_next = true;
    }

    /// Handles of every process spawned so far.
    pub fn spawned(&self) -> Vec<FakeProcess> {
        self.inner.lock().spawned.clone()
    }

    /// Spawn-time prompts, in spawn order.
    pub fn prompts(&self) -> Vec<String> {
        self.inner.lock().spawned.iter().map(|p| p.prompt()).collect()
    }
}

#[async_trait]
impl ProcessSpawner for FakeProcessSpawner {
    type Handle = FakeProcess;

    async fn spawn(&self, prompt: &str) -> Result<FakeProcess, ProcessError> {
        let mut state = self.inner.lock();
        if state.fail_next {
            state.fail_next = false;
            return Err(ProcessError::SpawnFailed("injected spawn failure".to_string()));
        }
        let script = state.scripts.pop_front().unwrap_or_default();
        let process = FakeProcess::new(prompt, script);
        state.spawned.push(process.clone());
        Ok(process)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
