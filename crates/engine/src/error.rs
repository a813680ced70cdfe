// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types.

use tg_adapters::{ChatError, ProcessError};
use tg_core::ThreadKey;
use tg_storage::StoreError;
use thiserror::Error;

/// Errors from session and routing operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// `route` found no active session for the thread; callers retry
    /// through the resume path.
    #[error("no active session for {0}")]
    NoActiveSession(ThreadKey),

    /// Storage failures, including `LockHeld` and `MaxTurnsExceeded`.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The agent subprocess could not be started or driven.
    #[error("process error: {0}")]
    Process(#[from] ProcessError),

    /// Chat platform failure.
    #[error("adapter error: {0}")]
    Adapter(#[from] ChatError),
}

impl EngineError {
    /// True when the error is lock contention (another user holds the thread).
    pub fn is_lock_held(&self) -> bool {
        matches!(self, EngineError::Store(StoreError::LockHeld { .. }))
    }
}
