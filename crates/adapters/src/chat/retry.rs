// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded exponential backoff for rate-limited platform calls.

use super::ChatError;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Retry policy for rate-limited calls.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub initial: Duration,
    /// Cap on the doubling delay.
    pub max: Duration,
    /// Total attempts, including the first.
    pub attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(30),
            attempts: 5,
        }
    }
}

/// Run `op`, retrying [`ChatError::RateLimited`] with exponential backoff.
///
/// A server-provided `retry_after` overrides the computed delay. Any other
/// error, and rate limiting past the attempt budget, surface unchanged.
/// Returns [`ChatError::Closed`] immediately when `shutdown` flips.
pub async fn with_backoff<T, F, Fut>(
    policy: BackoffPolicy,
    mut shutdown: watch::Receiver<bool>,
    mut op: F,
) -> Result<T, ChatError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ChatError>>,
{
    let mut delay = policy.initial;
    let mut attempt = 0u32;

    loop {
        if *shutdown.borrow() {
            return Err(ChatError::Closed);
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(ChatError::RateLimited { retry_after }) => {
                attempt += 1;
                if attempt >= policy.attempts {
                    return Err(ChatError::RateLimited { retry_after });
                }
                let wait = retry_after.unwrap_or(delay);
                tracing::debug!(attempt, wait_ms = wait.as_millis() as u64, "rate limited, backing off");
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            return Err(ChatError::Closed);
                        }
                    }
                }
                delay = (delay * 2).min(policy.max);
            }
            Err(other) => return Err(other),
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
