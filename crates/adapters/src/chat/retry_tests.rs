// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn fast_policy() -> BackoffPolicy {
    BackoffPolicy {
        initial: Duration::from_millis(1),
        max: Duration::from_millis(4),
        attempts: 3,
    }
}

fn no_shutdown() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    // Keep the sender alive for the duration of the test
    std::mem::forget(tx);
    rx
}

#[tokio::test]
async fn returns_first_success() {
    let calls = Arc::new(AtomicU32::new(0));
    let counted = Arc::clone(&calls);

    let result = with_backoff(fast_policy(), no_shutdown(), move || {
        let counted = Arc::clone(&counted);
        async move {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ChatError>(42)
        }
    })
    .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn retries_rate_limited_until_success() {
    let calls = Arc::new(AtomicU32::new(0));
    let counted = Arc::clone(&calls);

    let result = with_backoff(fast_policy(), no_shutdown(), move || {
        let counted = Arc::clone(&counted);
        async move {
            if counted.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ChatError::RateLimited { retry_after: None })
            } else {
                Ok("done")
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), "done");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn surfaces_rate_limit_after_attempts_exhausted() {
    let calls = Arc::new(AtomicU32::new(0));
    let counted = Arc::clone(&calls);

    let result: Result<(), ChatError> = with_backoff(fast_policy(), no_shutdown(), move || {
        let counted = Arc::clone(&counted);
        async move {
            counted.fetch_add(1, Ordering::SeqCst);
            Err(ChatError::RateLimited { retry_after: None })
        }
    })
    .await;

    assert!(matches!(result, Err(ChatError::RateLimited { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn non_rate_limit_errors_pass_through() {
    let calls = Arc::new(AtomicU32::new(0));
    let counted = Arc::clone(&calls);

    let result: Result<(), ChatError> = with_backoff(fast_policy(), no_shutdown(), move || {
        let counted = Arc::clone(&counted);
        async move {
            counted.fetch_add(1, Ordering::SeqCst);
            Err(ChatError::SendFailed("boom".to_string()))
        }
    })
    .await;

    assert!(matches!(result, Err(ChatError::SendFailed(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn honours_server_retry_after() {
    let started = std::time::Instant::now();
    let calls = Arc::new(AtomicU32::new(0));
    let counted = Arc::clone(&calls);

    let result = with_backoff(fast_policy(), no_shutdown(), move || {
        let counted = Arc::clone(&counted);
        async move {
            if counted.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ChatError::RateLimited {
                    retry_after: Some(Duration::from_millis(30)),
                })
            } else {
                Ok(())
            }
        }
    })
    .await;

    assert!(result.is_ok());
    assert!(started.elapsed() >= Duration::from_millis(30));
}

#[tokio::test]
async fn shutdown_aborts_immediately() {
    let (tx, rx) = watch::channel(true);
    drop(tx);

    let result: Result<(), ChatError> =
        with_backoff(fast_policy(), rx, || async { Ok(()) }).await;
    assert!(matches!(result, Err(ChatError::Closed)));
}
