// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Platform and subprocess adapters for Telegraph.
//!
//! Two boundaries live here: the [`ChatAdapter`] contract the core speaks
//! to chat platforms through, and the [`ProcessSpawner`] / [`Process`]
//! contract for the one-shot agent subprocess. Real platform SDKs plug in
//! from outside; this crate ships the console adapter for local runs and
//! fakes for tests.

pub mod chat;
pub mod process;

pub use chat::{BackoffPolicy, ChatAdapter, ChatError, ConsoleChatAdapter, with_backoff};
pub use process::{AgentSpawner, Process, ProcessError, ProcessSpawner};

#[cfg(any(test, feature = "test-support"))]
pub use chat::{FakeChatAdapter, StartThreadCall};
#[cfg(any(test, feature = "test-support"))]
pub use process::{FakeProcess, FakeProcessSpawner};
