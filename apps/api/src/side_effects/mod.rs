//! Side effects: the only place the service touches the outside world on a candidate's behalf.
//!
//! `SideEffectExecutor` owns retry and idempotency; `mail` and `meetings` are the
//! transports it drives. Both transports sit behind traits so a conversation can be
//! replayed against recording fakes.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod executor;
pub mod ledger;
pub mod mail;
pub mod meetings;

#[cfg(test)]
pub mod testing;

pub use executor::SideEffectExecutor;

/// Why a side effect ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Mail relay unreachable, refused the login, or timed out on every attempt.
    Transport,
    /// The message could not be built (bad address); never retried.
    InvalidMessage,
    /// The meeting service refused to issue an access token.
    Credential,
    /// A token was issued but the meeting could not be created.
    MeetingCreation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{kind:?} failure: {reason}")]
pub struct SideEffectFailure {
    pub kind: FailureKind,
    pub reason: String,
    /// External calls made before giving up.
    pub attempts: u32,
}

impl SideEffectFailure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
            attempts: 1,
        }
    }

    pub fn after_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

/// A side effect result that knows how many external calls produced it.
pub trait Attempted {
    fn attempts(&self) -> u32;
}

impl Attempted for SideEffectFailure {
    fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Attempt budget and backoff base for external calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before the given 1-based attempt: 0 for the first, then base, 2×base, 4×base…
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            Duration::ZERO
        } else {
            self.base_delay * (1 << (attempt - 2))
        }
    }
}
