//! Retry policy for outbound requests.
//!
//! Only server-side failures (HTTP status >= 500) are retried. The delay is
//! linear in the attempt number: base, 2*base, ... up to `max_retries`
//! retries. This differs on purpose from the channel's exponential
//! reconnect backoff.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the initial attempt (default 2).
    pub max_retries: u32,
    /// Delay unit in milliseconds; retry N waits `N * base_delay_ms` (default 1000).
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 1_000,
        }
    }
}

/// Whether an HTTP status is a transient server failure.
pub fn is_retryable_status(status: u16) -> bool {
    status >= 500
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait `after`, then reissue the identical request.
    Retry { after: Duration },
    /// Propagate the failure to the caller.
    GiveUp,
}

/// Per-request retry counter.
///
/// Created when a request is issued and dropped when it resolves. Never
/// shared between requests and never stored on the request itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryContext {
    retries: u32,
}

impl RetryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retries performed so far.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Decide what to do after a failed attempt.
    ///
    /// `status` is the HTTP status of the failed response, or `None` when the
    /// attempt failed before a response arrived (network error, timeout).
    pub fn on_failure(&mut self, policy: &RetryPolicy, status: Option<u16>) -> RetryDecision {
        let retryable = status.is_some_and(is_retryable_status);
        if !retryable || self.retries >= policy.max_retries {
            return RetryDecision::GiveUp;
        }
        self.retries += 1;
        RetryDecision::Retry {
            after: Duration::from_millis(policy.base_delay_ms.saturating_mul(u64::from(self.retries))),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────
