//! Reconnect backoff for the realtime channel.
//!
//! delay = min(max_delay_ms, base_delay_ms * 2^attempt). No attempt ceiling:
//! the channel keeps reconnecting until it succeeds or is stopped.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─── Reconnect Policy ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect, in milliseconds (default 1000).
    pub base_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds (default 30000).
    pub max_delay_ms: u64,
    /// When false, every close is terminal (default true).
    pub auto_reconnect: bool,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            auto_reconnect: true,
        }
    }
}

impl ReconnectPolicy {
    /// Delay for a zero-based reconnect attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        // 2^31 * any non-zero base already saturates the cap; clamp the
        // shift so the multiplication cannot overflow.
        let multiplier = 1_u64 << attempt.min(31);
        let raw = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(raw.min(self.max_delay_ms))
    }
}

// ─── Backoff State ───────────────────────────────────────────────

/// Consecutive-failure counter for one channel instance.
///
/// Incremented on every scheduled reconnect, reset on every successful open
/// and on stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackoffState {
    attempt: u32,
}

impl BackoffState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reconnects scheduled since the last successful open.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Compute the delay for the next reconnect and advance the counter.
    pub fn next_delay(&mut self, policy: &ReconnectPolicy) -> Duration {
        let delay = policy.delay_for_attempt(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

// ─── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(d: Duration) -> u64 {
        d.as_millis() as u64
    }

    #[test]
    fn default_policy_values() {
        let p = ReconnectPolicy::default();
        assert_eq!(p.base_delay_ms, 1_000);
        assert_eq!(p.max_delay_ms, 30_000);
        assert!(p.auto_reconnect);
    }

    #[test]
    fn delay_sequence_doubles_then_caps() {
        let policy = ReconnectPolicy::default();
        let mut state = BackoffState::new();
        let seq: Vec<u64> = (0..8).map(|_| ms(state.next_delay(&policy))).collect();
        assert_eq!(
            seq,
            vec![1_000, 2_000, 4_000, 8_000, 16_000, 30_000, 30_000, 30_000]
        );
        assert_eq!(state.attempt(), 8);
    }

    #[test]
    fn reset_restarts_at_base() {
        let policy = ReconnectPolicy::default();
        let mut state = BackoffState::new();
        for _ in 0..4 {
            state.next_delay(&policy);
        }
        state.reset();
        assert_eq!(ms(state.next_delay(&policy)), 1_000);
    }

    #[test]
    fn huge_attempt_does_not_overflow() {
        let policy = ReconnectPolicy::default();
        assert_eq!(ms(policy.delay_for_attempt(u32::MAX)), 30_000);
        assert_eq!(ms(policy.delay_for_attempt(64)), 30_000);
    }
}
