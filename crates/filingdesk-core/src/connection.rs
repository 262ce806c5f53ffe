//! Connection lifecycle state machine for the realtime alert channel.
//!
//! Pure and deterministic: the async driver feeds it events (start, open,
//! close, reconnect timer fired, stop) and acts on the decisions it returns.
//! Exactly one [`ConnectionState`] is active at a time.
//!
//! ```text
//!   Disconnected ──start──▶ Connecting ──open──▶ Open
//!        ▲                    │   ▲                │
//!        │ close (no retry)   │   │ timer          │ close/error
//!        ├────────────────────┘   │                ▼
//!        └──────────────────── Reconnecting ◀──────┘
//!                 stop (from any state)
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::{BackoffState, ReconnectPolicy};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Reconnecting,
}

impl ConnectionState {
    /// True in every state that owns (or is about to own) a connection.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

/// Result of [`ChannelStateMachine::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDecision {
    /// Caller must initiate a connection attempt.
    Connect,
    /// A connection is already being attempted or is live; nothing to do.
    AlreadyActive,
}

/// Result of [`ChannelStateMachine::on_closed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// Schedule a reconnect after the given delay.
    Reconnect { after: Duration },
    /// Channel is now Disconnected; no further attempts.
    Stop,
    /// Close arrived while already waiting to reconnect; the pending timer
    /// stays authoritative.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct ChannelStateMachine {
    policy: ReconnectPolicy,
    state: ConnectionState,
    backoff: BackoffState,
}

impl ChannelStateMachine {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Disconnected,
            backoff: BackoffState::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn backoff(&self) -> BackoffState {
        self.backoff
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Request a connection. Only a Disconnected channel starts connecting;
    /// any other state means an attempt is already in flight or live.
    pub fn start(&mut self) -> StartDecision {
        if self.state.is_active() {
            return StartDecision::AlreadyActive;
        }
        self.state = ConnectionState::Connecting;
        StartDecision::Connect
    }

    /// The pending connection attempt succeeded.
    ///
    /// Returns `false` if the channel is no longer Connecting (it was stopped
    /// while the attempt was in flight); the caller must discard the new
    /// connection.
    pub fn on_open(&mut self) -> bool {
        if self.state != ConnectionState::Connecting {
            return false;
        }
        self.backoff.reset();
        self.state = ConnectionState::Open;
        true
    }

    /// The connection attempt failed, or a live connection closed/errored.
    ///
    /// `enabled` is the caller's current reconnect-eligibility flag.
    pub fn on_closed(&mut self, enabled: bool) -> CloseDecision {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Open => {}
            ConnectionState::Reconnecting => return CloseDecision::Ignored,
            ConnectionState::Disconnected => return CloseDecision::Stop,
        }

        if enabled && self.policy.auto_reconnect {
            let after = self.backoff.next_delay(&self.policy);
            self.state = ConnectionState::Reconnecting;
            CloseDecision::Reconnect { after }
        } else {
            self.state = ConnectionState::Disconnected;
            self.backoff.reset();
            CloseDecision::Stop
        }
    }

    /// The reconnect timer fired. Returns `true` if the caller should attempt
    /// a new connection now.
    pub fn on_reconnect_due(&mut self) -> bool {
        if self.state != ConnectionState::Reconnecting {
            return false;
        }
        self.state = ConnectionState::Connecting;
        true
    }

    /// Stop the channel from any state. Idempotent.
    ///
    /// Returns the state the channel was in before stopping.
    pub fn stop(&mut self) -> ConnectionState {
        let previous = self.state;
        self.state = ConnectionState::Disconnected;
        self.backoff.reset();
        previous
    }
}

impl Default for ChannelStateMachine {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}

// ─── Tests ───────────────────────────────────────────────────────
