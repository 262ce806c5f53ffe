//! Realtime alert channel: one persistent inbound connection per instance.
//!
//! Lifecycle is driven by [`ChannelStateMachine`]; this module is the async
//! driver around it. A single tokio task per started channel owns the live
//! connection, the heartbeat timer and the reconnect timer, so every state
//! transition for one channel is serialized through that task (plus the
//! handle's `start`/`stop`, which go through the same mutex-guarded machine).
//!
//! Cancellation: `stop()` and `Drop` cancel the task, which tears down any
//! pending reconnect sleep, the heartbeat interval, and the live connection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use filingdesk_core::codec::{decode_frame, encode_ping};
use filingdesk_core::connection::{ChannelStateMachine, CloseDecision, ConnectionState, StartDecision};
use filingdesk_core::{ReconnectPolicy, TransportConfig};

use crate::sink::NotificationSink;
use crate::socket::{Connection, Connector};

/// Consecutive connect failures after which errors drop to debug level.
const DEBUG_LOG_THRESHOLD: u32 = 10;

/// Floor for the heartbeat period and reconnect delays. `interval` panics on
/// a zero period, and a zero delay would spin against a dead server.
const MIN_TIMER_MS: u64 = 1;

struct Shared<C> {
    connector: C,
    sink: Box<dyn NotificationSink>,
    machine: Mutex<ChannelStateMachine>,
    state_tx: watch::Sender<ConnectionState>,
    enabled: AtomicBool,
    heartbeat_interval: Duration,
}

impl<C> Shared<C> {
    /// Apply one transition and publish the resulting state atomically.
    fn transition<R>(&self, f: impl FnOnce(&mut ChannelStateMachine) -> R) -> R {
        let mut machine = self.machine.lock().unwrap_or_else(PoisonError::into_inner);
        let out = f(&mut machine);
        self.state_tx.send_replace(machine.state());
        out
    }
}

struct ChannelTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Why the pump loop over an open connection ended.
enum PumpExit {
    Cancelled,
    Lost(String),
}

/// Persistent alert channel with automatic reconnect.
///
/// ```ignore
/// let mut channel = RealtimeChannel::new(WsConnector, sink, &TransportConfig::default());
/// channel.start("wss://api.example.com/ws/alerts", true);
/// // ... on unmount:
/// channel.stop().await;
/// ```
pub struct RealtimeChannel<C: Connector> {
    shared: Arc<Shared<C>>,
    task: Option<ChannelTask>,
}

impl<C: Connector> RealtimeChannel<C> {
    pub fn new(connector: C, sink: impl NotificationSink, config: &TransportConfig) -> Self {
        Self::with_policy(connector, sink, config.reconnect.clone(), config.heartbeat_interval())
    }

    /// Zero timer values are raised to 1 ms.
    pub fn with_policy(
        connector: C,
        sink: impl NotificationSink,
        mut policy: ReconnectPolicy,
        heartbeat_interval: Duration,
    ) -> Self {
        if policy.base_delay_ms < MIN_TIMER_MS || policy.max_delay_ms < MIN_TIMER_MS {
            tracing::warn!(
                base_delay_ms = policy.base_delay_ms,
                max_delay_ms = policy.max_delay_ms,
                "channel: zero reconnect delay raised to {MIN_TIMER_MS} ms"
            );
            policy.base_delay_ms = policy.base_delay_ms.max(MIN_TIMER_MS);
            policy.max_delay_ms = policy.max_delay_ms.max(MIN_TIMER_MS);
        }
        let min_period = Duration::from_millis(MIN_TIMER_MS);
        if heartbeat_interval < min_period {
            tracing::warn!("channel: zero heartbeat interval raised to {MIN_TIMER_MS} ms");
        }
        let heartbeat_interval = heartbeat_interval.max(min_period);

        let (state_tx, _rx) = watch::channel(ConnectionState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                connector,
                sink: Box::new(sink),
                machine: Mutex::new(ChannelStateMachine::new(policy)),
                state_tx,
                enabled: AtomicBool::new(false),
                heartbeat_interval,
            }),
            task: None,
        }
    }

    /// Open the channel to `url`.
    ///
    /// No-op (returns [`StartDecision::AlreadyActive`]) while a connection is
    /// being attempted, is open, or is waiting to reconnect. `enabled` is the
    /// reconnect-eligibility flag; see [`Self::set_enabled`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, url: impl Into<String>, enabled: bool) -> StartDecision {
        let decision = self.shared.transition(|sm| sm.start());
        if decision == StartDecision::AlreadyActive {
            tracing::debug!("channel: start ignored, connection already active");
            return decision;
        }

        self.shared.enabled.store(enabled, Ordering::SeqCst);
        // A previous task that already ran to completion leaves its handle
        // behind; it has nothing left to cancel.
        if let Some(old) = self.task.take() {
            old.cancel.cancel();
        }

        let url = url.into();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_channel(Arc::clone(&self.shared), url, cancel.clone()));
        self.task = Some(ChannelTask { cancel, handle });
        decision
    }

    /// Update the reconnect-eligibility flag. Disabling keeps the current
    /// connection but makes the next close terminal.
    pub fn set_enabled(&self, enabled: bool) {
        self.shared.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Cancel any pending reconnect, close the live connection, reset
    /// backoff. Idempotent.
    pub async fn stop(&mut self) {
        let previous = self.shared.transition(|sm| sm.stop());
        if let Some(task) = self.task.take() {
            task.cancel.cancel();
            if let Err(e) = task.handle.await {
                tracing::debug!("channel: task ended abnormally: {e}");
            }
        }
        if previous.is_active() {
            tracing::info!(previous = ?previous, "channel: stopped");
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state_tx.borrow()
    }

    /// Watch state transitions (e.g. for a "live" indicator).
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }
}

impl<C: Connector> Drop for RealtimeChannel<C> {
    fn drop(&mut self) {
        self.shared.transition(|sm| sm.stop());
        if let Some(task) = self.task.take() {
            task.cancel.cancel();
        }
    }
}

// ---------------------------------------------------------------------------
// Channel task
// ---------------------------------------------------------------------------

async fn run_channel<C: Connector>(shared: Arc<Shared<C>>, url: String, cancel: CancellationToken) {
    let mut consecutive_failures: u32 = 0;

    loop {
        // Connecting.
        let attempt = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = shared.connector.connect(&url) => result,
        };

        match attempt {
            Ok(mut conn) => {
                if !shared.transition(|sm| sm.on_open()) {
                    // Stopped while the attempt was in flight.
                    conn.close().await;
                    return;
                }
                consecutive_failures = 0;
                tracing::info!(url = %url, "channel: connected");

                match pump(&shared, &mut conn, &cancel).await {
                    PumpExit::Cancelled => {
                        conn.close().await;
                        return;
                    }
                    PumpExit::Lost(reason) => {
                        tracing::warn!(url = %url, "channel: connection lost: {reason}");
                    }
                }
                // The dead handle is dropped here, before any reconnect.
            }
            Err(e) => {
                consecutive_failures = consecutive_failures.saturating_add(1);
                if consecutive_failures >= DEBUG_LOG_THRESHOLD {
                    tracing::debug!(consecutive_failures, "channel: connection error: {e}");
                } else {
                    tracing::warn!(url = %url, "channel: connection error: {e}");
                }
            }
        }

        let enabled = shared.enabled.load(Ordering::SeqCst);
        match shared.transition(|sm| sm.on_closed(enabled)) {
            CloseDecision::Reconnect { after } => {
                tracing::info!(
                    url = %url,
                    delay_ms = after.as_millis() as u64,
                    consecutive_failures,
                    "channel: reconnect scheduled"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!("channel: cancelled during reconnect backoff");
                        return;
                    }
                    _ = tokio::time::sleep(after) => {}
                }
                if !shared.transition(|sm| sm.on_reconnect_due()) {
                    return;
                }
            }
            CloseDecision::Stop => {
                tracing::info!(url = %url, "channel: disconnected, not reconnecting");
                return;
            }
            // Only reachable from Reconnecting, and this task never calls
            // on_closed while it is sleeping out a reconnect.
            CloseDecision::Ignored => return,
        }
    }
}

/// Read frames and send heartbeats until the connection drops or the
/// channel is cancelled.
async fn pump<C: Connector>(
    shared: &Shared<C>,
    conn: &mut C::Conn,
    cancel: &CancellationToken,
) -> PumpExit {
    let period = shared.heartbeat_interval;
    let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return PumpExit::Cancelled,
            _ = heartbeat.tick() => {
                // Liveness is judged by close/error on the socket, not by
                // whether the ping went out.
                let frame = encode_ping(Utc::now().timestamp_millis());
                if let Err(e) = conn.send_text(frame).await {
                    tracing::debug!("channel: heartbeat send failed: {e}");
                }
            }
            inbound = conn.recv() => match inbound {
                Some(Ok(text)) => deliver(shared.sink.as_ref(), &text),
                Some(Err(e)) => return PumpExit::Lost(e.to_string()),
                None => return PumpExit::Lost("closed by peer".to_string()),
            },
        }
    }
}

fn deliver(sink: &dyn NotificationSink, raw: &str) {
    match decode_frame(raw) {
        Ok(decoded) => {
            for alert in decoded.into_alerts() {
                sink.notify(alert);
            }
        }
        Err(e) => {
            tracing::warn!(len = raw.len(), "channel: discarding malformed frame: {e}");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────
