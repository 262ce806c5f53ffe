//! `filingdesk watch` — mount the realtime channel and stream alerts.

use filingdesk_core::TransportConfig;
use filingdesk_transport::{AlertMessage, ConnectionState, RealtimeChannel, WsConnector};
use tokio::sync::mpsc;

pub async fn cmd_watch(url: &str, config: &TransportConfig, no_reconnect: bool) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<AlertMessage>();
    let sink = move |alert: AlertMessage| {
        let _ = tx.send(alert);
    };

    let mut channel = RealtimeChannel::new(WsConnector, sink, config);
    let mut state = channel.subscribe_state();
    channel.start(url, !no_reconnect);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            Some(alert) = rx.recv() => {
                println!("{}", format_alert_line(&alert)?);
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let now = *state.borrow_and_update();
                tracing::debug!(state = ?now, "watch: channel state changed");
                if now == ConnectionState::Disconnected {
                    tracing::info!("watch: channel closed");
                    break;
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("watch: interrupt received, stopping");
                break;
            }
        }
    }

    channel.stop().await;
    // Flush anything decoded before the stop.
    while let Ok(alert) = rx.try_recv() {
        println!("{}", format_alert_line(&alert)?);
    }
    Ok(())
}

/// One alert per line, for piping into `jq` and friends.
pub(crate) fn format_alert_line(alert: &AlertMessage) -> anyhow::Result<String> {
    Ok(serde_json::to_string(alert)?)
}
