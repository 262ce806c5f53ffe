//! End-to-end: RealtimeChannel over a real WebSocket server on loopback.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use filingdesk_core::{ReconnectPolicy, TransportConfig};
use filingdesk_transport::{AlertMessage, ConnectionState, RealtimeChannel, WsConnector};

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

fn fast_config() -> TransportConfig {
    TransportConfig {
        reconnect: ReconnectPolicy {
            base_delay_ms: 50,
            max_delay_ms: 200,
            auto_reconnect: true,
        },
        heartbeat_interval_ms: 100,
        ..TransportConfig::default()
    }
}

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, format!("ws://{addr}/ws/alerts"))
}

fn sink() -> (
    impl Fn(AlertMessage) + Send + Sync + 'static,
    mpsc::UnboundedReceiver<AlertMessage>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move |alert: AlertMessage| {
            let _ = tx.send(alert);
        },
        rx,
    )
}

async fn wait_state(ch: &RealtimeChannel<WsConnector>, want: ConnectionState) {
    let mut rx = ch.subscribe_state();
    tokio::time::timeout(TEST_TIMEOUT, rx.wait_for(|s| *s == want))
        .await
        .expect("timed out waiting for state")
        .unwrap();
}

#[tokio::test]
async fn delivers_alerts_from_server_frames() {
    let (listener, url) = bind().await;
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text(r#"{"type":"pong"}"#.into())).await.unwrap();
        ws.send(Message::Text(
            r#"{"id":"t-1","title":"Form 4","message":"Director bought 5,000 ACME","kind":"success"}"#.into(),
        ))
        .await
        .unwrap();
        ws.send(Message::Text("not json at all".into())).await.unwrap();
        ws.send(Message::Binary(
            br#"[{"message":"Rep. sold MSFT","kind":"warning"},{"kind":"error"}]"#.to_vec(),
        ))
        .await
        .unwrap();
        // Hold the connection open until the client goes away.
        while ws.next().await.is_some() {}
    });

    let (sink, mut rx) = sink();
    let mut ch = RealtimeChannel::new(WsConnector, sink, &fast_config());
    ch.start(url, true);

    let first = tokio::time::timeout(TEST_TIMEOUT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(first.id.as_deref(), Some("t-1"));
    assert_eq!(first.title.as_deref(), Some("Form 4"));

    let second = tokio::time::timeout(TEST_TIMEOUT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(second.message, "Rep. sold MSFT");

    assert_eq!(ch.state(), ConnectionState::Open);
    ch.stop().await;
    assert_eq!(ch.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn sends_heartbeat_pings() {
    let (listener, url) = bind().await;
    let (ping_tx, mut ping_rx) = mpsc::unbounded_channel::<serde_json::Value>();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                let v: serde_json::Value = serde_json::from_str(&text).unwrap();
                let _ = ping_tx.send(v);
                let _ = ws.send(Message::Text(r#"{"type":"pong"}"#.into())).await;
            }
        }
    });

    let (sink, mut alerts) = sink();
    let mut ch = RealtimeChannel::new(WsConnector, sink, &fast_config());
    ch.start(url, true);

    let ping = tokio::time::timeout(TEST_TIMEOUT, ping_rx.recv()).await.unwrap().unwrap();
    assert_eq!(ping["type"], "ping");
    assert!(ping["t"].as_i64().unwrap() > 0);

    ch.stop().await;
    assert!(alerts.try_recv().is_err(), "pong replies must not reach the sink");
}

#[tokio::test]
async fn reconnects_after_server_drops_connection() {
    let (listener, url) = bind().await;
    tokio::spawn(async move {
        // First connection: one alert, then close.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text(r#"{"message":"before drop"}"#.into())).await.unwrap();
        ws.close(None).await.unwrap();
        drop(ws);

        // Second connection: one alert, then hold.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text(r#"{"message":"after reconnect"}"#.into())).await.unwrap();
        while ws.next().await.is_some() {}
    });

    let (sink, mut rx) = sink();
    let mut ch = RealtimeChannel::new(WsConnector, sink, &fast_config());
    ch.start(url, true);

    let a = tokio::time::timeout(TEST_TIMEOUT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(a.message, "before drop");
    let b = tokio::time::timeout(TEST_TIMEOUT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(b.message, "after reconnect");
    wait_state(&ch, ConnectionState::Open).await;

    ch.stop().await;
}

#[tokio::test]
async fn unreachable_server_keeps_reconnecting_until_stopped() {
    // Bind then drop to get a port nobody listens on.
    let (listener, url) = bind().await;
    drop(listener);

    let (sink, _rx) = sink();
    let mut ch = RealtimeChannel::new(WsConnector, sink, &fast_config());
    ch.start(url, true);
    wait_state(&ch, ConnectionState::Reconnecting).await;

    ch.stop().await;
    assert_eq!(ch.state(), ConnectionState::Disconnected);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(ch.state(), ConnectionState::Disconnected);
}
