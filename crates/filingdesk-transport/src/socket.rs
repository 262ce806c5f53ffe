//! Socket seam for the realtime channel.
//!
//! [`Connector`] opens connections and [`Connection`] moves text payloads.
//! The production implementation is WebSocket via tokio-tungstenite; tests
//! substitute scripted connectors.

use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::TransportError;

/// One live bidirectional connection.
pub trait Connection: Send + 'static {
    /// Next inbound text payload.
    ///
    /// `None` once the peer has closed the connection. Protocol-level
    /// ping/pong frames are handled internally and never returned.
    fn recv(&mut self) -> impl Future<Output = Option<Result<String, TransportError>>> + Send;

    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Best-effort close. Errors are swallowed.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Opens connections to a URL.
pub trait Connector: Send + Sync + 'static {
    type Conn: Connection;

    fn connect(&self, url: &str) -> impl Future<Output = Result<Self::Conn, TransportError>> + Send;
}

// ---------------------------------------------------------------------------
// WebSocket implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Connector for WsConnector {
    type Conn = WsConnection;

    async fn connect(&self, url: &str) -> Result<WsConnection, TransportError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(WsConnection { stream })
    }
}

impl Connection for WsConnection {
    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(data)) => match String::from_utf8(data) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => {
                        tracing::debug!("ws: dropping non-UTF-8 binary frame");
                    }
                },
                // tungstenite queues the pong reply itself.
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Ok(Message::Close(frame)) => {
                    if let Some(f) = frame {
                        tracing::debug!(code = %f.code, reason = %f.reason, "ws: close frame received");
                    }
                    return None;
                }
                Err(e) => return Some(Err(TransportError::Socket(e.to_string()))),
            }
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::Socket(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!("ws: close failed: {e}");
        }
    }
}
