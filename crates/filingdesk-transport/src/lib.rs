//! filingdesk-transport: async IO boundary for the dashboard.
//! Realtime alert channel over WebSocket with reconnect + heartbeat, and a
//! request client that retries transient server failures.

pub mod channel;
pub mod client;
pub mod error;
pub mod http;
pub mod sink;
pub mod socket;
pub mod token;

pub use channel::RealtimeChannel;
pub use client::RetryingRequestClient;
pub use error::{RequestError, TransportError};
pub use filingdesk_core::{AlertKind, AlertMessage, ConnectionState, TransportConfig};
pub use http::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
pub use sink::NotificationSink;
pub use socket::{Connection, Connector, WsConnection, WsConnector};
pub use token::{EnvToken, NoToken, StaticToken, TokenAccessor};
