//! filingdesk-core: pure transport-layer logic for the disclosure dashboard.
//! Alert model, inbound frame codec, reconnect backoff, request retry policy,
//! credential sanity checks, and the channel connection state machine.
//! No IO and no async; everything here is deterministic.

pub mod alert;
pub mod backoff;
pub mod codec;
pub mod config;
pub mod connection;
pub mod credential;
pub mod retry;

pub use alert::{AlertKind, AlertMessage};
pub use backoff::{BackoffState, ReconnectPolicy};
pub use codec::{CodecError, Decoded, decode_frame, encode_ping};
pub use config::{ConfigError, TransportConfig};
pub use connection::{ChannelStateMachine, CloseDecision, ConnectionState, StartDecision};
pub use credential::{bearer_credential, is_well_formed_token};
pub use retry::{RetryContext, RetryDecision, RetryPolicy};
