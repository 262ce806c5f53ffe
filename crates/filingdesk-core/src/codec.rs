//! Inbound frame codec and outbound heartbeat frame.
//!
//! Inbound frames are JSON: either a single alert object, an array of alert
//! objects, or a keepalive acknowledgement `{"type": "pong"}`.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::alert::AlertMessage;

/// Reserved `type` discriminator of keepalive acknowledgement frames.
pub const PONG_TYPE: &str = "pong";
/// `type` discriminator of outbound heartbeat frames.
pub const PING_TYPE: &str = "ping";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame is neither an object nor an array (got {0})")]
    NotAnObject(&'static str),
}

/// Outcome of decoding one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Keepalive acknowledgement. Expected traffic, carries no alerts.
    Keepalive,
    /// Zero or more alerts, in frame order.
    Alerts {
        alerts: Vec<AlertMessage>,
        /// Entries dropped for lacking a usable `message`.
        dropped: usize,
    },
}

impl Decoded {
    /// Alerts carried by this frame (empty for keepalives).
    pub fn into_alerts(self) -> Vec<AlertMessage> {
        match self {
            Self::Keepalive => Vec::new(),
            Self::Alerts { alerts, .. } => alerts,
        }
    }
}

/// Decode a raw inbound payload.
///
/// Invalid entries inside a batch are dropped individually; their valid
/// siblings are still returned. Only an unparseable frame (or a bare
/// scalar) is an error, and callers are expected to log and discard it.
pub fn decode_frame(raw: &str) -> Result<Decoded, CodecError> {
    let value: Value = serde_json::from_str(raw)?;

    let entries = match value {
        Value::Object(ref obj) => {
            if obj.get("type").and_then(Value::as_str) == Some(PONG_TYPE) {
                return Ok(Decoded::Keepalive);
            }
            vec![value]
        }
        Value::Array(items) => items,
        Value::Null => return Err(CodecError::NotAnObject("null")),
        Value::Bool(_) => return Err(CodecError::NotAnObject("bool")),
        Value::Number(_) => return Err(CodecError::NotAnObject("number")),
        Value::String(_) => return Err(CodecError::NotAnObject("string")),
    };

    let total = entries.len();
    let alerts: Vec<AlertMessage> = entries.iter().filter_map(AlertMessage::from_wire).collect();
    let dropped = total - alerts.len();
    if dropped > 0 {
        tracing::debug!(dropped, total, "codec: dropped alert entries without message");
    }

    Ok(Decoded::Alerts { alerts, dropped })
}

#[derive(Serialize)]
struct PingFrame {
    #[serde(rename = "type")]
    kind: &'static str,
    t: i64,
}

/// Encode a heartbeat frame carrying the client's epoch-millisecond clock.
pub fn encode_ping(now_ms: i64) -> String {
    // A struct of a static str and an i64 cannot fail to serialize.
    serde_json::to_string(&PingFrame {
        kind: PING_TYPE,
        t: now_ms,
    })
    .unwrap_or_else(|_| format!(r#"{{"type":"{PING_TYPE}","t":{now_ms}}}"#))
}

// ─── Tests ───────────────────────────────────────────────────────
