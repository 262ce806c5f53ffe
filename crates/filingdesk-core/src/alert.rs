//! Canonical alert record delivered to the notification sink.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─── Alert Kind ──────────────────────────────────────────────────

/// Severity / display kind of an alert.
///
/// Unknown or missing kinds on the wire normalize to [`AlertKind::Info`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl AlertKind {
    /// Parse a wire `kind` string. Case-insensitive; `"warn"` is accepted as
    /// an alias for `warning`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "info" => Some(Self::Info),
            "success" => Some(Self::Success),
            "warning" | "warn" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

// ─── Alert Message ───────────────────────────────────────────────

/// A single decoded alert.
///
/// `message` is always non-empty: entries without it never become an
/// `AlertMessage` (see [`crate::codec::decode_frame`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    /// Correlation id assigned by the server, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Human-readable text. Required.
    pub message: String,
    #[serde(default)]
    pub kind: AlertKind,
    /// Display-duration hint in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Opaque server metadata, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl AlertMessage {
    /// Minimal alert with only the required text.
    pub fn new(message: impl Into<String>, kind: AlertKind) -> Self {
        Self {
            id: None,
            title: None,
            message: message.into(),
            kind,
            duration_ms: None,
            meta: None,
        }
    }

    /// Normalize one wire entry into an alert.
    ///
    /// Returns `None` when the entry is not an object or its `message` field
    /// is missing, not a string, or empty.
    pub fn from_wire(entry: &Value) -> Option<Self> {
        let obj = entry.as_object()?;

        let message = obj.get("message")?.as_str()?;
        if message.is_empty() {
            return None;
        }

        let id = match obj.get("id") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let title = obj
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_owned);
        let kind = obj
            .get("kind")
            .and_then(Value::as_str)
            .and_then(AlertKind::parse)
            .unwrap_or_default();
        let duration_ms = obj.get("duration").and_then(Value::as_u64);
        let meta = obj.get("meta").and_then(Value::as_object).cloned();

        Some(Self {
            id,
            title,
            message: message.to_owned(),
            kind,
            duration_ms,
            meta,
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────
