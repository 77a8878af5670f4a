//! EventSub wire envelope (JSON text frame).
//!
//! The payload is kept as `RawValue` so the decoder only parses it once the
//! message type has selected a concrete event shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Message type tags carried in `metadata.message_type`.
pub mod message_type {
    pub const SESSION_WELCOME: &str = "session_welcome";
    pub const SESSION_KEEPALIVE: &str = "session_keepalive";
    pub const SESSION_RECONNECT: &str = "session_reconnect";
    pub const NOTIFICATION: &str = "notification";
    pub const REVOCATION: &str = "revocation";
}

/// Outer frame: metadata plus an opaque payload.
///
/// Unknown fields are tolerated; the upstream feed adds fields over time.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub metadata: Metadata,
    /// Raw payload JSON (lazy parsing).
    #[serde(default)]
    pub payload: Option<Box<RawValue>>,
}

/// Envelope metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub message_id: String,
    pub message_type: String,
    pub message_timestamp: DateTime<Utc>,
    /// Present on `notification` and `revocation` frames.
    #[serde(default)]
    pub subscription_type: Option<String>,
    #[serde(default)]
    pub subscription_version: Option<String>,
}
