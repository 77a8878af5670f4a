//! Shared error types across owlsub crates.

use thiserror::Error;

/// Caller-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport open failed.
    Connect,
    /// Inbound frame was malformed, unknown, stale, or a duplicate.
    Decode,
    /// Client-credentials exchange failed.
    Auth,
    /// Registration endpoint answered with a non-2xx status.
    SubscriptionRejected,
    /// No welcomed EventSub session exists yet.
    NotConnected,
    /// Invalid input / config.
    BadRequest,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Outbound HTTP call failed.
    Http,
    /// Internal error.
    Internal,
}

impl ErrorKind {
    /// String representation used in logs and command replies.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Connect => "CONNECT",
            ErrorKind::Decode => "DECODE",
            ErrorKind::Auth => "AUTH",
            ErrorKind::SubscriptionRejected => "SUBSCRIPTION_REJECTED",
            ErrorKind::NotConnected => "NOT_CONNECTED",
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorKind::Http => "HTTP",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Per-frame decode failure. Never fatal for the read loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
    #[error("event is {age_secs}s old (limit {max_age_secs}s)")]
    EventTooOld { age_secs: i64, max_age_secs: i64 },
    #[error("message {0} was previously received")]
    DuplicateEvent(String),
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),
    #[error("payload does not match {message_type}: {reason}")]
    PayloadMismatch { message_type: String, reason: String },
}

impl DecodeError {
    /// Short label used for log fields and metric labels.
    pub fn reason(&self) -> &'static str {
        match self {
            DecodeError::MalformedEnvelope(_) => "malformed",
            DecodeError::EventTooOld { .. } => "too_old",
            DecodeError::DuplicateEvent(_) => "duplicate",
            DecodeError::UnknownMessageType(_) => "unknown_type",
            DecodeError::PayloadMismatch { .. } => "payload_mismatch",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, OwlSubError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum OwlSubError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("auth failed: {0}")]
    Auth(String),
    #[error("subscription rejected (status {status}): {body}")]
    SubscriptionRejected { status: u16, body: String },
    #[error("not connected: no eventsub session has been welcomed")]
    NotConnected,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("http: {0}")]
    Http(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl OwlSubError {
    /// Map an error to its stable caller-facing code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OwlSubError::Connect(_) => ErrorKind::Connect,
            OwlSubError::Decode(_) => ErrorKind::Decode,
            OwlSubError::Auth(_) => ErrorKind::Auth,
            OwlSubError::SubscriptionRejected { .. } => ErrorKind::SubscriptionRejected,
            OwlSubError::NotConnected => ErrorKind::NotConnected,
            OwlSubError::BadRequest(_) => ErrorKind::BadRequest,
            OwlSubError::UnsupportedVersion => ErrorKind::UnsupportedVersion,
            OwlSubError::Http(_) => ErrorKind::Http,
            OwlSubError::Internal(_) => ErrorKind::Internal,
        }
    }
}
