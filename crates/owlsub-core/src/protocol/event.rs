//! Typed EventSub events.
//!
//! `Event` is a closed sum type; the handler registry keys callbacks by
//! `EventKind` and every variant is immutable once the decoder produced it.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::DecodeError;

/// Discriminant of [`Event`], used as the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Welcome,
    Keepalive,
    Reconnect,
    Notification,
    Revocation,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Welcome => "welcome",
            EventKind::Keepalive => "keepalive",
            EventKind::Reconnect => "reconnect",
            EventKind::Notification => "notification",
            EventKind::Revocation => "revocation",
        }
    }
}

/// Decoded application-level message.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Welcome(WelcomeEvent),
    Keepalive(KeepaliveEvent),
    Reconnect(ReconnectEvent),
    Notification(NotificationEvent),
    Revocation(RevocationEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Welcome(_) => EventKind::Welcome,
            Event::Keepalive(_) => EventKind::Keepalive,
            Event::Reconnect(_) => EventKind::Reconnect,
            Event::Notification(_) => EventKind::Notification,
            Event::Revocation(_) => EventKind::Revocation,
        }
    }
}

/// Session block shared by welcome and reconnect payloads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub connected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub keepalive_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub reconnect_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WelcomeEvent {
    pub session: SessionInfo,
}

impl WelcomeEvent {
    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    /// Silence budget announced by the server, if any.
    pub fn keepalive_timeout(&self) -> Option<Duration> {
        self.session.keepalive_timeout_seconds.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KeepaliveEvent {}

/// Server-issued instruction to move to a new endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReconnectEvent {
    pub session: SessionInfo,
}

impl ReconnectEvent {
    /// The decoder rejects reconnect frames without a URL, so this is never empty
    /// for events it produced.
    pub fn reconnect_url(&self) -> &str {
        self.session.reconnect_url.as_deref().unwrap_or_default()
    }

    pub fn session_id(&self) -> &str {
        &self.session.id
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubscriptionTransport {
    pub method: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Subscription metadata attached to notifications and revocations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Subscription {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    #[serde(default)]
    pub cost: u64,
    #[serde(default)]
    pub condition: BTreeMap<String, Value>,
    pub transport: SubscriptionTransport,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn subscription_type(&self) -> SubscriptionType {
        SubscriptionType::from(self.kind.as_str())
    }

    /// String-valued condition entry (e.g. `broadcaster_user_id`).
    pub fn condition_str(&self, key: &str) -> Option<&str> {
        self.condition.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NotificationEvent {
    /// Envelope message id, filled in by the decoder.
    #[serde(skip)]
    pub message_id: String,
    pub subscription: Subscription,
    /// Event body; shape depends on the subscription type.
    #[serde(default)]
    pub event: Value,
}

impl NotificationEvent {
    /// Decode the event body into a concrete type.
    pub fn event_as<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        serde_json::from_value(self.event.clone()).map_err(|e| DecodeError::PayloadMismatch {
            message_type: self.subscription.kind.clone(),
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RevocationEvent {
    #[serde(skip)]
    pub message_id: String,
    pub subscription: Subscription,
}

/// Subscription types this client knows by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionType {
    StreamOnline,
    StreamOffline,
    Other(String),
}

impl SubscriptionType {
    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionType::StreamOnline => "stream.online",
            SubscriptionType::StreamOffline => "stream.offline",
            SubscriptionType::Other(s) => s,
        }
    }
}

impl From<&str> for SubscriptionType {
    fn from(s: &str) -> Self {
        match s {
            "stream.online" => SubscriptionType::StreamOnline,
            "stream.offline" => SubscriptionType::StreamOffline,
            other => SubscriptionType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a `stream.online` notification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamOnlineEvent {
    pub id: String,
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
    #[serde(rename = "type")]
    pub stream_type: String,
    pub started_at: DateTime<Utc>,
}

/// Body of a `stream.offline` notification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamOfflineEvent {
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
}
