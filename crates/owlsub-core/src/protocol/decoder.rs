//! Envelope decoder (panic-free).
//!
//! Order of checks for every frame:
//! 1. outer envelope JSON
//! 2. freshness (`timestamp < now - max_age` is rejected)
//! 3. de-duplication against the recent-message window
//! 4. message type selection
//! 5. payload decode into the selected variant
//!
//! The only side effect is the window insert in step 3. No I/O.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::error::DecodeError;
use crate::protocol::envelope::{message_type, Envelope};
use crate::protocol::event::{
    Event, KeepaliveEvent, NotificationEvent, ReconnectEvent, RevocationEvent, WelcomeEvent,
};
use crate::protocol::window::{RecentMessageWindow, DEFAULT_WINDOW_CAPACITY};

/// Frames older than this are dropped.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(10 * 60);

/// Stateful decoder. Owned by a single read loop; not shared.
#[derive(Debug, Clone)]
pub struct EnvelopeDecoder {
    window: RecentMessageWindow,
    max_age_ms: i64,
}

impl Default for EnvelopeDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY, DEFAULT_MAX_AGE)
    }
}

impl EnvelopeDecoder {
    pub fn new(window_capacity: usize, max_age: Duration) -> Self {
        Self {
            window: RecentMessageWindow::with_capacity(window_capacity),
            max_age_ms: i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX),
        }
    }

    pub fn window(&self) -> &RecentMessageWindow {
        &self.window
    }

    /// Decode a raw frame against the wall clock.
    pub fn parse(&mut self, raw: &[u8]) -> Result<Event, DecodeError> {
        self.parse_at(raw, Utc::now())
    }

    /// Decode a raw frame as if the current time were `now`.
    pub fn parse_at(&mut self, raw: &[u8], now: DateTime<Utc>) -> Result<Event, DecodeError> {
        let env: Envelope = serde_json::from_slice(raw)
            .map_err(|e| DecodeError::MalformedEnvelope(e.to_string()))?;
        let meta = &env.metadata;

        let age_ms = now
            .signed_duration_since(meta.message_timestamp)
            .num_milliseconds();
        if age_ms > self.max_age_ms {
            return Err(DecodeError::EventTooOld {
                age_secs: age_ms / 1000,
                max_age_secs: self.max_age_ms / 1000,
            });
        }

        if !self.window.check_and_insert(&meta.message_id) {
            return Err(DecodeError::DuplicateEvent(meta.message_id.clone()));
        }

        match meta.message_type.as_str() {
            message_type::SESSION_WELCOME => {
                let ev: WelcomeEvent = decode_payload(&env)?;
                Ok(Event::Welcome(ev))
            }
            message_type::SESSION_KEEPALIVE => Ok(Event::Keepalive(KeepaliveEvent::default())),
            message_type::SESSION_RECONNECT => {
                let ev: ReconnectEvent = decode_payload(&env)?;
                if ev.reconnect_url().is_empty() {
                    return Err(mismatch(&env, "reconnect_url missing"));
                }
                Ok(Event::Reconnect(ev))
            }
            message_type::NOTIFICATION => {
                let mut ev: NotificationEvent = decode_payload(&env)?;
                ev.message_id = meta.message_id.clone();
                Ok(Event::Notification(ev))
            }
            message_type::REVOCATION => {
                let mut ev: RevocationEvent = decode_payload(&env)?;
                ev.message_id = meta.message_id.clone();
                Ok(Event::Revocation(ev))
            }
            other => Err(DecodeError::UnknownMessageType(other.to_string())),
        }
    }
}

fn decode_payload<T: DeserializeOwned>(env: &Envelope) -> Result<T, DecodeError> {
    let raw = env
        .payload
        .as_ref()
        .ok_or_else(|| mismatch(env, "payload missing"))?;
    serde_json::from_str(raw.get()).map_err(|e| mismatch(env, &e.to_string()))
}

fn mismatch(env: &Envelope, reason: &str) -> DecodeError {
    DecodeError::PayloadMismatch {
        message_type: env.metadata.message_type.clone(),
        reason: reason.to_string(),
    }
}
