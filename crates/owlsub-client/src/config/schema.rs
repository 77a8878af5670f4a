use std::collections::BTreeMap;
use std::time::Duration;

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use owlsub_core::error::{OwlSubError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    pub twitch: TwitchSection,

    #[serde(default)]
    pub eventsub: EventSubSection,

    #[serde(default)]
    pub helix: HelixSection,

    #[serde(default)]
    pub subscriptions: Vec<SubscriptionSpec>,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(OwlSubError::UnsupportedVersion);
        }

        self.twitch.validate()?;
        self.eventsub.validate()?;
        self.helix.validate()?;

        for sub in &self.subscriptions {
            if sub.kind.is_empty() {
                return Err(OwlSubError::BadRequest("subscriptions[].type must not be empty".into()));
            }
        }

        Ok(())
    }
}

/// App credentials for the client-credentials flow. Loaded once, read-only.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TwitchSection {
    pub client_id: String,
    pub client_secret: Secret<String>,
}

impl TwitchSection {
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(OwlSubError::BadRequest("twitch.client_id must not be empty".into()));
        }
        if self.client_secret.expose_secret().is_empty() {
            return Err(OwlSubError::BadRequest("twitch.client_secret must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventSubSection {
    #[serde(default = "default_eventsub_url")]
    pub url: String,

    #[serde(default = "default_backoff_floor_ms")]
    pub backoff_floor_ms: u64,

    #[serde(default = "default_backoff_ceiling_ms")]
    pub backoff_ceiling_ms: u64,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_keepalive_grace_ms")]
    pub keepalive_grace_ms: u64,

    #[serde(default = "default_max_message_age_secs")]
    pub max_message_age_secs: u64,

    #[serde(default = "default_dedup_window")]
    pub dedup_window: usize,
}

impl Default for EventSubSection {
    fn default() -> Self {
        Self {
            url: default_eventsub_url(),
            backoff_floor_ms: default_backoff_floor_ms(),
            backoff_ceiling_ms: default_backoff_ceiling_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            keepalive_grace_ms: default_keepalive_grace_ms(),
            max_message_age_secs: default_max_message_age_secs(),
            dedup_window: default_dedup_window(),
        }
    }
}

impl EventSubSection {
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.url)
            .map_err(|e| OwlSubError::BadRequest(format!("eventsub.url invalid: {e}")))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(OwlSubError::BadRequest("eventsub.url must be ws:// or wss://".into()));
        }
        if self.backoff_floor_ms == 0 {
            return Err(OwlSubError::BadRequest("eventsub.backoff_floor_ms must be > 0".into()));
        }
        if self.backoff_ceiling_ms < self.backoff_floor_ms {
            return Err(OwlSubError::BadRequest(
                "eventsub.backoff_ceiling_ms must be >= backoff_floor_ms".into(),
            ));
        }
        if !(100..=120000).contains(&self.connect_timeout_ms) {
            return Err(OwlSubError::BadRequest(
                "eventsub.connect_timeout_ms must be between 100 and 120000".into(),
            ));
        }
        if !(1..=3600).contains(&self.max_message_age_secs) {
            return Err(OwlSubError::BadRequest(
                "eventsub.max_message_age_secs must be between 1 and 3600".into(),
            ));
        }
        if !(1..=1000).contains(&self.dedup_window) {
            return Err(OwlSubError::BadRequest(
                "eventsub.dedup_window must be between 1 and 1000".into(),
            ));
        }
        Ok(())
    }

    pub fn backoff_floor(&self) -> Duration {
        Duration::from_millis(self.backoff_floor_ms)
    }
    pub fn backoff_ceiling(&self) -> Duration {
        Duration::from_millis(self.backoff_ceiling_ms)
    }
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
    pub fn keepalive_grace(&self) -> Duration {
        Duration::from_millis(self.keepalive_grace_ms)
    }
    pub fn max_message_age(&self) -> Duration {
        Duration::from_secs(self.max_message_age_secs)
    }
}

fn default_eventsub_url() -> String {
    "wss://eventsub.wss.twitch.tv/ws".into()
}
fn default_backoff_floor_ms() -> u64 {
    2000
}
fn default_backoff_ceiling_ms() -> u64 {
    300_000
}
fn default_connect_timeout_ms() -> u64 {
    10000
}
fn default_keepalive_grace_ms() -> u64 {
    5000
}
fn default_max_message_age_secs() -> u64 {
    600
}
fn default_dedup_window() -> usize {
    50
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HelixSection {
    #[serde(default = "default_token_url")]
    pub token_url: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for HelixSection {
    fn default() -> Self {
        Self {
            token_url: default_token_url(),
            api_base: default_api_base(),
        }
    }
}

impl HelixSection {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("helix.token_url", &self.token_url), ("helix.api_base", &self.api_base)] {
            let url = url::Url::parse(value)
                .map_err(|e| OwlSubError::BadRequest(format!("{name} invalid: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(OwlSubError::BadRequest(format!("{name} must be http:// or https://")));
            }
        }
        Ok(())
    }
}

fn default_token_url() -> String {
    "https://id.twitch.tv/oauth2/token".into()
}
fn default_api_base() -> String {
    "https://api.twitch.tv/helix".into()
}

/// Interest registered by the binary once a session is welcomed.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionSpec {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default = "default_subscription_version")]
    pub version: String,

    #[serde(default)]
    pub condition: BTreeMap<String, String>,
}

fn default_subscription_version() -> String {
    "1".into()
}
