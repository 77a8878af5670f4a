//! App access token cache (client-credentials flow).
//!
//! The cache lock is held across the token exchange, so concurrent callers
//! that find the token expired wait for one exchange instead of racing N.
//! A failed exchange leaves the previous credential untouched; the next call
//! retries.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use tokio::sync::Mutex;

use owlsub_core::error::{OwlSubError, Result};

use crate::config::TwitchSection;

/// Upper bound on a cached token's lifetime, whatever `expires_in` claims.
const MAX_TOKEN_TTL: Duration = Duration::from_secs(60 * 24 * 60 * 60);

/// Anything that can authenticate a Helix call.
#[async_trait]
pub trait TokenSource: Send + Sync {
    fn client_id(&self) -> &str;
    async fn bearer_token(&self) -> Result<String>;
}

#[derive(Debug, Default)]
struct Credential {
    token: String,
    expires_at: Option<Instant>,
}

impl Credential {
    fn is_valid(&self, now: Instant) -> bool {
        !self.token.is_empty() && self.expires_at.is_some_and(|at| now < at)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

pub struct CredentialProvider {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: Secret<String>,
    cache: Mutex<Credential>,
}

impl CredentialProvider {
    pub fn new(http: reqwest::Client, token_url: impl Into<String>, twitch: &TwitchSection) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            client_id: twitch.client_id.clone(),
            client_secret: Secret::new(twitch.client_secret.expose_secret().clone()),
            cache: Mutex::new(Credential::default()),
        }
    }

    /// Cached token if still valid, otherwise a fresh one from the token endpoint.
    pub async fn get_valid_token(&self) -> Result<String> {
        let mut cached = self.cache.lock().await;
        if cached.is_valid(Instant::now()) {
            return Ok(cached.token.clone());
        }

        let fresh = self.exchange().await?;
        let token = fresh.token.clone();
        *cached = fresh;
        Ok(token)
    }

    async fn exchange(&self) -> Result<Credential> {
        tracing::info!(url = %self.token_url, "fetching new twitch app access token");

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret().as_str()),
            ("grant_type", "client_credentials"),
        ];
        let res = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| OwlSubError::Auth(format!("token request failed: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::warn!(%status, "token endpoint rejected client credentials");
            return Err(OwlSubError::Auth(format!("token endpoint returned {status}: {body}")));
        }

        let parsed: TokenResponse = res
            .json()
            .await
            .map_err(|e| OwlSubError::Auth(format!("token response invalid: {e}")))?;
        if parsed.access_token.is_empty() {
            return Err(OwlSubError::Auth("token response carried empty access_token".into()));
        }

        let ttl = Duration::from_secs(parsed.expires_in).min(MAX_TOKEN_TTL);
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| OwlSubError::Auth(format!("token lifetime {ttl:?} out of range")))?;

        Ok(Credential {
            token: parsed.access_token,
            expires_at: Some(expires_at),
        })
    }
}

#[async_trait]
impl TokenSource for CredentialProvider {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    async fn bearer_token(&self) -> Result<String> {
        self.get_valid_token().await
    }
}
