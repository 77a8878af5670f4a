use std::collections::BTreeMap;

use reqwest::Method;
use serde::Serialize;

use owlsub_core::error::{OwlSubError, Result};
use owlsub_core::protocol::SubscriptionType;

use super::HelixClient;

const SUBSCRIPTIONS_PATH: &str = "eventsub/subscriptions";

#[derive(Debug, Serialize)]
struct CreateSubscriptionRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    version: &'a str,
    condition: &'a BTreeMap<String, String>,
    transport: TransportBody<'a>,
}

#[derive(Debug, Serialize)]
struct TransportBody<'a> {
    method: &'static str,
    session_id: &'a str,
}

impl HelixClient {
    /// Register interest in `kind` (version "1") on the given websocket session.
    ///
    /// Not de-duplicated: two identical calls create two upstream registrations
    /// unless Helix itself rejects the second.
    pub async fn add_subscription(
        &self,
        session_id: &str,
        kind: &SubscriptionType,
        condition: &BTreeMap<String, String>,
    ) -> Result<()> {
        self.add_subscription_version(session_id, kind.as_str(), "1", condition)
            .await
    }

    pub async fn add_subscription_version(
        &self,
        session_id: &str,
        kind: &str,
        version: &str,
        condition: &BTreeMap<String, String>,
    ) -> Result<()> {
        if session_id.is_empty() {
            return Err(OwlSubError::NotConnected);
        }

        let body = CreateSubscriptionRequest {
            kind,
            version,
            condition,
            transport: TransportBody {
                method: "websocket",
                session_id,
            },
        };

        let res = self
            .authed(Method::POST, SUBSCRIPTIONS_PATH)
            .await?
            .json(&body)
            .send()
            .await
            .map_err(|e| OwlSubError::Http(format!("subscription request failed: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::warn!(%status, subscription_type = kind, session_id, "subscription rejected");
            return Err(OwlSubError::SubscriptionRejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(subscription_type = kind, session_id, "subscription registered");
        Ok(())
    }
}
