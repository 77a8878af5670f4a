//! Helix REST client: EventSub subscription registration and lookups.
//!
//! Every call is authenticated with `Client-Id` plus a bearer token obtained
//! from a [`TokenSource`].

mod lookup;
mod subscriptions;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder};

use owlsub_core::error::{OwlSubError, Result};

use crate::credentials::TokenSource;

pub use lookup::{HelixStream, HelixUser, Pagination, StreamsResponse, UsersResponse};

/// Build the shared HTTP client.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| OwlSubError::Internal(format!("http client build failed: {e}")))
}

#[derive(Clone)]
pub struct HelixClient {
    http: reqwest::Client,
    api_base: String,
    tokens: Arc<dyn TokenSource>,
}

impl HelixClient {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            tokens,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }

    async fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.tokens.bearer_token().await?;
        Ok(self
            .http
            .request(method, self.endpoint(path))
            .header("Client-Id", self.tokens.client_id())
            .bearer_auth(token))
    }
}
