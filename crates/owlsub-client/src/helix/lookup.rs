use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use owlsub_core::error::{OwlSubError, Result};

use super::HelixClient;

/// Helix caps list parameters at 100 entries per request.
pub const MAX_QUERY_PARAMS: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct HelixUser {
    pub id: String,
    pub login: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsersResponse {
    pub data: Vec<HelixUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixStream {
    pub id: String,
    pub user_id: String,
    pub user_login: String,
    pub user_name: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(rename = "type")]
    pub stream_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub thumbnail_url: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamsResponse {
    pub data: Vec<HelixStream>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl HelixClient {
    /// Look up users by login name.
    pub async fn get_users(&self, logins: &[String]) -> Result<UsersResponse> {
        check_param_count(logins)?;
        let query: Vec<(&str, &str)> = logins.iter().map(|l| ("login", l.as_str())).collect();
        self.get_json("users", &query).await
    }

    /// Live streams for the given user ids.
    pub async fn get_streams(&self, user_ids: &[String]) -> Result<StreamsResponse> {
        check_param_count(user_ids)?;
        let mut query: Vec<(&str, &str)> = user_ids.iter().map(|id| ("user_id", id.as_str())).collect();
        query.push(("first", "100"));

        let res: StreamsResponse = self.get_json("streams", &query).await?;
        if res.pagination.cursor.is_some() {
            tracing::warn!(?user_ids, "helix returned a pagination cursor where none was expected");
        }
        Ok(res)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let res = self
            .authed(Method::GET, path)
            .await?
            .query(query)
            .send()
            .await
            .map_err(|e| OwlSubError::Http(format!("helix {path} request failed: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            return Err(OwlSubError::Http(format!("helix {path} returned {status}")));
        }

        res.json()
            .await
            .map_err(|e| OwlSubError::Http(format!("helix {path} response invalid: {e}")))
    }
}

fn check_param_count(params: &[String]) -> Result<()> {
    if params.len() > MAX_QUERY_PARAMS {
        return Err(OwlSubError::BadRequest("parameter list is too long".into()));
    }
    Ok(())
}
