// Thin reqwest client for the third-party identity provider (follow / subscribe
// / ban checks), analogous to `AuthClient`. Composes query URLs via
// `url::Url::query_pairs_mut` rather than hand-built format strings, since the
// original source's subscription check dropped the `?` separator and silently
// queried the wrong path.
//
// Follow/subscribe are checked with the joining user's own provider token;
// the ban check runs against the lobby owner's token, and a missing owner
// token is a hard upstream error rather than an "unknown" result.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::interface_adapters::clients::token_store::TokenStore;
use crate::use_cases::join_policy::{IdentityProvider, UpstreamError};

#[derive(Debug, Deserialize)]
struct CheckResponse {
    result: bool,
}

pub struct HttpIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl HttpIdentityProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration, tokens: Arc<dyn TokenStore>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url: base_url.into(), tokens })
    }

    async fn check(&self, path: &str, user: &str, channel_owner: &str, token: &str) -> Result<Option<bool>, UpstreamError> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path)).map_err(|e| UpstreamError(e.to_string()))?;
        url.query_pairs_mut().append_pair("user", user).append_pair("channel_owner", channel_owner);

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| UpstreamError(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(UpstreamError(format!("identity provider returned {}", response.status())));
        }
        let body: CheckResponse = response.json().await.map_err(|e| UpstreamError(e.to_string()))?;
        Ok(Some(body.result))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn check_user_follows(&self, user: &str, channel_owner: &str) -> Result<Option<bool>, UpstreamError> {
        let Some(token) = self.tokens.get(user).await else { return Ok(None) };
        self.check("follows", user, channel_owner, &token.access_token).await
    }

    async fn check_user_subscription(&self, user: &str, channel_owner: &str) -> Result<Option<bool>, UpstreamError> {
        let Some(token) = self.tokens.get(user).await else { return Ok(None) };
        self.check("subscription", user, channel_owner, &token.access_token).await
    }

    async fn check_user_banned(&self, user: &str, channel_owner: &str) -> Result<Option<bool>, UpstreamError> {
        let Some(owner_token) = self.tokens.get(channel_owner).await else {
            return Err(UpstreamError(format!("no stored identity-provider token for owner {channel_owner}")));
        };
        self.check("banned", user, channel_owner, &owner_token.access_token).await
    }
}
