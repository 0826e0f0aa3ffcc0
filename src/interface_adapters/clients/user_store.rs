// Thin reqwest client for the persistent user/moderator store.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct UserDigest {
    pub user_id: String,
    pub display_name: String,
}

#[derive(Clone)]
pub struct UserStoreClient {
    http: reqwest::Client,
    base_url: String,
}

impl UserStoreClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url: base_url.into() })
    }

    /// Idempotent read; callers that need freshness guarantees should poll,
    /// since this is a plain HTTP fetch with no server-side caching contract.
    pub async fn get_mods_for_channel(&self, channel_id: &str) -> Result<Vec<UserDigest>, reqwest::Error> {
        let url = format!("{}/channels/{}/mods", self.base_url, channel_id);
        self.http.get(url).send().await?.json().await
    }
}
