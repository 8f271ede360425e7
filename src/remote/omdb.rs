use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{OmdbSearch, OmdbTitle, RatingsApi};
use crate::error::RemoteError;

/// HTTP client for the OMDb API. Every request carries the configured timeout.
#[derive(Clone)]
pub struct OmdbClient {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
}

impl OmdbClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, RemoteError> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_key,
            base_url,
        })
    }

    async fn get<T: DeserializeOwned>(&self, param: &str, value: &str) -> Result<T, RemoteError> {
        debug!(param, value, provider = "omdb", "sending request");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[(param, value), ("apikey", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status().as_u16()));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait::async_trait]
impl RatingsApi for OmdbClient {
    async fn lookup_title(&self, title: &str) -> Result<OmdbTitle, RemoteError> {
        self.get("t", title).await
    }

    async fn lookup_id(&self, id: &str) -> Result<OmdbTitle, RemoteError> {
        self.get("i", id).await
    }

    async fn search(&self, query: &str) -> Result<OmdbSearch, RemoteError> {
        self.get("s", query).await
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}
