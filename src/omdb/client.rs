use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::CatalogError;

pub const OMDB_BASE: &str = "http://www.omdbapi.com/";

#[derive(Debug, Clone)]
pub struct OmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let user_agent = format!("popcorn/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()
            .context("Failed to build OMDb HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.omdb_base_url.clone(), config.omdb_api_key.clone())
    }

    pub(crate) fn url(&self, params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}?apikey={}",
            self.base_url,
            urlencoding::encode(&self.api_key)
        );
        for (key, value) in params {
            url.push_str(&format!("&{}={}", key, urlencoding::encode(value)));
        }
        url
    }

    /// GET the catalog with `params`, racing the request against `cancel`.
    pub(crate) async fn get_json(
        &self,
        params: &[(&str, &str)],
        cancel: &CancellationToken,
    ) -> Result<Value, CatalogError> {
        let url = self.url(params);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(?params, "OMDb request cancelled");
                Err(CatalogError::Cancelled)
            }
            res = self.fetch(&url) => res.map_err(|e| {
                warn!(?params, "OMDb request failed: {:#}", e);
                CatalogError::network()
            }),
        }
    }

    async fn fetch(&self, url: &str) -> Result<Value> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .context("OMDb request failed")?;
        let status = res.status();
        let bytes = res.bytes().await.context("Failed to read OMDb body")?;
        if !status.is_success() {
            anyhow::bail!(
                "OMDb HTTP error (status {}): {}",
                status,
                String::from_utf8_lossy(&bytes)
            );
        }
        serde_json::from_slice(&bytes).context("Failed to parse OMDb JSON")
    }
}
