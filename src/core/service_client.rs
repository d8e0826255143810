// src/core/service_client.rs
//! Shared HTTP client for the third-party JSON APIs (scrape, completion, mail)

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{error, trace};

pub struct ServiceClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ServiceClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Authenticated POST with a JSON body; non-2xx responses become errors
    pub async fn post_json<T, R>(&self, endpoint: &str, payload: &T) -> Result<R>
    where
        T: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        trace!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Failed to POST to {}", url))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<R>()
                .await
                .with_context(|| format!("Failed to parse JSON response from {}", url))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("{} returned {}: {}", url, status, error_text);
            anyhow::bail!("HTTP {} error from {}: {}", status, endpoint, error_text)
        }
    }
}
