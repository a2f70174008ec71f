use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CatalogCurrency {
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
}

/// Adapter over the external currency catalog. One fetch returns the
/// complete list; the sync task upserts it idempotently.
pub struct CurrencyCatalogClient {
    client: Client,
    url: String,
}

impl CurrencyCatalogClient {
    pub fn new(url: String, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent("plantdesk/1.0")
            .build()
            .context("Failed to build currency catalog HTTP client")?;

        Ok(Self { client, url })
    }

    pub async fn fetch_all(&self) -> Result<Vec<CatalogCurrency>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Currency catalog request failed")?
            .error_for_status()
            .context("Currency catalog rejected the request")?;

        response
            .json::<Vec<CatalogCurrency>>()
            .await
            .context("Currency catalog returned malformed data")
    }
}
