use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

/// Employee record as served by the third-party HR directory.
#[derive(Debug, Deserialize)]
pub struct HrEmployee {
    pub username: String,
    pub name: String,
    pub email: Option<String>,
}

/// Adapter over the external HR directory. The upstream endpoint only
/// answers name-prefix queries and authenticates with a fixed session
/// cookie, so a full sync sweeps the letters a–z. Fragile by
/// construction; failures surface per letter, never hidden.
pub struct HrDirectoryClient {
    client: Client,
    base_url: String,
    session_cookie: String,
}

impl HrDirectoryClient {
    pub fn new(base_url: String, session_cookie: String, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent("plantdesk/1.0")
            .build()
            .context("Failed to build HR directory HTTP client")?;

        Ok(Self {
            client,
            base_url,
            session_cookie,
        })
    }

    pub async fn fetch_by_initial(&self, letter: char) -> Result<Vec<HrEmployee>> {
        let url = format!("{}?name={letter}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Cookie", &self.session_cookie)
            .send()
            .await
            .with_context(|| format!("HR directory request failed for '{letter}'"))?
            .error_for_status()
            .with_context(|| format!("HR directory rejected query for '{letter}'"))?;

        response
            .json::<Vec<HrEmployee>>()
            .await
            .with_context(|| format!("HR directory returned malformed data for '{letter}'"))
    }
}
