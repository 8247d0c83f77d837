use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::{reject_on_error, ProviderError};

/// Client for the external GDPR compliance validator.
pub struct GdprScannerClient {
    http: Client,
    base_url: String,
}

impl GdprScannerClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Scan a website; returns the validator's raw findings.
    pub async fn check(&self, url: &str) -> Result<Value, ProviderError> {
        let response = self
            .http
            .get(format!("{}/scan/check", self.base_url))
            .query(&[("url", url)])
            .timeout(Duration::from_secs(15))
            .send()
            .await?;

        let response = reject_on_error(response).await?;
        Ok(response.json().await?)
    }
}
