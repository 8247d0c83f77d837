use std::time::Duration;

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{reject_on_error, ProviderError};
use crate::services::token_cache::TokenCache;

const ID_BASE_URL: &str = "https://id.copyleaks.com";
const API_BASE_URL: &str = "https://api.copyleaks.com";

/// Fallback when the id server omits `expires_in`.
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Client for the Copyleaks AI-text detection API.
///
/// Every call authenticates with a bearer token minted by the id server and
/// held in a shared [`TokenCache`] until shortly before expiry.
pub struct CopyleaksClient {
    http: Client,
    email: String,
    api_key: String,
    /// Externally reachable base for the status webhook, without the
    /// trailing `/status/{status}/{local_id}` segments.
    webhook_base: String,
    tokens: TokenCache,
    id_base_url: String,
    api_base_url: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    expires_in: Option<u64>,
}

impl CopyleaksClient {
    pub fn new(email: &str, api_key: &str, webhook_base: &str) -> Self {
        Self {
            http: Client::new(),
            email: email.to_string(),
            api_key: api_key.to_string(),
            webhook_base: webhook_base.trim_end_matches('/').to_string(),
            tokens: TokenCache::new(),
            id_base_url: ID_BASE_URL.to_string(),
            api_base_url: API_BASE_URL.to_string(),
        }
    }

    async fn token(&self) -> Result<String, ProviderError> {
        self.tokens
            .get_or_refresh(|| async {
                let response = self
                    .http
                    .post(format!("{}/v3/account/login/api", self.id_base_url))
                    .json(&serde_json::json!({ "email": self.email, "key": self.api_key }))
                    .send()
                    .await?;

                let response = reject_on_error(response).await?;
                let login: LoginResponse = response.json().await?;
                let ttl = Duration::from_secs(login.expires_in.unwrap_or(DEFAULT_TOKEN_TTL_SECS));
                Ok((login.access_token, ttl))
            })
            .await
    }

    /// Submit a document for AI-text detection. The provider adopts
    /// `local_id` as its scan id and later reports status to the webhook
    /// URL, substituting the literal `{status}` segment itself.
    pub async fn submit_file(
        &self,
        local_id: &str,
        filename: &str,
        content: &[u8],
    ) -> Result<(), ProviderError> {
        let token = self.token().await?;
        let body = serde_json::json!({
            "base64": base64::engine::general_purpose::STANDARD.encode(content),
            "filename": filename,
            "properties": {
                "sandbox": true,
                "webhooks": {
                    "status": self.webhook_url(local_id),
                },
                "aiGeneratedText": { "detect": true },
            },
        });

        let response = self
            .http
            .put(format!(
                "{}/v3/scans/submit/file/{}",
                self.api_base_url, local_id
            ))
            .bearer_auth(&token)
            .json(&body)
            .timeout(Duration::from_secs(20))
            .send()
            .await?;

        reject_on_error(response).await?;
        Ok(())
    }

    /// Synchronous writer-detector check; returns the provider payload
    /// (its `summary.ai` field carries the verdict).
    pub async fn writer_check(&self, local_id: &str, text: &str) -> Result<Value, ProviderError> {
        let token = self.token().await?;
        let response = self
            .http
            .post(format!(
                "{}/v2/writer-detector/{}/check",
                self.api_base_url, local_id
            ))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "text": text, "sandbox": true }))
            .send()
            .await?;

        let response = reject_on_error(response).await?;
        Ok(response.json().await?)
    }

    /// The webhook URL template registered with the provider for a scan.
    pub fn webhook_url(&self, local_id: &str) -> String {
        format!("{}/status/{{status}}/{}", self.webhook_base, local_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_url_keeps_the_status_placeholder() {
        let client = CopyleaksClient::new(
            "dev@example.com",
            "key",
            "https://relay.example.com/api/v1/ai-text/webhook/",
        );
        assert_eq!(
            client.webhook_url("scan-1700000000000"),
            "https://relay.example.com/api/v1/ai-text/webhook/status/{status}/scan-1700000000000"
        );
    }
}
