use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::{reject_on_error, ProviderError};

const BASE_URL: &str = "https://api.sightengine.com/1.0";

/// Client for the Sightengine deepfake detection model.
pub struct SightengineClient {
    http: Client,
    api_user: String,
    api_secret: String,
    base_url: String,
}

impl SightengineClient {
    pub fn new(api_user: &str, api_secret: &str) -> Self {
        Self {
            http: Client::new(),
            api_user: api_user.to_string(),
            api_secret: api_secret.to_string(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Check remotely hosted media.
    pub async fn check_url(&self, media_url: &str) -> Result<Value, ProviderError> {
        let response = self
            .http
            .get(format!("{}/check.json", self.base_url))
            .query(&[
                ("url", media_url),
                ("models", "deepfake"),
                ("api_user", self.api_user.as_str()),
                ("api_secret", self.api_secret.as_str()),
            ])
            .timeout(Duration::from_secs(20))
            .send()
            .await?;

        let response = reject_on_error(response).await?;
        Ok(response.json().await?)
    }

    /// Check an uploaded image.
    pub async fn check_upload(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Value, ProviderError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new()
            .part("media", part)
            .text("models", "deepfake")
            .text("api_user", self.api_user.clone())
            .text("api_secret", self.api_secret.clone());

        let response = self
            .http
            .post(format!("{}/check.json", self.base_url))
            .multipart(form)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        let response = reject_on_error(response).await?;
        Ok(response.json().await?)
    }
}
