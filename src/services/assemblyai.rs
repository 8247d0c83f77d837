use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{reject_on_error, ProviderError};
use crate::services::poller::JobProbe;

const BASE_URL: &str = "https://api.assemblyai.com/v2";

/// Client for the AssemblyAI transcription API.
pub struct AssemblyAiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

/// Caller-selectable transcript features. Summarization, highlights and
/// sentiment analysis are always requested on top of these.
#[derive(Debug, Default)]
pub struct TranscriptOptions {
    pub speaker_labels: bool,
    pub speakers_expected: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatedTranscript {
    pub id: String,
    pub status: String,
}

impl AssemblyAiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.to_string(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Push raw audio bytes to the provider, returning a URL usable as
    /// `audio_url` in a transcript request.
    pub async fn upload_audio(&self, bytes: Vec<u8>) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(format!("{}/upload", self.base_url))
            .header("authorization", &self.api_key)
            .header("content-type", "application/octet-stream")
            .body(bytes)
            .send()
            .await?;

        let response = reject_on_error(response).await?;
        let parsed: UploadResponse = response.json().await?;
        Ok(parsed.upload_url)
    }

    /// Create a transcription job; returns the provider's job id.
    pub async fn create_transcript(
        &self,
        audio_url: &str,
        options: &TranscriptOptions,
    ) -> Result<CreatedTranscript, ProviderError> {
        let mut body = serde_json::json!({
            "audio_url": audio_url,
            "summarization": true,
            "summary_model": "informative",
            "summary_type": "bullets",
            "auto_highlights": true,
            "sentiment_analysis": true,
        });
        if options.speaker_labels {
            body["speaker_labels"] = Value::Bool(true);
            if let Some(n) = options.speakers_expected {
                body["speakers_expected"] = n.into();
            }
        }

        let response = self
            .http
            .post(format!("{}/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let response = reject_on_error(response).await?;
        Ok(response.json().await?)
    }

    /// One status fetch for the poll tracker.
    pub async fn probe_transcript(&self, id: &str) -> Result<JobProbe, ProviderError> {
        let response = self
            .http
            .get(format!("{}/transcript/{}", self.base_url, id))
            .header("authorization", &self.api_key)
            .send()
            .await?;

        let response = reject_on_error(response).await?;
        let data: Value = response.json().await?;
        Ok(probe_from_payload(&data))
    }
}

/// Map a transcript payload onto the tracker's probe states.
pub fn probe_from_payload(data: &Value) -> JobProbe {
    match data.get("status").and_then(Value::as_str) {
        Some("completed") => JobProbe::Completed(data.clone()),
        Some("error") => JobProbe::Failed(
            data.get("error")
                .and_then(Value::as_str)
                .unwrap_or("transcript error")
                .to_string(),
        ),
        _ => JobProbe::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn queued_and_processing_are_pending() {
        assert_eq!(probe_from_payload(&json!({ "status": "queued" })), JobProbe::Pending);
        assert_eq!(probe_from_payload(&json!({ "status": "processing" })), JobProbe::Pending);
        assert_eq!(probe_from_payload(&json!({})), JobProbe::Pending);
    }

    #[test]
    fn completed_carries_the_payload() {
        let payload = json!({ "status": "completed", "text": "hello" });
        assert_eq!(probe_from_payload(&payload), JobProbe::Completed(payload.clone()));
    }

    #[test]
    fn error_carries_the_provider_message() {
        let payload = json!({ "status": "error", "error": "download failed" });
        assert_eq!(
            probe_from_payload(&payload),
            JobProbe::Failed("download failed".to_string())
        );

        let bare = json!({ "status": "error" });
        assert_eq!(
            probe_from_payload(&bare),
            JobProbe::Failed("transcript error".to_string())
        );
    }
}
