use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{reject_on_error, ProviderError};
use crate::services::poller::JobProbe;

const BASE_URL: &str = "https://api.gladia.io/v2";

/// Client for the Gladia pre-recorded transcription API.
pub struct GladiaClient {
    http: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatedGladiaJob {
    pub id: String,
    pub result_url: String,
}

impl GladiaClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.to_string(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Create a transcription job; returns the provider's job id together
    /// with the URL the result must be fetched from.
    pub async fn create_job(&self, audio_url: &str) -> Result<CreatedGladiaJob, ProviderError> {
        let response = self
            .http
            .post(format!("{}/pre-recorded", self.base_url))
            .header("x-gladia-key", &self.api_key)
            .json(&serde_json::json!({ "audio_url": audio_url }))
            .send()
            .await?;

        let response = reject_on_error(response).await?;
        Ok(response.json().await?)
    }

    /// One status fetch for the poll tracker.
    pub async fn probe_result(&self, result_url: &str) -> Result<JobProbe, ProviderError> {
        let response = self
            .http
            .get(result_url)
            .header("x-gladia-key", &self.api_key)
            .send()
            .await?;

        let response = reject_on_error(response).await?;
        let data: Value = response.json().await?;
        Ok(probe_from_payload(&data))
    }
}

/// A payload without a `status` field is already the final result.
pub fn probe_from_payload(data: &Value) -> JobProbe {
    match data.get("status").and_then(Value::as_str) {
        None | Some("done") | Some("finished") => JobProbe::Completed(data.clone()),
        Some("error") => JobProbe::Failed(
            data.get("error")
                .and_then(Value::as_str)
                .unwrap_or("transcription error")
                .to_string(),
        ),
        Some(_) => JobProbe::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_status_is_terminal() {
        let payload = json!({ "result": { "transcription": { "full_transcript": "hi" } } });
        assert_eq!(probe_from_payload(&payload), JobProbe::Completed(payload.clone()));
    }

    #[test]
    fn done_and_finished_are_terminal() {
        for status in ["done", "finished"] {
            let payload = json!({ "status": status });
            assert_eq!(probe_from_payload(&payload), JobProbe::Completed(payload.clone()));
        }
    }

    #[test]
    fn queued_is_pending() {
        assert_eq!(probe_from_payload(&json!({ "status": "queued" })), JobProbe::Pending);
    }

    #[test]
    fn error_is_failed() {
        assert_eq!(
            probe_from_payload(&json!({ "status": "error" })),
            JobProbe::Failed("transcription error".to_string())
        );
    }
}
