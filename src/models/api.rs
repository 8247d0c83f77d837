use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::job::{JobStatus, Provider, ScanJob, ScanKind};

/// Request for a synchronous AI-writer check on raw text.
#[derive(Debug, Deserialize, Validate)]
pub struct WriterCheckRequest {
    #[garde(length(min = 1, max = 100000))]
    pub text: String,
}

/// Request for a GDPR compliance scan of a website.
#[derive(Debug, Deserialize, Validate)]
pub struct GdprScanRequest {
    #[garde(length(min = 1, max = 2048))]
    pub url: String,
}

/// Response after accepting an asynchronous job.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub local_id: String,
    pub external_id: Option<String>,
    pub status: JobStatus,
    pub message: String,
}

/// Response for querying job status and results.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub local_id: String,
    pub external_id: Option<String>,
    pub provider: Provider,
    pub kind: ScanKind,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<ScanJob> for JobStatusResponse {
    fn from(job: ScanJob) -> Self {
        Self {
            local_id: job.local_id,
            external_id: job.external_id,
            provider: job.provider,
            kind: job.kind,
            status: job.status,
            normalized_result: job.normalized_result,
            raw_result: job.raw_result,
            error: job.error,
            created_at: job.created_at,
            completed_at: job.completed_at,
        }
    }
}

/// Response for a synchronous deepfake check.
#[derive(Debug, Serialize)]
pub struct DeepfakeResponse {
    pub local_id: String,
    pub score: Option<f64>,
    pub percentage: Option<f64>,
    pub label: String,
}

/// Response for a synchronous AI-writer check.
#[derive(Debug, Serialize)]
pub struct WriterCheckResponse {
    pub local_id: String,
    pub overall_ai_score: Option<f64>,
    pub overall_human_score: Option<f64>,
    pub ai_percentage: Option<f64>,
}

/// Acknowledgement returned to the provider for every webhook delivery.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub ok: bool,
}
