use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;
use serde_json::Value;

use crate::app_state::AppState;
use crate::db::queries;
use crate::error::ApiError;
use crate::models::api::{SubmitResponse, WebhookAck, WriterCheckRequest, WriterCheckResponse};
use crate::models::job::{InputSource, JobStatus, NewScanJob, Provider, ScanKind};
use crate::services::normalize;

/// POST /api/v1/ai-text/scans — submit a document for AI-text detection.
///
/// The provider reports status asynchronously to the webhook route below;
/// until then the job stays `submitted`.
pub async fn submit_scan(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::InvalidInput("malformed multipart body".to_string()))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("document").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|_| ApiError::InvalidInput("failed to read file field".to_string()))?;
            file = Some((filename, data.to_vec()));
        }
    }

    let (filename, bytes) = file.ok_or_else(|| {
        ApiError::InvalidInput("upload a document file in the \"file\" field".to_string())
    })?;

    let local_id = state.scan_ids.next_id();
    state.copyleaks.submit_file(&local_id, &filename, &bytes).await?;

    let job = queries::create_job(
        &state.db,
        &NewScanJob {
            local_id: local_id.clone(),
            // the provider adopts our id as its scan id
            external_id: Some(local_id.clone()),
            provider: Provider::Copyleaks,
            kind: ScanKind::AiTextScan,
            source: InputSource::Upload,
            input_url: None,
            original_filename: Some(filename),
        },
    )
    .await?;

    metrics::counter!("scan_jobs_submitted_total", "kind" => "ai_text_scan").increment(1);
    tracing::info!(local_id = %job.local_id, "document submitted for AI-text detection");

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            local_id: job.local_id.clone(),
            external_id: job.external_id.clone(),
            status: job.status,
            message: "document submitted; results arrive via the provider webhook".to_string(),
        }),
    ))
}

/// POST /api/v1/ai-text/webhook/status/{status}/{local_id}
///
/// Callback endpoint the provider invokes, with `{status}` substituted by
/// one of completed | error | creditsChecked | indexed. Every delivery is
/// acknowledged with 200 regardless of internal outcome, so a processing
/// failure does not trigger the provider's delivery retries.
pub async fn status_webhook(
    State(state): State<AppState>,
    Path((status, local_id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> Json<WebhookAck> {
    tracing::info!(status = %status, local_id = %local_id, "ai-text webhook received");

    if status != "completed" {
        return Json(WebhookAck { ok: true });
    }

    let summary = normalize::ai_text_from_webhook(&payload);
    if summary.overall_ai_score.is_none() {
        tracing::warn!(local_id = %local_id, "no AI alert on completed scan; recording null scores");
    }
    let normalized = normalize::to_json(&summary);

    match queries::complete_job(
        &state.db,
        &local_id,
        JobStatus::Completed,
        None,
        Some(&payload),
        Some(&normalized),
        None,
    )
    .await
    {
        Ok(true) => {
            metrics::counter!("scan_jobs_completed_total", "kind" => "ai_text_scan").increment(1);
            tracing::info!(
                local_id = %local_id,
                ai_score = summary.overall_ai_score,
                "AI-text scan recorded"
            );
        }
        Ok(false) => {
            tracing::warn!(
                local_id = %local_id,
                "completion delivery for unknown or already-terminal job ignored"
            );
        }
        Err(e) => {
            tracing::error!(local_id = %local_id, error = %e, "failed to persist webhook result");
        }
    }

    Json(WebhookAck { ok: true })
}

/// POST /api/v1/ai-text/check — synchronous writer-detector check on raw
/// text. The record is terminal from birth.
pub async fn writer_check(
    State(state): State<AppState>,
    Json(request): Json<WriterCheckRequest>,
) -> Result<Json<WriterCheckResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

    let local_id = state.scan_ids.next_id();
    let payload = state.copyleaks.writer_check(&local_id, &request.text).await?;

    let summary = normalize::ai_text_from_writer_check(&payload);
    let normalized = normalize::to_json(&summary);

    let job = queries::insert_completed_job(
        &state.db,
        &NewScanJob {
            local_id: local_id.clone(),
            external_id: Some(local_id.clone()),
            provider: Provider::Copyleaks,
            kind: ScanKind::AiTextCheck,
            source: InputSource::Upload,
            input_url: None,
            original_filename: None,
        },
        &payload,
        &normalized,
    )
    .await?;

    metrics::counter!("scan_jobs_completed_total", "kind" => "ai_text_check").increment(1);

    Ok(Json(WriterCheckResponse {
        local_id: job.local_id,
        overall_ai_score: summary.overall_ai_score,
        overall_human_score: summary.overall_human_score,
        ai_percentage: summary.ai_percentage,
    }))
}
