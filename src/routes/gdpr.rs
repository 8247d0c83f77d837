use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::db::queries;
use crate::error::ApiError;
use crate::models::api::{GdprScanRequest, JobStatusResponse};
use crate::models::job::{InputSource, NewScanJob, Provider, ScanKind};
use crate::routes::is_http_url;
use crate::services::normalize;

/// POST /api/v1/gdpr/scans — run a GDPR compliance scan on a website.
///
/// The validator answers synchronously; one terminal record holds the
/// scanned URL, the raw findings and the normalized view.
pub async fn scan(
    State(state): State<AppState>,
    Json(request): Json<GdprScanRequest>,
) -> Result<(StatusCode, Json<JobStatusResponse>), ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
    if !is_http_url(&request.url) {
        return Err(ApiError::InvalidInput(
            "provide a valid http/https URL".to_string(),
        ));
    }

    let raw = state.gdpr.check(&request.url).await?;
    let summary = normalize::gdpr_from_payload(&raw);
    let normalized = normalize::to_json(&summary);

    let job = queries::insert_completed_job(
        &state.db,
        &NewScanJob {
            local_id: state.scan_ids.next_id(),
            external_id: None,
            provider: Provider::GdprValidator,
            kind: ScanKind::GdprScan,
            source: InputSource::Url,
            input_url: Some(request.url),
            original_filename: None,
        },
        &raw,
        &normalized,
    )
    .await?;

    metrics::counter!("scan_jobs_completed_total", "kind" => "gdpr_scan").increment(1);
    tracing::info!(
        local_id = %job.local_id,
        score = summary.score,
        "GDPR scan recorded"
    );

    Ok((StatusCode::CREATED, Json(job.into())))
}
