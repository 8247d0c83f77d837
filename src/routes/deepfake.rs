use axum::extract::{Multipart, State};
use axum::Json;
use image::ImageFormat;

use crate::app_state::AppState;
use crate::db::queries;
use crate::error::ApiError;
use crate::models::api::DeepfakeResponse;
use crate::models::job::{InputSource, NewScanJob, Provider, ScanKind};
use crate::routes::is_http_url;
use crate::services::normalize;

fn content_type_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::WebP => "image/webp",
        _ => "application/octet-stream",
    }
}

/// POST /api/v1/deepfake — check an image for deepfake manipulation.
///
/// Multipart form: `image` (file) or `url` (text), exactly one. The provider
/// answers synchronously, so the record is persisted terminal in one step.
pub async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DeepfakeResponse>, ApiError> {
    let mut image_file: Option<(String, Vec<u8>)> = None;
    let mut url: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::InvalidInput("malformed multipart body".to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let filename = field.file_name().unwrap_or("image").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::InvalidInput("failed to read image field".to_string()))?;
                image_file = Some((filename, data.to_vec()));
            }
            Some("url") => {
                url = Some(field.text().await.map_err(|_| {
                    ApiError::InvalidInput("failed to read url field".to_string())
                })?);
            }
            _ => {}
        }
    }

    let (raw, new_job) = match (image_file, url) {
        (Some(_), Some(_)) | (None, None) => {
            return Err(ApiError::InvalidInput(
                "provide either an \"image\" file or a \"url\"".to_string(),
            ))
        }
        (Some((filename, bytes)), None) => {
            let format = image::guess_format(&bytes).map_err(|_| {
                ApiError::InvalidInput("unrecognized or unsupported image format".to_string())
            })?;

            let raw = state
                .sightengine
                .check_upload(&filename, content_type_for(format), bytes)
                .await?;
            let new_job = NewScanJob {
                local_id: state.scan_ids.next_id(),
                external_id: None,
                provider: Provider::Sightengine,
                kind: ScanKind::Deepfake,
                source: InputSource::Upload,
                input_url: None,
                original_filename: Some(filename),
            };
            (raw, new_job)
        }
        (None, Some(url)) => {
            if !is_http_url(&url) {
                return Err(ApiError::InvalidInput(
                    "url must be an http(s) URL".to_string(),
                ));
            }

            let raw = state.sightengine.check_url(&url).await?;
            let new_job = NewScanJob {
                local_id: state.scan_ids.next_id(),
                external_id: None,
                provider: Provider::Sightengine,
                kind: ScanKind::Deepfake,
                source: InputSource::Url,
                input_url: Some(url),
                original_filename: None,
            };
            (raw, new_job)
        }
    };

    let summary = normalize::deepfake_from_payload(&raw);
    let normalized = normalize::to_json(&summary);
    let job = queries::insert_completed_job(&state.db, &new_job, &raw, &normalized).await?;

    metrics::counter!("scan_jobs_completed_total", "kind" => "deepfake").increment(1);
    tracing::info!(
        local_id = %job.local_id,
        score = summary.score,
        label = %summary.label,
        "deepfake check recorded"
    );

    Ok(Json(DeepfakeResponse {
        local_id: job.local_id,
        score: summary.score,
        percentage: summary.percentage,
        label: summary.label,
    }))
}
