use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::db::queries;
use crate::error::ApiError;
use crate::models::api::JobStatusResponse;
use crate::models::job::ScanKind;

/// GET /api/v1/jobs/{local_id} — job status, and results once terminal.
pub async fn get_job(
    State(state): State<AppState>,
    Path(local_id): Path<String>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let job = queries::get_job_by_local_id(&state.db, &local_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(job.into()))
}

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub kind: ScanKind,
    pub limit: Option<i64>,
}

/// GET /api/v1/jobs?kind=transcript&limit=20 — newest records of one kind.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<JobStatusResponse>>, ApiError> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let jobs = queries::recent_jobs(&state.db, &query.kind.to_string(), limit).await?;

    Ok(Json(jobs.into_iter().map(Into::into).collect()))
}
