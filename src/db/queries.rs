use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::models::job::{JobStatus, NewScanJob, ScanJob};

const JOB_COLUMNS: &str = "id, local_id, external_id, provider, kind, source, input_url, \
     original_filename, status, raw_result, normalized_result, error, \
     created_at, updated_at, completed_at";

fn decode_error(
    column: &str,
    source: strum::ParseError,
) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

fn job_from_row(row: &PgRow) -> Result<ScanJob, sqlx::Error> {
    let provider: String = row.try_get("provider")?;
    let kind: String = row.try_get("kind")?;
    let source: String = row.try_get("source")?;
    let status: String = row.try_get("status")?;

    Ok(ScanJob {
        id: row.try_get("id")?,
        local_id: row.try_get("local_id")?,
        external_id: row.try_get("external_id")?,
        provider: provider.parse().map_err(|e| decode_error("provider", e))?,
        kind: kind.parse().map_err(|e| decode_error("kind", e))?,
        source: source.parse().map_err(|e| decode_error("source", e))?,
        input_url: row.try_get("input_url")?,
        original_filename: row.try_get("original_filename")?,
        status: status.parse().map_err(|e| decode_error("status", e))?,
        raw_result: row.try_get("raw_result")?,
        normalized_result: row.try_get("normalized_result")?,
        error: row.try_get("error")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}

/// Insert a freshly submitted job.
pub async fn create_job(pool: &PgPool, new: &NewScanJob) -> Result<ScanJob, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO scan_jobs (local_id, external_id, provider, kind, source, input_url, original_filename, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'submitted')
        RETURNING {JOB_COLUMNS}
        "#
    );

    let row = sqlx::query(&sql)
        .bind(&new.local_id)
        .bind(new.external_id.as_deref())
        .bind(new.provider.to_string())
        .bind(new.kind.to_string())
        .bind(new.source.to_string())
        .bind(new.input_url.as_deref())
        .bind(new.original_filename.as_deref())
        .fetch_one(pool)
        .await?;

    job_from_row(&row)
}

/// Insert a record that is terminal from birth (synchronous one-call flows).
pub async fn insert_completed_job(
    pool: &PgPool,
    new: &NewScanJob,
    raw_result: &Value,
    normalized_result: &Value,
) -> Result<ScanJob, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO scan_jobs (local_id, external_id, provider, kind, source, input_url,
                               original_filename, status, raw_result, normalized_result, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'completed', $8, $9, NOW())
        RETURNING {JOB_COLUMNS}
        "#
    );

    let row = sqlx::query(&sql)
        .bind(&new.local_id)
        .bind(new.external_id.as_deref())
        .bind(new.provider.to_string())
        .bind(new.kind.to_string())
        .bind(new.source.to_string())
        .bind(new.input_url.as_deref())
        .bind(new.original_filename.as_deref())
        .bind(raw_result)
        .bind(normalized_result)
        .fetch_one(pool)
        .await?;

    job_from_row(&row)
}

/// Get a job by its locally minted identifier.
pub async fn get_job_by_local_id(
    pool: &PgPool,
    local_id: &str,
) -> Result<Option<ScanJob>, sqlx::Error> {
    let sql = format!("SELECT {JOB_COLUMNS} FROM scan_jobs WHERE local_id = $1");

    let row = sqlx::query(&sql).bind(local_id).fetch_optional(pool).await?;
    row.as_ref().map(job_from_row).transpose()
}

/// Move a submitted job into `polling`. Terminal rows are untouched.
pub async fn mark_polling(pool: &PgPool, local_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE scan_jobs
        SET status = 'polling', updated_at = NOW()
        WHERE local_id = $1 AND status = 'submitted'
        "#,
    )
    .bind(local_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record a job's terminal state.
///
/// The write is conditional on the row still being non-terminal, so each job
/// gets at most one completion write: a redelivered webhook, or a poll
/// tracker racing a late callback, matches zero rows. Returns whether a row
/// was transitioned.
pub async fn complete_job(
    pool: &PgPool,
    local_id: &str,
    status: JobStatus,
    external_id: Option<&str>,
    raw_result: Option<&Value>,
    normalized_result: Option<&Value>,
    error: Option<&str>,
) -> Result<bool, sqlx::Error> {
    debug_assert!(status.is_terminal());

    let result = sqlx::query(
        r#"
        UPDATE scan_jobs
        SET status = $2,
            external_id = COALESCE($3, external_id),
            raw_result = $4,
            normalized_result = $5,
            error = $6,
            updated_at = NOW(),
            completed_at = NOW()
        WHERE local_id = $1
          AND status NOT IN ('completed', 'error', 'timed_out')
        "#,
    )
    .bind(local_id)
    .bind(status.to_string())
    .bind(external_id)
    .bind(raw_result)
    .bind(normalized_result)
    .bind(error)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Most recent jobs of one kind, newest first.
pub async fn recent_jobs(
    pool: &PgPool,
    kind: &str,
    limit: i64,
) -> Result<Vec<ScanJob>, sqlx::Error> {
    let sql = format!(
        "SELECT {JOB_COLUMNS} FROM scan_jobs WHERE kind = $1 ORDER BY created_at DESC LIMIT $2"
    );

    let rows = sqlx::query(&sql)
        .bind(kind)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    rows.iter().map(job_from_row).collect()
}
