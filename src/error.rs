use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

/// Failure of an outbound provider call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("provider rejected the request with HTTP {status}")]
    Rejected { status: u16, body: Value },
}

/// Turn a non-success provider response into `ProviderError::Rejected`,
/// preserving the raw body for diagnosis.
pub async fn reject_on_error(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
    Err(ProviderError::Rejected {
        status: status.as_u16(),
        body,
    })
}

/// Errors surfaced by the API routes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Caller error, fixable by the caller.
    #[error("{0}")]
    InvalidInput(String),

    #[error("no job with that id")]
    NotFound,

    /// Provider-side validation failure, surfaced verbatim.
    #[error("provider rejected the submission (HTTP {status})")]
    ProviderRejected { status: u16, body: Value },

    /// Network or timeout failure reaching the provider; retryable by the caller.
    #[error("provider unreachable: {0}")]
    ProviderUnreachable(#[source] reqwest::Error),

    #[error("job did not reach a terminal state within the tracking budget")]
    TrackingTimedOut,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("queue error: {0}")]
    Queue(#[from] crate::services::queue::QueueError),
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unreachable(e) => ApiError::ProviderUnreachable(e),
            ProviderError::Rejected { status, body } => ApiError::ProviderRejected { status, body },
        }
    }
}

impl From<crate::services::poller::TrackError> for ApiError {
    fn from(err: crate::services::poller::TrackError) -> Self {
        match err {
            crate::services::poller::TrackError::TimedOut(_) => ApiError::TrackingTimedOut,
            crate::services::poller::TrackError::Provider(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::InvalidInput(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "InvalidInput", "message": message }),
            ),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": "NotFound" }),
            ),
            ApiError::ProviderRejected { status, body } => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "ProviderRejected", "provider_status": status, "details": body }),
            ),
            ApiError::ProviderUnreachable(source) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "ProviderUnreachable", "message": source.to_string() }),
            ),
            ApiError::TrackingTimedOut => (
                StatusCode::GATEWAY_TIMEOUT,
                json!({ "error": "TrackingTimedOut" }),
            ),
            ApiError::Database(_) | ApiError::Queue(_) => {
                tracing::error!(error = %self, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "InternalError" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
