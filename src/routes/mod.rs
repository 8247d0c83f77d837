pub mod ai_text;
pub mod deepfake;
pub mod gdpr;
pub mod health;
pub mod jobs;
pub mod metrics;
pub mod transcripts;

/// Accept only absolute http/https URLs as remote inputs.
pub(crate) fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty())
}
