use serde::{Deserialize, Serialize};

/// Normalized view of a completed transcription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSummary {
    pub status: Option<String>,
    pub text: Option<String>,
    pub confidence: Option<f64>,
    pub audio_duration: Option<f64>,
    pub summary: Option<String>,
}

/// Normalized AI-text detection scores. All fields stay null when the
/// provider payload carries no usable verdict; the record is kept anyway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiTextSummary {
    /// Probability the text is AI-generated, 0..1.
    pub overall_ai_score: Option<f64>,
    pub overall_human_score: Option<f64>,
    /// `overall_ai_score` as a percentage rounded to one decimal.
    pub ai_percentage: Option<f64>,
}

/// Normalized deepfake verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepfakeSummary {
    /// Provider confidence that the media is manipulated, 0..1.
    pub score: Option<f64>,
    pub percentage: Option<f64>,
    pub label: String,
}

/// Normalized GDPR compliance findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GdprSummary {
    pub score: f64,
    pub ssl_secure: bool,
    pub privacy_policy_found: bool,
    pub cookie_banner_found: bool,
}
