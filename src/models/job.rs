use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Lifecycle state of an analysis job.
///
/// `submitted` is initial; `completed`, `error` and `timed_out` are terminal
/// and absorbing. The webhook-driven flows never enter `polling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Submitted,
    Polling,
    Completed,
    Error,
    TimedOut,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error | JobStatus::TimedOut)
    }
}

/// Origin of the input payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InputSource {
    Url,
    Upload,
}

/// External provider a job was submitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Provider {
    Assemblyai,
    Gladia,
    Copyleaks,
    Sightengine,
    GdprValidator,
}

/// What kind of analysis a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScanKind {
    Transcript,
    AiTextScan,
    AiTextCheck,
    Deepfake,
    GdprScan,
}

/// One outstanding or completed analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanJob {
    pub id: Uuid,
    /// Identifier minted by this system; embedded in webhook callback URLs.
    pub local_id: String,
    /// Identifier assigned by the provider (absent until known).
    pub external_id: Option<String>,
    pub provider: Provider,
    pub kind: ScanKind,
    pub source: InputSource,
    pub input_url: Option<String>,
    pub original_filename: Option<String>,
    pub status: JobStatus,
    /// Provider payload retained verbatim for audit and re-derivation.
    pub raw_result: Option<serde_json::Value>,
    pub normalized_result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Insert payload for a freshly submitted job row.
#[derive(Debug, Clone)]
pub struct NewScanJob {
    pub local_id: String,
    pub external_id: Option<String>,
    pub provider: Provider,
    pub kind: ScanKind,
    pub source: InputSource,
    pub input_url: Option<String>,
    pub original_filename: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrips_through_strings() {
        for status in [
            JobStatus::Submitted,
            JobStatus::Polling,
            JobStatus::Completed,
            JobStatus::Error,
            JobStatus::TimedOut,
        ] {
            let text = status.to_string();
            assert_eq!(text.parse::<JobStatus>().unwrap(), status);
        }
        assert_eq!(JobStatus::TimedOut.to_string(), "timed_out");
    }

    #[test]
    fn terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(JobStatus::TimedOut.is_terminal());
        assert!(!JobStatus::Submitted.is_terminal());
        assert!(!JobStatus::Polling.is_terminal());
    }

    #[test]
    fn provider_names_match_db_representation() {
        assert_eq!(Provider::GdprValidator.to_string(), "gdpr_validator");
        assert_eq!("assemblyai".parse::<Provider>().unwrap(), Provider::Assemblyai);
    }
}
