//! Extraction of the few product-facing fields from provider payloads.
//!
//! Every function here is pure and total: absent or malformed fields degrade
//! to nulls/defaults instead of failing, so a completed job is always
//! recordable. The raw payload is persisted alongside the normalized view,
//! so fields can be re-derived later if an extraction was wrong at write time.

use serde::Serialize;
use serde_json::Value;

use crate::models::summary::{AiTextSummary, DeepfakeSummary, GdprSummary, TranscriptSummary};

/// Alert code the AI-text provider uses for its detection verdict.
const AI_ALERT_CODE: &str = "suspected-ai-text";

/// Round a 0..1 probability to a percentage with one decimal.
pub fn to_percentage(score: f64) -> f64 {
    (score * 1000.0).round() / 10.0
}

/// Serialize a summary for the JSONB column.
pub fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Extract AI/human scores from a completed scan webhook payload.
///
/// The verdict travels as an alert whose `additionalData` field is a JSON
/// document transported as a string. A missing alert, unparsable
/// `additionalData` or absent `summary.Ai` all yield null scores.
pub fn ai_text_from_webhook(payload: &Value) -> AiTextSummary {
    let alert = payload
        .pointer("/notifications/alerts")
        .and_then(Value::as_array)
        .and_then(|alerts| {
            alerts
                .iter()
                .find(|a| a.get("code").and_then(Value::as_str) == Some(AI_ALERT_CODE))
        });

    let additional = alert
        .and_then(|a| a.get("additionalData"))
        .and_then(Value::as_str)
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok());

    let summary = additional.as_ref().and_then(|a| a.get("summary"));
    let ai = summary.and_then(|s| s.get("Ai")).and_then(Value::as_f64);
    let human = summary
        .and_then(|s| s.get("Human"))
        .and_then(Value::as_f64)
        .or(ai.map(|v| 1.0 - v));

    AiTextSummary {
        overall_ai_score: ai,
        overall_human_score: human,
        ai_percentage: ai.map(to_percentage),
    }
}

/// The synchronous writer-detector response carries `summary.ai` directly.
pub fn ai_text_from_writer_check(payload: &Value) -> AiTextSummary {
    let ai = payload.pointer("/summary/ai").and_then(Value::as_f64);
    AiTextSummary {
        overall_ai_score: ai,
        overall_human_score: ai.map(|v| 1.0 - v),
        ai_percentage: ai.map(to_percentage),
    }
}

/// Extract transcript fields from either transcription provider's payload.
pub fn transcript_from_payload(payload: &Value) -> TranscriptSummary {
    let text = payload
        .get("text")
        .and_then(Value::as_str)
        // Gladia nests the transcript under result.transcription
        .or_else(|| {
            payload
                .pointer("/result/transcription/full_transcript")
                .and_then(Value::as_str)
        })
        .map(str::to_string);

    let audio_duration = payload
        .get("audio_duration")
        .and_then(Value::as_f64)
        .or_else(|| {
            payload
                .pointer("/result/metadata/audio_duration")
                .and_then(Value::as_f64)
        });

    TranscriptSummary {
        status: payload.get("status").and_then(Value::as_str).map(str::to_string),
        text,
        confidence: payload.get("confidence").and_then(Value::as_f64),
        audio_duration,
        summary: payload.get("summary").and_then(Value::as_str).map(str::to_string),
    }
}

/// Map the deepfake score onto the product's buckets.
pub fn deepfake_from_payload(payload: &Value) -> DeepfakeSummary {
    let score = payload.pointer("/type/deepfake").and_then(Value::as_f64);
    let percentage = score.map(to_percentage);

    let label = match percentage {
        None => "No face detected",
        Some(p) if p < 20.0 => "Likely real media",
        Some(p) if p < 60.0 => "Uncertain / needs review",
        Some(_) => "Likely deepfake",
    };

    DeepfakeSummary {
        score,
        percentage,
        label: label.to_string(),
    }
}

/// Extract GDPR findings with defensive defaults.
pub fn gdpr_from_payload(payload: &Value) -> GdprSummary {
    GdprSummary {
        score: payload.get("score").and_then(Value::as_f64).unwrap_or(0.0),
        ssl_secure: payload
            .get("sslSecure")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        privacy_policy_found: payload
            .get("privacyPolicyFound")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        cookie_banner_found: payload
            .get("cookieBannerFound")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn webhook_payload(ai: f64, human: f64) -> Value {
        let additional = json!({ "summary": { "Ai": ai, "Human": human } });
        json!({
            "notifications": {
                "alerts": [
                    { "code": "other-alert", "additionalData": "{}" },
                    {
                        "code": "suspected-ai-text",
                        "additionalData": additional.to_string(),
                    }
                ]
            }
        })
    }

    #[test]
    fn ai_scores_extracted_from_alert() {
        let summary = ai_text_from_webhook(&webhook_payload(0.82, 0.18));
        assert_eq!(summary.overall_ai_score, Some(0.82));
        assert_eq!(summary.overall_human_score, Some(0.18));
        assert_eq!(summary.ai_percentage, Some(82.0));
    }

    #[test]
    fn missing_alert_degrades_to_nulls() {
        let payload = json!({ "notifications": { "alerts": [] } });
        let summary = ai_text_from_webhook(&payload);
        assert_eq!(summary.overall_ai_score, None);
        assert_eq!(summary.overall_human_score, None);
        assert_eq!(summary.ai_percentage, None);
    }

    #[test]
    fn empty_payload_degrades_to_nulls() {
        let summary = ai_text_from_webhook(&json!({}));
        assert_eq!(summary.overall_ai_score, None);
    }

    #[test]
    fn unparsable_additional_data_degrades_to_nulls() {
        let payload = json!({
            "notifications": {
                "alerts": [
                    { "code": "suspected-ai-text", "additionalData": "not json" }
                ]
            }
        });
        let summary = ai_text_from_webhook(&payload);
        assert_eq!(summary.overall_ai_score, None);
    }

    #[test]
    fn human_score_defaults_to_complement() {
        let additional = json!({ "summary": { "Ai": 0.75 } });
        let payload = json!({
            "notifications": {
                "alerts": [
                    { "code": "suspected-ai-text", "additionalData": additional.to_string() }
                ]
            }
        });
        let summary = ai_text_from_webhook(&payload);
        assert_eq!(summary.overall_ai_score, Some(0.75));
        assert_eq!(summary.overall_human_score, Some(0.25));
    }

    #[test]
    fn normalization_is_idempotent() {
        let payload = webhook_payload(0.6, 0.4);
        assert_eq!(ai_text_from_webhook(&payload), ai_text_from_webhook(&payload));
    }

    #[test]
    fn writer_check_reads_summary_ai() {
        let payload = json!({ "summary": { "ai": 0.91 }, "sections": [] });
        let summary = ai_text_from_writer_check(&payload);
        assert_eq!(summary.overall_ai_score, Some(0.91));
        assert_eq!(summary.ai_percentage, Some(91.0));
        let human = summary.overall_human_score.unwrap();
        assert!((human - 0.09).abs() < 1e-9);
    }

    #[test]
    fn transcript_fields_from_assemblyai_payload() {
        let payload = json!({
            "status": "completed",
            "text": "hello",
            "confidence": 0.97,
            "audio_duration": 12.5,
            "summary": "- greeting",
        });
        let summary = transcript_from_payload(&payload);
        assert_eq!(summary.text.as_deref(), Some("hello"));
        assert_eq!(summary.confidence, Some(0.97));
        assert_eq!(summary.audio_duration, Some(12.5));
        assert_eq!(summary.summary.as_deref(), Some("- greeting"));
    }

    #[test]
    fn transcript_fields_from_gladia_payload() {
        let payload = json!({
            "status": "done",
            "result": {
                "transcription": { "full_transcript": "bonjour" },
                "metadata": { "audio_duration": 3.2 },
            }
        });
        let summary = transcript_from_payload(&payload);
        assert_eq!(summary.text.as_deref(), Some("bonjour"));
        assert_eq!(summary.audio_duration, Some(3.2));
        assert_eq!(summary.confidence, None);
    }

    #[test]
    fn deepfake_label_buckets() {
        let verdict = |score: f64| deepfake_from_payload(&json!({ "type": { "deepfake": score } }));

        assert_eq!(verdict(0.05).label, "Likely real media");
        assert_eq!(verdict(0.2).label, "Uncertain / needs review");
        assert_eq!(verdict(0.42).label, "Uncertain / needs review");
        assert_eq!(verdict(0.6).label, "Likely deepfake");
        assert_eq!(verdict(0.97).label, "Likely deepfake");

        let no_face = deepfake_from_payload(&json!({ "status": "success" }));
        assert_eq!(no_face.label, "No face detected");
        assert_eq!(no_face.score, None);
        assert_eq!(no_face.percentage, None);
    }

    #[test]
    fn percentage_rounds_to_one_decimal() {
        assert_eq!(to_percentage(0.82), 82.0);
        assert_eq!(to_percentage(0.8251), 82.5);
        assert_eq!(to_percentage(0.82549), 82.5);
        assert_eq!(to_percentage(0.0), 0.0);
        assert_eq!(to_percentage(1.0), 100.0);
    }

    #[test]
    fn gdpr_defaults_when_fields_absent() {
        let summary = gdpr_from_payload(&json!({}));
        assert_eq!(summary.score, 0.0);
        assert!(!summary.ssl_secure);
        assert!(!summary.privacy_policy_found);
        assert!(!summary.cookie_banner_found);
    }

    #[test]
    fn gdpr_reads_reported_fields() {
        let payload = json!({
            "score": 87.5,
            "sslSecure": true,
            "privacyPolicyFound": true,
            "cookieBannerFound": false,
        });
        let summary = gdpr_from_payload(&payload);
        assert_eq!(summary.score, 87.5);
        assert!(summary.ssl_secure);
        assert!(summary.privacy_policy_found);
        assert!(!summary.cookie_banner_found);
    }
}
