use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app_state::AppState;
use crate::db::queries;
use crate::error::ApiError;
use crate::models::api::SubmitResponse;
use crate::models::job::{InputSource, NewScanJob, Provider, ScanKind};
use crate::routes::is_http_url;
use crate::services::assemblyai::TranscriptOptions;
use crate::services::queue::TrackingTask;

/// Which transcription backend a submission targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TranscriptProvider {
    AssemblyAi,
    Gladia,
}

/// Fields accepted by the transcript submission form.
#[derive(Debug, Default)]
struct TranscriptForm {
    audio: Option<(String, Vec<u8>)>,
    audio_url: Option<String>,
    provider: Option<String>,
    speaker_labels: bool,
    speakers_expected: Option<u32>,
}

/// The audio input after the exactly-one-of rule has been applied.
#[derive(Debug)]
enum AudioInput {
    Url(String),
    Upload { filename: String, bytes: Vec<u8> },
}

async fn text_field(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|_| ApiError::InvalidInput("failed to read form field".to_string()))
}

async fn read_form(multipart: &mut Multipart) -> Result<TranscriptForm, ApiError> {
    let mut form = TranscriptForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::InvalidInput("malformed multipart body".to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio") => {
                let filename = field.file_name().unwrap_or("audio").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::InvalidInput("failed to read audio field".to_string()))?;
                form.audio = Some((filename, data.to_vec()));
            }
            Some("audio_url") => form.audio_url = Some(text_field(field).await?),
            Some("provider") => form.provider = Some(text_field(field).await?),
            Some("speaker_labels") => form.speaker_labels = text_field(field).await? == "true",
            Some("speakers_expected") => {
                form.speakers_expected = text_field(field).await?.parse().ok()
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Exactly one of {remote URL, uploaded blob} must be present.
fn resolve_audio_input(
    audio: Option<(String, Vec<u8>)>,
    audio_url: Option<String>,
) -> Result<AudioInput, ApiError> {
    match (audio, audio_url) {
        (Some(_), Some(_)) => Err(ApiError::InvalidInput(
            "provide either an audio file or audio_url, not both".to_string(),
        )),
        (Some((filename, bytes)), None) => Ok(AudioInput::Upload { filename, bytes }),
        (None, Some(url)) if is_http_url(&url) => Ok(AudioInput::Url(url)),
        (None, Some(_)) => Err(ApiError::InvalidInput(
            "audio_url must be an http(s) URL".to_string(),
        )),
        (None, None) => Err(ApiError::InvalidInput(
            "provide an audio file or audio_url".to_string(),
        )),
    }
}

/// POST /api/v1/transcripts — submit audio for transcription.
///
/// Multipart form: `audio` (file) or `audio_url` (text), plus optional
/// `provider` ("assemblyai", default, or "gladia"), `speaker_labels`
/// and `speakers_expected`. Returns 202 immediately; completion is
/// tracked by the worker and served by the jobs endpoint.
pub async fn submit_transcript(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let form = read_form(&mut multipart).await?;

    let provider = match form.provider.as_deref() {
        None | Some("assemblyai") => TranscriptProvider::AssemblyAi,
        Some("gladia") => TranscriptProvider::Gladia,
        Some(other) => {
            return Err(ApiError::InvalidInput(format!(
                "unknown transcription provider {other:?}"
            )))
        }
    };
    let input = resolve_audio_input(form.audio, form.audio_url)?;

    let local_id = state.scan_ids.next_id();

    let (new_job, task) = match provider {
        TranscriptProvider::AssemblyAi => {
            let (audio_url, source, original_filename) = match input {
                AudioInput::Url(url) => (url, InputSource::Url, None),
                AudioInput::Upload { filename, bytes } => {
                    let upload_url = state.assemblyai.upload_audio(bytes).await?;
                    (upload_url, InputSource::Upload, Some(filename))
                }
            };

            let options = TranscriptOptions {
                speaker_labels: form.speaker_labels,
                speakers_expected: form.speakers_expected,
            };
            let created = state.assemblyai.create_transcript(&audio_url, &options).await?;

            let new_job = NewScanJob {
                local_id: local_id.clone(),
                external_id: Some(created.id.clone()),
                provider: Provider::Assemblyai,
                kind: ScanKind::Transcript,
                source,
                input_url: Some(audio_url),
                original_filename,
            };
            let task = TrackingTask {
                local_id: local_id.clone(),
                provider: Provider::Assemblyai,
                external_id: created.id,
                result_url: None,
            };
            (new_job, task)
        }
        TranscriptProvider::Gladia => {
            let AudioInput::Url(audio_url) = input else {
                return Err(ApiError::InvalidInput(
                    "gladia transcription accepts only audio_url".to_string(),
                ));
            };

            let created = state.gladia.create_job(&audio_url).await?;

            let new_job = NewScanJob {
                local_id: local_id.clone(),
                external_id: Some(created.id.clone()),
                provider: Provider::Gladia,
                kind: ScanKind::Transcript,
                source: InputSource::Url,
                input_url: Some(audio_url),
                original_filename: None,
            };
            let task = TrackingTask {
                local_id: local_id.clone(),
                provider: Provider::Gladia,
                external_id: created.id,
                result_url: Some(created.result_url),
            };
            (new_job, task)
        }
    };

    let job = queries::create_job(&state.db, &new_job).await?;
    state.queue.enqueue(&task).await?;

    metrics::counter!("scan_jobs_submitted_total", "kind" => "transcript").increment(1);
    tracing::info!(
        local_id = %job.local_id,
        external_id = job.external_id.as_deref().unwrap_or(""),
        provider = %job.provider,
        "transcription job submitted"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            local_id: job.local_id.clone(),
            external_id: job.external_id.clone(),
            status: job.status,
            message: "transcription submitted; poll the jobs endpoint for results".to_string(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_is_rejected() {
        let result = resolve_audio_input(None, None);
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn both_inputs_are_rejected() {
        let result = resolve_audio_input(
            Some(("a.mp3".to_string(), vec![1, 2, 3])),
            Some("https://example.com/a.mp3".to_string()),
        );
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn non_http_url_is_rejected() {
        let result = resolve_audio_input(None, Some("ftp://example.com/a.mp3".to_string()));
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn url_input_is_accepted() {
        let result = resolve_audio_input(None, Some("https://example.com/a.mp3".to_string()));
        assert!(matches!(result, Ok(AudioInput::Url(_))));
    }

    #[test]
    fn upload_input_is_accepted() {
        let result = resolve_audio_input(Some(("a.mp3".to_string(), vec![1, 2, 3])), None);
        assert!(matches!(result, Ok(AudioInput::Upload { .. })));
    }
}
