use scan_relay::{
    app_state::AppState,
    config::AppConfig,
    db::{self, queries},
    models::job::{JobStatus, Provider},
    services::{
        assemblyai::AssemblyAiClient,
        copyleaks::CopyleaksClient,
        gdpr::GdprScannerClient,
        gladia::GladiaClient,
        normalize,
        poller::{self, PollPolicy, TrackError, TrackOutcome},
        queue::{TrackingQueue, TrackingTask},
        sightengine::SightengineClient,
    },
};
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

const IDLE_POLL_INTERVAL_MS: u64 = 1000; // 1 second

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting completion tracking worker");

    // Load configuration
    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Initialize database
    tracing::info!("Connecting to PostgreSQL");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Initialize services
    tracing::info!("Initializing services");
    let queue = TrackingQueue::new(&config.redis_url).expect("Failed to initialize tracking queue");

    let assemblyai = AssemblyAiClient::new(&config.assemblyai_api_key);
    let gladia = GladiaClient::new(&config.gladia_api_key);
    let copyleaks = CopyleaksClient::new(
        &config.copyleaks_email,
        &config.copyleaks_api_key,
        &config.copyleaks_webhook_base,
    );
    let sightengine = SightengineClient::new(&config.sightengine_user, &config.sightengine_secret);
    let gdpr = GdprScannerClient::new(&config.gdpr_api_base);

    let state = AppState::new(db_pool, queue, assemblyai, gladia, copyleaks, sightengine, gdpr);

    tracing::info!("Worker ready, starting tracking loop");

    // Main tracking loop
    loop {
        match track_next_job(&state, &config).await {
            Ok(true) => {
                tracing::debug!("Job tracked, checking for next task");
            }
            Ok(false) => {
                tracing::trace!("No tracking tasks available, sleeping");
                sleep(Duration::from_millis(IDLE_POLL_INTERVAL_MS)).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Error tracking job, will continue");
                sleep(Duration::from_millis(IDLE_POLL_INTERVAL_MS)).await;
            }
        }
    }
}

/// Tracking budget per provider. Gladia results land within a minute;
/// transcription at the other provider can take far longer.
fn policy_for(config: &AppConfig, provider: Provider) -> PollPolicy {
    let deadline_secs = match provider {
        Provider::Gladia => config.gladia_poll_deadline_secs,
        _ => config.poll_deadline_secs,
    };

    PollPolicy {
        interval: Duration::from_secs(config.poll_interval_secs),
        deadline: Duration::from_secs(deadline_secs),
        ..PollPolicy::default()
    }
}

/// Track the next queued job to a terminal state.
/// Returns Ok(true) if a task was processed, Ok(false) if none was queued.
async fn track_next_job(
    state: &AppState,
    config: &AppConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let task = match state.queue.dequeue().await? {
        Some(t) => t,
        None => return Ok(false),
    };

    if let Ok(depth) = state.queue.queue_depth().await {
        metrics::gauge!("tracking_queue_depth").set(depth as f64);
    }

    tracing::info!(
        local_id = %task.local_id,
        provider = %task.provider,
        external_id = %task.external_id,
        "Tracking provider job"
    );

    queries::mark_polling(&state.db, &task.local_id).await?;

    let policy = policy_for(config, task.provider);
    let started = std::time::Instant::now();

    let outcome = match task.provider {
        Provider::Assemblyai => {
            poller::track(&policy, || state.assemblyai.probe_transcript(&task.external_id)).await
        }
        Provider::Gladia => match task.result_url.as_deref() {
            Some(result_url) => {
                poller::track(&policy, || state.gladia.probe_result(result_url)).await
            }
            None => Ok(TrackOutcome::Failed(
                "tracking task carries no result_url".to_string(),
            )),
        },
        other => Ok(TrackOutcome::Failed(format!(
            "no poll tracker for provider {other}"
        ))),
    };

    record_outcome(state, &task, outcome, started.elapsed()).await?;

    state.queue.complete(&task).await?;
    Ok(true)
}

/// Persist the terminal state the tracker observed. The normalizer runs
/// only for completed payloads.
async fn record_outcome(
    state: &AppState,
    task: &TrackingTask,
    outcome: Result<TrackOutcome, TrackError>,
    elapsed: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    match outcome {
        Ok(TrackOutcome::Completed(payload)) => {
            let summary = normalize::transcript_from_payload(&payload);
            let normalized = normalize::to_json(&summary);

            let wrote = queries::complete_job(
                &state.db,
                &task.local_id,
                JobStatus::Completed,
                Some(&task.external_id),
                Some(&payload),
                Some(&normalized),
                None,
            )
            .await?;

            if wrote {
                metrics::counter!("scan_jobs_completed_total", "kind" => "transcript").increment(1);
                metrics::histogram!("scan_tracking_seconds").record(elapsed.as_secs_f64());
                tracing::info!(
                    local_id = %task.local_id,
                    tracking_secs = elapsed.as_secs(),
                    confidence = summary.confidence,
                    "Job completed"
                );
            } else {
                tracing::warn!(
                    local_id = %task.local_id,
                    "Job already terminal; completion write skipped"
                );
            }
        }
        Ok(TrackOutcome::Failed(message)) => {
            queries::complete_job(
                &state.db,
                &task.local_id,
                JobStatus::Error,
                Some(&task.external_id),
                None,
                None,
                Some(&message),
            )
            .await?;

            metrics::counter!("scan_jobs_failed_total").increment(1);
            tracing::warn!(local_id = %task.local_id, error = %message, "Job failed at provider");
        }
        Err(TrackError::TimedOut(deadline)) => {
            queries::complete_job(
                &state.db,
                &task.local_id,
                JobStatus::TimedOut,
                Some(&task.external_id),
                None,
                None,
                Some(&format!("no terminal state within {}s", deadline.as_secs())),
            )
            .await?;

            metrics::counter!("scan_jobs_timed_out_total").increment(1);
            tracing::warn!(
                local_id = %task.local_id,
                deadline_secs = deadline.as_secs(),
                "Job abandoned at tracking deadline"
            );
        }
        Err(TrackError::Provider(e)) => {
            queries::complete_job(
                &state.db,
                &task.local_id,
                JobStatus::Error,
                Some(&task.external_id),
                None,
                None,
                Some(&e.to_string()),
            )
            .await?;

            metrics::counter!("scan_jobs_failed_total").increment(1);
            tracing::error!(local_id = %task.local_id, error = %e, "Status fetch failed");
        }
    }

    Ok(())
}
