use scan_relay::{
    config::AppConfig,
    db::{self, queries},
    models::job::{InputSource, JobStatus, NewScanJob, Provider, ScanKind},
    services::{
        normalize,
        poller::PollPolicy,
        queue::{TrackingQueue, TrackingTask},
        scan_id::ScanIdGenerator,
    },
};
use serde_json::json;
use std::time::Duration;

/// Integration test: full job lifecycle against live infrastructure
///
/// This test verifies the complete integration:
/// 1. Database connection and schema
/// 2. Job creation and retrieval
/// 3. The submitted -> polling -> completed lifecycle
/// 4. The at-most-once terminal write
/// 5. Tracking queue (enqueue/dequeue/complete)
///
/// Note: This requires a running PostgreSQL and Redis instance
/// configured via environment variables.
#[tokio::test]
#[ignore] // Run with: cargo test --test integration_test -- --ignored
async fn test_full_job_lifecycle() {
    let config = AppConfig::from_env().expect("Failed to load config");

    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations");

    let queue = TrackingQueue::new(&config.redis_url).expect("Failed to initialize queue");
    let scan_ids = ScanIdGenerator::new();

    // 1. Create a submitted job
    let local_id = scan_ids.next_id();
    let new_job = NewScanJob {
        local_id: local_id.clone(),
        external_id: Some("aai-test-1".to_string()),
        provider: Provider::Assemblyai,
        kind: ScanKind::Transcript,
        source: InputSource::Url,
        input_url: Some("https://example.com/audio.mp3".to_string()),
        original_filename: None,
    };

    let job = queries::create_job(&db_pool, &new_job)
        .await
        .expect("Failed to create job");

    assert_eq!(job.local_id, local_id);
    assert_eq!(job.status, JobStatus::Submitted);
    assert!(job.normalized_result.is_none());

    // 2. Retrieve it by local id
    let fetched = queries::get_job_by_local_id(&db_pool, &local_id)
        .await
        .expect("Failed to get job")
        .expect("Job not found");

    assert_eq!(fetched.id, job.id);
    assert_eq!(fetched.provider, Provider::Assemblyai);

    // 3. Queue round-trip
    let task = TrackingTask {
        local_id: local_id.clone(),
        provider: Provider::Assemblyai,
        external_id: "aai-test-1".to_string(),
        result_url: None,
    };

    queue.enqueue(&task).await.expect("Failed to enqueue");
    let dequeued = queue
        .dequeue()
        .await
        .expect("Failed to dequeue")
        .expect("No task in queue");
    assert_eq!(dequeued, task);

    // 4. Worker marks the job polling
    queries::mark_polling(&db_pool, &local_id)
        .await
        .expect("Failed to mark polling");

    let polling = queries::get_job_by_local_id(&db_pool, &local_id)
        .await
        .expect("Failed to get job")
        .expect("Job not found");
    assert_eq!(polling.status, JobStatus::Polling);

    // 5. Terminal write with a normalized result
    let payload = json!({ "status": "completed", "text": "hello", "confidence": 0.97 });
    let normalized = normalize::to_json(&normalize::transcript_from_payload(&payload));

    let wrote = queries::complete_job(
        &db_pool,
        &local_id,
        JobStatus::Completed,
        Some("aai-test-1"),
        Some(&payload),
        Some(&normalized),
        None,
    )
    .await
    .expect("Failed to complete job");
    assert!(wrote);

    // 6. A second terminal write must be a no-op (duplicate delivery)
    let wrote_again = queries::complete_job(
        &db_pool,
        &local_id,
        JobStatus::Error,
        None,
        None,
        None,
        Some("late delivery"),
    )
    .await
    .expect("Failed to run duplicate completion");
    assert!(!wrote_again);

    // 7. Read back: scalars survive the store round-trip
    let terminal = queries::get_job_by_local_id(&db_pool, &local_id)
        .await
        .expect("Failed to get job")
        .expect("Job not found");

    assert_eq!(terminal.status, JobStatus::Completed);
    assert!(terminal.completed_at.is_some());
    let stored = terminal.normalized_result.expect("No normalized result");
    assert_eq!(stored["text"], json!("hello"));
    assert_eq!(stored["confidence"], json!(0.97));
    assert_eq!(terminal.raw_result.expect("No raw result"), payload);

    queue
        .complete(&dequeued)
        .await
        .expect("Failed to complete task in queue");
}

/// The store-facing JSON view of a normalized record loses nothing.
#[test]
fn test_normalized_record_json_roundtrip() {
    let payload = json!({
        "status": "completed",
        "text": "round trip",
        "confidence": 0.935,
        "audio_duration": 42.5,
    });

    let summary = normalize::transcript_from_payload(&payload);
    let as_json = normalize::to_json(&summary);
    let back: scan_relay::models::summary::TranscriptSummary =
        serde_json::from_value(as_json).expect("Failed to decode normalized record");

    assert_eq!(back, summary);
}

/// Scenario: completed webhook with AI scores lands as a normalized record.
#[test]
fn test_webhook_scores_normalization() {
    let additional = json!({ "summary": { "Ai": 0.82, "Human": 0.18 } });
    let payload = json!({
        "notifications": {
            "alerts": [{
                "code": "suspected-ai-text",
                "additionalData": additional.to_string(),
            }]
        }
    });

    let summary = normalize::ai_text_from_webhook(&payload);
    assert_eq!(summary.overall_ai_score, Some(0.82));
    assert_eq!(summary.overall_human_score, Some(0.18));

    // Absent alert: all score fields null, record still representable.
    let empty = normalize::ai_text_from_webhook(&json!({}));
    assert_eq!(empty.overall_ai_score, None);
    assert_eq!(normalize::to_json(&empty)["overall_ai_score"], json!(null));
}

/// The poll budget bounds the number of status fetches.
#[test]
fn test_poll_budget_bounds_fetches() {
    let policy = PollPolicy::fixed(Duration::from_secs(2), Duration::from_secs(600));
    assert_eq!(policy.max_fetches(), 300);

    let uneven = PollPolicy::fixed(Duration::from_secs(7), Duration::from_secs(60));
    assert_eq!(uneven.max_fetches(), 9); // ceil(60 / 7)
}

/// Local ids are unique for the lifetime of the generator.
#[test]
fn test_local_ids_never_reused() {
    let generator = ScanIdGenerator::new();
    let first = generator.next_id();
    let second = generator.next_id();
    assert_ne!(first, second);
    assert!(first.starts_with("scan-"));
}
