mod app_state;
mod config;
mod db;
mod error;
mod models;
mod routes;
mod services;

use axum::extract::DefaultBodyLimit;
use axum::{routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::AppConfig;
use services::{
    assemblyai::AssemblyAiClient,
    copyleaks::CopyleaksClient,
    gdpr::GdprScannerClient,
    gladia::GladiaClient,
    queue::TrackingQueue,
    sightengine::SightengineClient,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing scan-relay server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!(
        "scan_jobs_submitted_total",
        "Total analysis jobs submitted to external providers"
    );
    metrics::describe_counter!(
        "scan_jobs_completed_total",
        "Total analysis jobs that reached completed"
    );
    metrics::describe_counter!(
        "scan_jobs_failed_total",
        "Total analysis jobs that ended in a provider error"
    );
    metrics::describe_counter!(
        "scan_jobs_timed_out_total",
        "Total analysis jobs abandoned at the tracking deadline"
    );
    metrics::describe_histogram!(
        "scan_tracking_seconds",
        "Time from dequeue to terminal state for tracked jobs"
    );
    metrics::describe_gauge!(
        "tracking_queue_depth",
        "Current number of tracking tasks awaiting a worker"
    );

    // Initialize database connection pool
    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run database migrations
    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Initialize Redis tracking queue
    tracing::info!("Connecting to Redis tracking queue");
    let queue = TrackingQueue::new(&config.redis_url).expect("Failed to initialize tracking queue");

    // Initialize provider clients
    tracing::info!("Initializing provider clients");
    let assemblyai = AssemblyAiClient::new(&config.assemblyai_api_key);
    let gladia = GladiaClient::new(&config.gladia_api_key);
    let copyleaks = CopyleaksClient::new(
        &config.copyleaks_email,
        &config.copyleaks_api_key,
        &config.copyleaks_webhook_base,
    );
    let sightengine = SightengineClient::new(&config.sightengine_user, &config.sightengine_secret);
    let gdpr = GdprScannerClient::new(&config.gdpr_api_base);

    // Create shared application state
    let state = AppState::new(db_pool, queue, assemblyai, gladia, copyleaks, sightengine, gdpr);

    // Build API routes
    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/v1/transcripts", post(routes::transcripts::submit_transcript))
        .route("/api/v1/jobs", get(routes::jobs::list_jobs))
        .route("/api/v1/jobs/{local_id}", get(routes::jobs::get_job))
        .route("/api/v1/ai-text/scans", post(routes::ai_text::submit_scan))
        .route("/api/v1/ai-text/check", post(routes::ai_text::writer_check))
        .route(
            "/api/v1/ai-text/webhook/status/{status}/{local_id}",
            post(routes::ai_text::status_webhook),
        )
        .route("/api/v1/deepfake", post(routes::deepfake::analyze))
        .route("/api/v1/gdpr/scans", post(routes::gdpr::scan))
        .with_state(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024)); // 10 MB limit

    tracing::info!("Starting scan-relay on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
