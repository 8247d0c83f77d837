use sqlx::PgPool;
use std::sync::Arc;

use crate::services::{
    assemblyai::AssemblyAiClient,
    copyleaks::CopyleaksClient,
    gdpr::GdprScannerClient,
    gladia::GladiaClient,
    queue::TrackingQueue,
    scan_id::ScanIdGenerator,
    sightengine::SightengineClient,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub queue: Arc<TrackingQueue>,
    pub scan_ids: Arc<ScanIdGenerator>,
    pub assemblyai: Arc<AssemblyAiClient>,
    pub gladia: Arc<GladiaClient>,
    pub copyleaks: Arc<CopyleaksClient>,
    pub sightengine: Arc<SightengineClient>,
    pub gdpr: Arc<GdprScannerClient>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: PgPool,
        queue: TrackingQueue,
        assemblyai: AssemblyAiClient,
        gladia: GladiaClient,
        copyleaks: CopyleaksClient,
        sightengine: SightengineClient,
        gdpr: GdprScannerClient,
    ) -> Self {
        Self {
            db,
            queue: Arc::new(queue),
            scan_ids: Arc::new(ScanIdGenerator::new()),
            assemblyai: Arc::new(assemblyai),
            gladia: Arc::new(gladia),
            copyleaks: Arc::new(copyleaks),
            sightengine: Arc::new(sightengine),
            gdpr: Arc::new(gdpr),
        }
    }
}
