pub mod assemblyai;
pub mod copyleaks;
pub mod gdpr;
pub mod gladia;
pub mod normalize;
pub mod poller;
pub mod queue;
pub mod scan_id;
pub mod sightengine;
pub mod token_cache;
