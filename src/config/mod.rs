use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:4000"). Optional for worker processes.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string for the tracking queue
    pub redis_url: String,

    /// AssemblyAI API key
    pub assemblyai_api_key: String,

    /// Gladia API key
    pub gladia_api_key: String,

    /// Copyleaks account email
    pub copyleaks_email: String,

    /// Copyleaks API key
    pub copyleaks_api_key: String,

    /// Externally reachable base URL for the AI-text status webhook,
    /// e.g. "https://relay.example.com/api/v1/ai-text/webhook"
    #[serde(default = "default_webhook_base")]
    pub copyleaks_webhook_base: String,

    /// Sightengine API user
    pub sightengine_user: String,

    /// Sightengine API secret
    pub sightengine_secret: String,

    /// GDPR validator API base URL
    #[serde(default = "default_gdpr_api_base")]
    pub gdpr_api_base: String,

    /// Base wait between status fetches, in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Wall-clock tracking budget for transcription jobs, in seconds
    #[serde(default = "default_poll_deadline_secs")]
    pub poll_deadline_secs: u64,

    /// Gladia results land quickly; they get a shorter budget
    #[serde(default = "default_gladia_poll_deadline_secs")]
    pub gladia_poll_deadline_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:4000".to_string()
}

fn default_webhook_base() -> String {
    "http://localhost:4000/api/v1/ai-text/webhook".to_string()
}

fn default_gdpr_api_base() -> String {
    "https://www.gdprvalidator.eu/api/v1".to_string()
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_poll_deadline_secs() -> u64 {
    600
}

fn default_gladia_poll_deadline_secs() -> u64 {
    60
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
