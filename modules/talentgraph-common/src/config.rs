use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Upstream identity source
    pub identity_api_url: String,
    pub identity_api_key: String,
    pub identity_timeout_secs: u64,

    // Reconciliation
    pub max_concurrent_fetches: usize,
    pub fetch_pacing_ms: u64,
    pub similarity_threshold: f64,
    pub resolution_cache_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            identity_api_url: env::var("IDENTITY_API_URL")
                .unwrap_or_else(|_| "https://identity.talentgraph.internal".to_string()),
            identity_api_key: required_env("IDENTITY_API_KEY"),
            identity_timeout_secs: parsed_env("IDENTITY_TIMEOUT_SECS", 30),
            max_concurrent_fetches: parsed_env("MAX_CONCURRENT_FETCHES", 3),
            fetch_pacing_ms: parsed_env("FETCH_PACING_MS", 1000),
            similarity_threshold: parsed_env("SIMILARITY_THRESHOLD", 0.85),
            resolution_cache_ttl_secs: parsed_env("RESOLUTION_CACHE_TTL_SECS", 900),
        }
    }

    /// Log the loaded config without secrets.
    pub fn log_redacted(&self) {
        tracing::info!(
            identity_api_url = self.identity_api_url.as_str(),
            max_concurrent_fetches = self.max_concurrent_fetches,
            fetch_pacing_ms = self.fetch_pacing_ms,
            similarity_threshold = self.similarity_threshold,
            "Config loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid number, got {raw:?}")),
        Err(_) => default,
    }
}
