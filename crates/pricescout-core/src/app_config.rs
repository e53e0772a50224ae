use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Optional YAML file replacing the built-in region catalog.
    pub regions_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub source_timeout_secs: u64,
    /// Overall search deadline. `0` disables it.
    pub search_deadline_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Upper bound of the random delay inserted before each source request.
    pub request_jitter_ms: u64,
    pub max_results_limit: usize,
    pub serpapi_api_key: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("regions_path", &self.regions_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("source_timeout_secs", &self.source_timeout_secs)
            .field("search_deadline_secs", &self.search_deadline_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("request_jitter_ms", &self.request_jitter_ms)
            .field("max_results_limit", &self.max_results_limit)
            .field(
                "serpapi_api_key",
                &self.serpapi_api_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
