use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub(crate) const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a usable
/// development config. Decoupled from the real environment so tests can use a
/// plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("PRICESCOUT_ENV", "development"));

    let bind_addr = or_default("PRICESCOUT_BIND_ADDR", "0.0.0.0:8000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("PRICESCOUT_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("PRICESCOUT_LOG_LEVEL", "info");
    let regions_path = lookup("PRICESCOUT_REGIONS_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);

    let request_timeout_secs = parse_u64("PRICESCOUT_REQUEST_TIMEOUT_SECS", "15")?;
    let source_timeout_secs = parse_u64("PRICESCOUT_SOURCE_TIMEOUT_SECS", "25")?;
    let search_deadline_secs = parse_u64("PRICESCOUT_SEARCH_DEADLINE_SECS", "40")?;
    let user_agent = or_default("PRICESCOUT_USER_AGENT", DEFAULT_USER_AGENT);
    let max_retries = parse_u32("PRICESCOUT_MAX_RETRIES", "1")?;
    let retry_backoff_base_ms = parse_u64("PRICESCOUT_RETRY_BACKOFF_BASE_MS", "500")?;
    let request_jitter_ms = parse_u64("PRICESCOUT_REQUEST_JITTER_MS", "0")?;
    let max_results_limit = parse_usize("PRICESCOUT_MAX_RESULTS_LIMIT", "20")?;
    let serpapi_api_key = lookup("SERPAPI_API_KEY")
        .ok()
        .filter(|s| !s.trim().is_empty());

    if source_timeout_secs == 0 {
        return Err(invalid(
            "PRICESCOUT_SOURCE_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    if max_results_limit == 0 {
        return Err(invalid(
            "PRICESCOUT_MAX_RESULTS_LIMIT",
            "must be greater than zero".to_string(),
        ));
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        regions_path,
        request_timeout_secs,
        source_timeout_secs,
        search_deadline_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        request_jitter_ms,
        max_results_limit,
        serpapi_api_key,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

/// Defaults with no environment at all, for tests elsewhere in the crate.
#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    build_app_config(|_| Err(std::env::VarError::NotPresent)).expect("defaults are valid")
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
