//! Configuration module for loading environment variables and settings.

use crate::auth::{ApiKey, API_KEY_ENV};
use crate::error::ConfigError;

/// Default Black Forest Labs API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.bfl.ai/v1";

/// Default delay before the first status query, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Default cap on the delay between status queries, in milliseconds.
pub const DEFAULT_POLL_MAX_INTERVAL_MS: u64 = 4000;

/// Default polling ceiling, in seconds.
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 120;

/// Default timeout for a single HTTP request, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Black Forest Labs API key. Checked per call, not at startup.
    pub api_key: Option<ApiKey>,
    /// Base URL of the generation service
    pub api_base_url: String,
    /// Delay before the first status query
    pub poll_interval_ms: u64,
    /// Upper bound for the backoff delay between status queries
    pub poll_max_interval_ms: u64,
    /// Overall wall-clock ceiling for polling one job
    pub poll_timeout_secs: u64,
    /// Timeout applied to each individual HTTP request
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            poll_max_interval_ms: DEFAULT_POLL_MAX_INTERVAL_MS,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables and .env files.
    ///
    /// `.env` in the working directory is read first, then `config/.env`.
    /// Variables already present in the process environment win.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` if a numeric setting does not parse
    /// or the polling intervals are inconsistent.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Both files are optional
        let _ = dotenvy::dotenv();
        let _ = dotenvy::from_path("config/.env");

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    /// Same as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_ENV).and_then(ApiKey::new);

        let api_base_url = lookup("BFL_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let poll_interval_ms =
            parse_var(&lookup, "FLUX_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?;
        let poll_max_interval_ms =
            parse_var(&lookup, "FLUX_POLL_MAX_INTERVAL_MS", DEFAULT_POLL_MAX_INTERVAL_MS)?;
        let poll_timeout_secs =
            parse_var(&lookup, "FLUX_POLL_TIMEOUT_SECS", DEFAULT_POLL_TIMEOUT_SECS)?;
        let request_timeout_secs =
            parse_var(&lookup, "FLUX_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;

        if poll_interval_ms == 0 {
            return Err(ConfigError::invalid_value(
                "FLUX_POLL_INTERVAL_MS",
                "must be greater than zero",
            ));
        }
        if poll_max_interval_ms < poll_interval_ms {
            return Err(ConfigError::invalid_value(
                "FLUX_POLL_MAX_INTERVAL_MS",
                format!("must be at least FLUX_POLL_INTERVAL_MS ({})", poll_interval_ms),
            ));
        }
        if poll_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "FLUX_POLL_TIMEOUT_SECS",
                "must be greater than zero",
            ));
        }

        Ok(Self {
            api_key,
            api_base_url,
            poll_interval_ms,
            poll_max_interval_ms,
            poll_timeout_secs,
            request_timeout_secs,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid_value(name, format!("'{}': {}", raw, e))),
        _ => Ok(default),
    }
}
