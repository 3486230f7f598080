//! Runtime configuration loaded from environment variables

use std::env;

/// Default bound on the remote fetch, in seconds
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub sales_api_url: String,
    pub fetch_timeout_secs: u64,
    pub rust_log: String,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    ///
    /// `SALES_API_URL` is required and must be an http(s) URL.
    /// `FETCH_TIMEOUT_SECS` defaults to 10, `RUST_LOG` to "info".
    pub fn from_env() -> Result<Self, ConfigError> {
        let sales_api_url = env::var("SALES_API_URL")
            .map_err(|_| ConfigError::MissingVariable("SALES_API_URL".to_string()))?;

        if !sales_api_url.starts_with("http://") && !sales_api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "SALES_API_URL must start with http:// or https://".to_string(),
            ));
        }

        let fetch_timeout_secs = env::var("FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            sales_api_url,
            fetch_timeout_secs,
            rust_log,
        })
    }
}
