//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CAMPICK_API_URL` - Base URL of the REST backend (e.g., `https://api.campick.in`)
//!
//! ## Optional
//! - `CAMPICK_PUSH_URL` - Server-sent events endpoint (default: `<api>/api/events`)
//! - `CAMPICK_STORAGE_DIR` - Directory for durable client storage (default: `.campick`)
//! - `CAMPICK_CACHE_TTL_SECS` - TTL for cached shop and menu reads (default: 300)
//! - `CAMPICK_HTTP_TIMEOUT_SECS` - Per-request HTTP timeout (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_STORAGE_DIR: &str = ".campick";
const DEFAULT_CACHE_TTL_SECS: &str = "300";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "30";
const DEFAULT_PUSH_PATH: &str = "api/events";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST backend base URL
    pub api_url: Url,
    /// Push notification (SSE) endpoint
    pub push_url: Url,
    /// Directory holding the durable storage file
    pub storage_dir: PathBuf,
    /// TTL for cached public reads (shops, menus)
    pub cache_ttl: Duration,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_url("CAMPICK_API_URL", &get_required_env("CAMPICK_API_URL")?)?;
        let push_url = match get_optional_env("CAMPICK_PUSH_URL") {
            Some(raw) => parse_url("CAMPICK_PUSH_URL", &raw)?,
            None => default_push_url(&api_url)?,
        };
        let storage_dir = PathBuf::from(get_env_or_default(
            "CAMPICK_STORAGE_DIR",
            DEFAULT_STORAGE_DIR,
        ));
        let cache_ttl = parse_secs("CAMPICK_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;
        let http_timeout = parse_secs("CAMPICK_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;

        Ok(Self {
            api_url,
            push_url,
            storage_dir,
            cache_ttl,
            http_timeout,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at `api_url` with every other setting defaulted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_url` is not a valid base URL.
    pub fn for_api(api_url: &str) -> Result<Self, ConfigError> {
        let api_url = parse_url("api_url", api_url)?;
        let push_url = default_push_url(&api_url)?;
        Ok(Self {
            api_url,
            push_url,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            cache_ttl: Duration::from_secs(300),
            http_timeout: Duration::from_secs(30),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }

    /// Path of the durable storage file.
    #[must_use]
    pub fn storage_file(&self) -> PathBuf {
        self.storage_dir.join("storage.json")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a base URL, normalizing it to end with `/` so joins append paths.
fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_push_url(api_url: &Url) -> Result<Url, ConfigError> {
    api_url
        .join(DEFAULT_PUSH_PATH)
        .map_err(|e| ConfigError::InvalidEnvVar("CAMPICK_PUSH_URL".to_string(), e.to_string()))
}

fn parse_secs(key: &str, default: &str) -> Result<Duration, ConfigError> {
    get_env_or_default(key, default)
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
