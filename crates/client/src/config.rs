//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `HEROOL_API_URL` - Explicit API base URL (overrides the environment)
//! - `HEROOL_ENVIRONMENT` - `local` or `production` (default: production)
//! - `HEROOL_POLL_INTERVAL_MS` - Refresh cadence in milliseconds (default: 8000)
//! - `HEROOL_MAX_CONCURRENT_FETCHES` - Offer fan-out concurrency (default: 4)
//! - `HEROOL_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: transport default)
//! - `HEROOL_SESSION_DIR` - Directory for the persisted session (default: .herool)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Local development API endpoint.
pub const LOCAL_API_URL: &str = "http://localhost:5000/api";

/// Production API endpoint.
pub const PRODUCTION_API_URL: &str = "https://contacta-production.up.railway.app/api";

const DEFAULT_POLL_INTERVAL_MS: u64 = 8000;
const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;
const DEFAULT_SESSION_DIR: &str = ".herool";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which deployment of the remote API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiEnvironment {
    /// Developer machine, API on localhost.
    Local,
    /// Hosted deployment.
    #[default]
    Production,
}

impl ApiEnvironment {
    /// Base URL for this environment.
    #[must_use]
    pub const fn default_base_url(&self) -> &'static str {
        match self {
            Self::Local => LOCAL_API_URL,
            Self::Production => PRODUCTION_API_URL,
        }
    }
}

impl std::str::FromStr for ApiEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "localhost" | "development" | "dev" => Ok(Self::Local),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Remote API connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to (no trailing slash).
    pub base_url: Url,
    /// Environment the base URL was derived from.
    pub environment: ApiEnvironment,
    /// Per-request timeout; `None` leaves it to the transport.
    pub timeout: Option<Duration>,
}

impl ApiConfig {
    /// Settings for an explicit base URL, e.g. a local stub server.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("HEROOL_API_URL", base_url)?,
            environment: ApiEnvironment::Local,
            timeout: None,
        })
    }
}

/// Refresh cadence and fan-out bounds shared by the view controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Time between scheduled refreshes.
    pub interval: Duration,
    /// Upper bound on simultaneous per-request offer fetches.
    pub max_concurrent_fetches: usize,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

/// Complete client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub polling: PollSettings,
    /// Directory holding the persisted session.
    pub session_dir: PathBuf,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let environment = match get("HEROOL_ENVIRONMENT") {
            Some(raw) => raw
                .parse::<ApiEnvironment>()
                .map_err(|e| ConfigError::InvalidEnvVar("HEROOL_ENVIRONMENT".to_owned(), e))?,
            None => ApiEnvironment::default(),
        };

        let base_url = match get("HEROOL_API_URL") {
            Some(raw) => parse_base_url("HEROOL_API_URL", &raw)?,
            None => parse_base_url("HEROOL_ENVIRONMENT", environment.default_base_url())?,
        };

        let timeout = get("HEROOL_REQUEST_TIMEOUT_SECS")
            .map(|raw| parse_positive::<u64>("HEROOL_REQUEST_TIMEOUT_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs);

        let interval_ms = get("HEROOL_POLL_INTERVAL_MS")
            .map(|raw| parse_positive::<u64>("HEROOL_POLL_INTERVAL_MS", &raw))
            .transpose()?
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        let max_concurrent_fetches = get("HEROOL_MAX_CONCURRENT_FETCHES")
            .map(|raw| parse_positive::<usize>("HEROOL_MAX_CONCURRENT_FETCHES", &raw))
            .transpose()?
            .unwrap_or(DEFAULT_MAX_CONCURRENT_FETCHES);

        let session_dir = PathBuf::from(
            get("HEROOL_SESSION_DIR").unwrap_or_else(|| DEFAULT_SESSION_DIR.to_owned()),
        );

        Ok(Self {
            api: ApiConfig {
                base_url,
                environment,
                timeout,
            },
            polling: PollSettings {
                interval: Duration::from_millis(interval_ms),
                max_concurrent_fetches,
            },
            session_dir,
        })
    }
}

fn parse_base_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    Url::parse(trimmed).map_err(|e| ConfigError::InvalidEnvVar(name.to_owned(), e.to_string()))
}

fn parse_positive<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let value = raw
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_owned(), e.to_string()))?;
    if value <= T::default() {
        return Err(ConfigError::InvalidEnvVar(
            name.to_owned(),
            "must be greater than zero".to_owned(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ClientConfig::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api.environment, ApiEnvironment::Production);
        assert_eq!(config.api.base_url.as_str(), PRODUCTION_API_URL);
        assert_eq!(config.api.timeout, None);
        assert_eq!(config.polling, PollSettings::default());
        assert_eq!(config.polling.interval, Duration::from_secs(8));
        assert_eq!(config.session_dir, PathBuf::from(".herool"));
    }

    #[test]
    fn test_local_environment_selects_localhost() {
        let config = load(&[("HEROOL_ENVIRONMENT", "local")]).unwrap();
        assert_eq!(config.api.base_url.as_str(), LOCAL_API_URL);
    }

    #[test]
    fn test_explicit_url_wins_and_loses_trailing_slash() {
        let config = load(&[
            ("HEROOL_ENVIRONMENT", "local"),
            ("HEROOL_API_URL", "http://10.0.0.5:5000/api/"),
        ])
        .unwrap();
        assert_eq!(config.api.base_url.as_str(), "http://10.0.0.5:5000/api");
    }

    #[test]
    fn test_polling_overrides() {
        let config = load(&[
            ("HEROOL_POLL_INTERVAL_MS", "2500"),
            ("HEROOL_MAX_CONCURRENT_FETCHES", "2"),
            ("HEROOL_REQUEST_TIMEOUT_SECS", "15"),
        ])
        .unwrap();
        assert_eq!(config.polling.interval, Duration::from_millis(2500));
        assert_eq!(config.polling.max_concurrent_fetches, 2);
        assert_eq!(config.api.timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = load(&[("HEROOL_POLL_INTERVAL_MS", "0")]).unwrap_err();
        assert!(err.to_string().contains("HEROOL_POLL_INTERVAL_MS"));
    }

    #[test]
    fn test_rejects_unknown_environment() {
        assert!(load(&[("HEROOL_ENVIRONMENT", "staging")]).is_err());
    }

    #[test]
    fn test_rejects_relative_url() {
        assert!(load(&[("HEROOL_API_URL", "not a url")]).is_err());
    }
}
