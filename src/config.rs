//! Registry connection settings, loaded from the standard MLflow environment
//! variables:
//! - `MLFLOW_TRACKING_URI` - Base URL (default: `http://localhost:5000`)
//! - `MLFLOW_TRACKING_TOKEN` - Bearer token (optional)
//! - `MLFLOW_TRACKING_USERNAME` / `MLFLOW_TRACKING_PASSWORD` - Basic auth, used when no token is set
//! - `MLFLOW_HTTP_REQUEST_TIMEOUT` - Per-request timeout in seconds (default: 120)

use std::time::Duration;

use thiserror::Error;

/// Default URL of a locally running tracking server.
pub const DEFAULT_TRACKING_URI: &str = "http://localhost:5000";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tracking URI '{0}' is not supported, only http:// and https:// registries can be promoted against")]
    UnsupportedTrackingUri(String),

    #[error("MLFLOW_HTTP_REQUEST_TIMEOUT must be a whole number of seconds, got '{0}'")]
    InvalidTimeout(String),
}

/// How requests authenticate against the registry.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Basic {
        username: String,
        password: Option<String>,
    },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(***)"),
            Self::Basic { username, .. } => write!(f, "Basic({}, ***)", username),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Base URL without trailing slash.
    pub tracking_uri: String,
    pub credentials: Option<Credentials>,
    pub timeout: Duration,
}

impl RegistryConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let tracking_uri = non_empty("MLFLOW_TRACKING_URI")
            .unwrap_or_else(|| DEFAULT_TRACKING_URI.to_string());
        let tracking_uri = normalize_uri(&tracking_uri)?;

        let credentials = match non_empty("MLFLOW_TRACKING_TOKEN") {
            Some(token) => Some(Credentials::Bearer(token)),
            None => non_empty("MLFLOW_TRACKING_USERNAME").map(|username| Credentials::Basic {
                username,
                password: non_empty("MLFLOW_TRACKING_PASSWORD"),
            }),
        };

        let timeout = match non_empty("MLFLOW_HTTP_REQUEST_TIMEOUT") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidTimeout(raw))?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            tracking_uri,
            credentials,
            timeout,
        })
    }

    /// Replace the tracking URI, e.g. from a command-line flag.
    pub fn with_tracking_uri(mut self, uri: &str) -> Result<Self, ConfigError> {
        self.tracking_uri = normalize_uri(uri)?;
        Ok(self)
    }
}

fn normalize_uri(uri: &str) -> Result<String, ConfigError> {
    let uri = uri.trim();
    if !(uri.starts_with("http://") || uri.starts_with("https://")) {
        return Err(ConfigError::UnsupportedTrackingUri(uri.to_string()));
    }
    Ok(uri.trim_end_matches('/').to_string())
}
