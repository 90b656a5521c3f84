//! # Config Module
//!
//! Where niceday-api lives and how long to wait for it.
//!
//! Resolution order, highest first:
//! 1. Values set explicitly by the caller (CLI flags)
//! 2. `NICEDAY_API_URI` / `NICEDAY_TIMEOUT_SECS`
//! 3. Defaults (`http://localhost:8080/`, 30 seconds)

use crate::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// DEFAULTS
// =============================================================================

/// Default niceday-api location.
pub const DEFAULT_API_URI: &str = "http://localhost:8080/";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable holding the niceday-api URI.
pub const ENV_API_URI: &str = "NICEDAY_API_URI";

/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "NICEDAY_TIMEOUT_SECS";

// =============================================================================
// CLIENT CONFIG
// =============================================================================

/// Settings for a [`NicedayClient`](crate::NicedayClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URI of niceday-api.
    pub api_uri: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_uri: DEFAULT_API_URI.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Config pointing at `api_uri` with the default timeout.
    pub fn new(api_uri: impl Into<String>) -> Self {
        Self {
            api_uri: api_uri.into(),
            ..Self::default()
        }
    }

    /// Build a config from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    ///
    /// Missing keys fall back to defaults. A timeout that is not a positive
    /// integer is rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(uri) = lookup(ENV_API_URI).filter(|v| !v.trim().is_empty()) {
            config.api_uri = uri.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout_secs = parse_timeout(&raw)?;
        }
        Ok(config)
    }

    /// Override the timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check the config and return the API URI with exactly one trailing `/`.
    pub fn normalized_api_uri(&self) -> Result<String, Error> {
        let uri = self.api_uri.trim();
        if uri.is_empty() {
            return Err(Error::Config("niceday-api URI is empty".to_string()));
        }
        if !(uri.starts_with("http://") || uri.starts_with("https://")) {
            return Err(Error::Config(format!(
                "niceday-api URI '{}' must start with http:// or https://",
                uri
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout must be at least 1 second".to_string()));
        }
        Ok(format!("{}/", uri.trim_end_matches('/')))
    }
}

fn parse_timeout(raw: &str) -> Result<u64, Error> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(Error::Config(format!(
            "{} must be a positive integer, got '{}'",
            ENV_TIMEOUT_SECS, raw
        ))),
    }
}
