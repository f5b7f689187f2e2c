//! Central module for client-wide configuration settings.
//!
//! This module loads the API base URL, the optional on-disk session file and
//! the request timeout from the environment. The CLI layers its flags on top.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::errors::{PortalError, Result};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4000/api";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_API_BASE_URL: &str = "CAREPORTAL_API_BASE_URL";
pub const ENV_SESSION_FILE: &str = "CAREPORTAL_SESSION_FILE";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "CAREPORTAL_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct PortalConfig {
    /// Base URL without a trailing slash, e.g. `http://localhost:4000/api`.
    pub api_base_url: String,
    /// When set, the session survives restarts in this JSON file.
    pub session_file: Option<PathBuf>,
    pub request_timeout: Duration,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            session_file: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl PortalConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = PortalConfig::default();

        if let Some(base) = lookup(ENV_API_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config.api_base_url = normalize_base_url(&base)?;
        }

        config.session_file = lookup(ENV_SESSION_FILE)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                PortalError::Config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_REQUEST_TIMEOUT_SECS, raw
                ))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_api_base_url(mut self, base: &str) -> Result<Self> {
        self.api_base_url = normalize_base_url(base)?;
        Ok(self)
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }
}

/// Validates an http(s) base URL and strips trailing slashes.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let cleaned = raw.trim().trim_end_matches('/');

    let parsed = Url::parse(cleaned)
        .map_err(|err| PortalError::Config(format!("Invalid URL '{}': {}", cleaned, err)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PortalError::Config(format!(
            "URL must use http or https scheme, got: {}",
            parsed.scheme()
        )));
    }

    Ok(cleaned.to_string())
}
