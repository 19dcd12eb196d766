//! Client configuration parsed from environment variables.

use std::time::Duration;

use crate::error::ClientError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.pdfsmart.online";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub poll_interval: Duration,
    pub timeouts: Timeouts,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `DOCSUM_API_BASE_URL`: default `https://api.pdfsmart.online`
    /// - `DOCSUM_POLL_INTERVAL_SECS`: default 10, must be non-zero
    /// - `DOCSUM_REQUEST_TIMEOUT_SECS`: default 30
    /// - `DOCSUM_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns `ConfigParse` for a base URL without an http(s) scheme or a
    /// zero poll interval.
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = std::env::var("DOCSUM_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let poll_secs = env_parse_u64("DOCSUM_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS);
        let timeouts = Timeouts {
            request_secs: env_parse_u64("DOCSUM_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("DOCSUM_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Self::new(&base_url, poll_secs, timeouts)
    }

    /// Build a config from explicit values, applying the same validation as
    /// [`ClientConfig::from_env`].
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn new(base_url: &str, poll_interval_secs: u64, timeouts: Timeouts) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            poll_interval: parse_poll_interval(poll_interval_secs)?,
            timeouts,
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
        }
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(ClientError::ConfigParse(format!("invalid DOCSUM_API_BASE_URL: {raw}")))
    }
}

fn parse_poll_interval(secs: u64) -> Result<Duration, ClientError> {
    if secs == 0 {
        return Err(ClientError::ConfigParse("DOCSUM_POLL_INTERVAL_SECS must be non-zero".into()));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
