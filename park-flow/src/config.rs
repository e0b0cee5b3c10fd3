use std::time::Duration;

use crate::error::{ParkError, Result};

pub const API_URL_ENV: &str = "PARKING_API_URL";
pub const SESSION_COOKIE_ENV: &str = "PARKING_SESSION_COOKIE";
pub const TIMEOUT_ENV: &str = "PARKING_HTTP_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the backend API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL, e.g. `https://parking.example.com`. Endpoints are appended to it.
    pub base_url: String,
    /// Raw `Cookie` header value sent with every request.
    pub session_cookie: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            session_cookie: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the configuration from `PARKING_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup(API_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ParkError::Config(format!("{API_URL_ENV} must be set")))?;

        let timeout_secs = match lookup(TIMEOUT_ENV) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ParkError::Config(format!("{TIMEOUT_ENV} must be a number of seconds, got {raw:?}"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url,
            session_cookie: lookup(SESSION_COOKIE_ENV).filter(|v| !v.is_empty()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
