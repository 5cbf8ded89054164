//! Client configuration.

use std::time::Duration;

use crate::error::ApiError;
use crate::http::{INITIAL_BACKOFF_MS, MAX_RETRIES};

pub const DEFAULT_BASE_URL: &str = "https://api.livesurf.ru/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_RATE_LIMIT_PER_SEC: u32 = 10;

/// Settings accepted when building a [`crate::LiveSurfClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub rate_limit_per_sec: u32,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            rate_limit_per_sec: DEFAULT_RATE_LIMIT_PER_SEC,
            max_retries: MAX_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_rate_limit(mut self, per_sec: u32) -> Self {
        self.rate_limit_per_sec = per_sec;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// Base URL with exactly one trailing slash.
    pub fn normalized_base_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }

    /// Checks the settings that cannot be corrected silently.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.rate_limit_per_sec == 0 {
            return Err(ApiError::Config(
                "rate limit must allow at least one request per second".to_string(),
            ));
        }
        let base = self.normalized_base_url();
        reqwest::Url::parse(&base)
            .map_err(|e| ApiError::Config(format!("invalid base URL {:?}: {}", base, e)))?;
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}
