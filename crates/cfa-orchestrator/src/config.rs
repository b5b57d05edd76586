//! Orchestrator configuration
//!
//! Loaded from TOML; every field has a default so a partial file is fine:
//!
//! ```toml
//! base_url = "http://localhost:8080"
//! poll_interval_ms = 3000
//! request_timeout_secs = 30
//! category_strictness = "lenient"
//! ```

use crate::error::ConfigError;
use cfa_model::CategoryStrictness;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default polling interval of the decision service contract
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

/// CFA configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfaConfig {
    /// Decision-analysis service root
    pub base_url: String,
    /// Fixed delay between poll ticks
    pub poll_interval_ms: u64,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    /// Empty-category handling in categorical editors
    pub category_strictness: CategoryStrictness,
}

impl CfaConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With service root
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With poll interval
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With per-request timeout
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    /// With category strictness
    #[inline]
    #[must_use]
    pub fn with_category_strictness(mut self, strictness: CategoryStrictness) -> Self {
        self.category_strictness = strictness;
        self
    }

    /// Poll interval as a duration
    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Request timeout as a duration
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// `Parse` for malformed TOML, `Invalid` for unusable values.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// `Io` if the file cannot be read, otherwise as [`Self::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check values are usable
    ///
    /// # Errors
    /// `Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be positive".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for CfaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_secs: 30,
            category_strictness: CategoryStrictness::Lenient,
        }
    }
}
