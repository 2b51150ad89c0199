//! Record API configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::HttpRecordApiConfig;

/// Record API configuration. Without a base URL records are kept in memory.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordApiConfig {
    pub base_url: Option<String>,

    /// Bearer key sent with every request
    pub api_key: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl RecordApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// HTTP client settings, `None` when no base URL is configured.
    pub fn http(&self) -> Option<HttpRecordApiConfig> {
        let base_url = self.base_url.as_deref()?;
        let config = HttpRecordApiConfig::new(base_url).with_timeout(self.timeout());
        Some(match &self.api_key {
            Some(key) => config.with_api_key(SecretString::new(key.expose_secret().clone())),
            None => config,
        })
    }

    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        let Some(url) = &self.base_url else {
            return Ok(());
        };
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ValidationError::InvalidRecordApiUrl);
        }
        if production && !url.starts_with("https://") {
            return Err(ValidationError::RecordApiMustBeHttps);
        }
        Ok(())
    }
}

impl Default for RecordApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}
