//! Storage configuration: backend selection and TTLs

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

const ONE_DAY_SECS: u64 = 86_400;

/// Where sessions, drafts and intents live
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Redis,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Session document lifetime in seconds
    #[serde(default = "default_ttl")]
    pub session_ttl_secs: u64,

    /// Draft lifetime in seconds
    #[serde(default = "default_ttl")]
    pub draft_ttl_secs: u64,

    /// Intent history lifetime in seconds
    #[serde(default = "default_intent_ttl")]
    pub intent_ttl_secs: u64,

    /// Entries kept per user in the intent history
    #[serde(default = "default_intent_max_entries")]
    pub intent_max_entries: usize,
}

impl StorageConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn draft_ttl(&self) -> Duration {
        Duration::from_secs(self.draft_ttl_secs)
    }

    pub fn intent_ttl(&self) -> Duration {
        Duration::from_secs(self.intent_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.session_ttl_secs == 0 {
            return Err(ValidationError::InvalidTtl("sessions"));
        }
        if self.draft_ttl_secs == 0 {
            return Err(ValidationError::InvalidTtl("drafts"));
        }
        if self.intent_ttl_secs == 0 {
            return Err(ValidationError::InvalidTtl("intents"));
        }
        if self.intent_max_entries == 0 {
            return Err(ValidationError::InvalidIntentLimit);
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            session_ttl_secs: default_ttl(),
            draft_ttl_secs: default_ttl(),
            intent_ttl_secs: default_intent_ttl(),
            intent_max_entries: default_intent_max_entries(),
        }
    }
}

fn default_ttl() -> u64 {
    ONE_DAY_SECS
}

fn default_intent_ttl() -> u64 {
    3_600
}

fn default_intent_max_entries() -> usize {
    20
}
