//! Application configuration module
//!
//! Configuration is layered: an optional YAML file, then environment
//! variables with the `REGISTRATION_FLOWS` prefix (nested values separated by
//! `__`), loaded with the `config` and `dotenvy` crates.
//!
//! # Example
//!
//! ```no_run
//! use registration_flows::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Storage backend: {:?}", config.storage.backend);
//! ```

mod error;
mod record_api;
mod redis;
mod runtime;
mod storage;

pub use error::{ConfigError, ValidationError};
pub use record_api::RecordApiConfig;
pub use redis::RedisConfig;
pub use runtime::{Environment, LogFormat, RuntimeConfig};
pub use storage::{StorageBackend, StorageConfig};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::domain::registration::{AccessControlConfig, AccessGate, FlowType};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "REGISTRATION_FLOWS";

/// Environment variable naming the YAML configuration file.
pub const CONFIG_PATH_VAR: &str = "REGISTRATION_FLOWS_CONFIG";

/// YAML file read when [`CONFIG_PATH_VAR`] is unset. Its absence is not an error.
pub const DEFAULT_CONFIG_FILE: &str = "registration-flows.yaml";

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Environment and logging
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Session, draft and intent storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Redis connection, used by the `redis` backend only
    #[serde(default)]
    pub redis: RedisConfig,

    /// External record API
    #[serde(default)]
    pub record_api: RecordApiConfig,

    /// Access rules keyed by flow type (`expense`, `death`, ...)
    #[serde(default)]
    pub access: BTreeMap<String, AccessControlConfig>,

    /// YAML message catalogs keyed by flow type
    #[serde(default)]
    pub messages: BTreeMap<String, PathBuf>,
}

impl AppConfig {
    /// Load configuration from the YAML file and environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads the YAML file named by `REGISTRATION_FLOWS_CONFIG`, if present
    /// 3. Overlays environment variables with `REGISTRATION_FLOWS` prefix
    ///
    /// # Environment Variable Format
    ///
    /// - `REGISTRATION_FLOWS__STORAGE__BACKEND=redis` -> `storage.backend = redis`
    /// - `REGISTRATION_FLOWS__REDIS__URL=...` -> `redis.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value cannot be parsed into its expected type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load configuration from an explicit YAML file plus environment variables.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Redis settings are only checked when the Redis backend is selected.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.runtime.validate()?;
        self.storage.validate()?;
        if self.storage.backend == StorageBackend::Redis {
            self.redis.validate()?;
        }
        self.record_api.validate(self.runtime.is_production())?;
        for key in self.access.keys().chain(self.messages.keys()) {
            FlowType::from_str(key).map_err(|_| ValidationError::UnknownFlowType(key.clone()))?;
        }
        Ok(())
    }

    /// The access gate of `flow_type`; flows without rules are open.
    pub fn access_gate(&self, flow_type: FlowType) -> AccessGate {
        match self.access.get(flow_type.as_str()) {
            Some(rules) => AccessGate::new(rules.clone()),
            None => AccessGate::open(),
        }
    }

    /// Path of the message catalog configured for `flow_type`.
    pub fn messages_path(&self, flow_type: FlowType) -> Option<&Path> {
        self.messages.get(flow_type.as_str()).map(PathBuf::as_path)
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.runtime.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::registration::PlanContext;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        env::remove_var("REGISTRATION_FLOWS__STORAGE__BACKEND");
        env::remove_var("REGISTRATION_FLOWS__STORAGE__DRAFT_TTL_SECS");
        env::remove_var("REGISTRATION_FLOWS__REDIS__URL");
        env::remove_var("REGISTRATION_FLOWS__RUNTIME__ENVIRONMENT");
    }

    fn yaml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn missing_file() -> PathBuf {
        tempfile::tempdir().unwrap().path().join("absent.yaml")
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let config = AppConfig::load_from(&missing_file()).unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.session_ttl_secs, 86_400);
        assert!(config.record_api.base_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_yaml_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let file = yaml_file(
            r#"
storage:
  backend: redis
  draft_ttl_secs: 600
redis:
  url: redis://localhost:6379
  key_prefix: farm
record_api:
  base_url: https://records.example.com
  api_key: secret-key
access:
  expense:
    allowed_plan_ids: [pro]
    denied_message: Upgrade to register expenses.
"#,
        );

        let config = AppConfig::load_from(file.path()).unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Redis);
        assert_eq!(config.storage.draft_ttl_secs, 600);
        assert_eq!(config.redis.key_prefix, "farm");
        assert!(config.validate().is_ok());

        let gate = config.access_gate(FlowType::Expense);
        assert!(!gate.check(&PlanContext::new(Some("free".into()), None)).is_allowed());
        assert_eq!(gate.denied_message(), "Upgrade to register expenses.");
        assert!(config
            .access_gate(FlowType::Death)
            .check(&PlanContext::default())
            .is_allowed());
    }

    #[test]
    fn test_environment_overrides_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let file = yaml_file("storage:\n  draft_ttl_secs: 600\n");
        env::set_var("REGISTRATION_FLOWS__STORAGE__DRAFT_TTL_SECS", "120");

        let result = AppConfig::load_from(file.path());
        clear_env();

        assert_eq!(result.unwrap().storage.draft_ttl_secs, 120);
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("REGISTRATION_FLOWS__STORAGE__BACKEND", "redis");

        let result = AppConfig::load_from(&missing_file());
        clear_env();

        let config = result.unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("REGISTRATION_FLOWS__RUNTIME__ENVIRONMENT", "production");

        let result = AppConfig::load_from(&missing_file());
        clear_env();

        assert!(result.unwrap().is_production());
    }

    #[test]
    fn test_unknown_flow_in_access_rules() {
        let mut config = AppConfig::default();
        config
            .access
            .insert("harvest".to_string(), AccessControlConfig::default());

        assert!(matches!(
            config.validate(),
            Err(ValidationError::UnknownFlowType(ref name)) if name == "harvest"
        ));
    }

    #[test]
    fn test_messages_path_lookup() {
        let mut config = AppConfig::default();
        config
            .messages
            .insert("death".to_string(), PathBuf::from("catalogs/death.yaml"));

        assert_eq!(
            config.messages_path(FlowType::Death),
            Some(Path::new("catalogs/death.yaml"))
        );
        assert_eq!(config.messages_path(FlowType::Expense), None);
    }
}
