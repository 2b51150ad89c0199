//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid log filter: {0}")]
    InvalidLogLevel(String),

    #[error("TTL for {0} must be greater than zero")]
    InvalidTtl(&'static str),

    #[error("Intent history must keep at least one entry")]
    InvalidIntentLimit,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Redis key prefix must not be empty")]
    EmptyKeyPrefix,

    #[error("Invalid record API URL format")]
    InvalidRecordApiUrl,

    #[error("Record API must use HTTPS in production")]
    RecordApiMustBeHttps,

    #[error("Invalid record API timeout")]
    InvalidTimeout,

    #[error("Unknown flow type in access rules: {0}")]
    UnknownFlowType(String),
}
