//! Domain service errors.

use thiserror::Error;

/// Failure reported by a domain service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Invalid value for '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Draft storage failed: {0}")]
    Storage(String),

    #[error("Record API failed: {0}")]
    RecordApi(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ServiceError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Generic user-facing text for the error.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Validation { reason, .. } => reason.clone(),
            ServiceError::NotFound(_) => "I couldn't find that record anymore.".to_string(),
            ServiceError::Storage(_) | ServiceError::Unavailable(_) => {
                "Something went wrong on our side. Please try again in a moment.".to_string()
            }
            ServiceError::RecordApi(_) => {
                "I couldn't save the record right now. Please try again.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_the_reason() {
        let err = ServiceError::validation("quantity", "Quantity must be at least 1.");
        assert_eq!(err.user_message(), "Quantity must be at least 1.");
        assert!(err.to_string().contains("'quantity'"));
    }

    #[test]
    fn infrastructure_errors_hide_details() {
        let err = ServiceError::Storage("redis timeout".into());
        assert!(!err.user_message().contains("redis"));
    }
}
