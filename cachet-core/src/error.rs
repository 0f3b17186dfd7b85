//! Error types for record-service operations

use thiserror::Error;
use uuid::Uuid;

/// Validation failures: caller input is malformed or missing.
///
/// Always detected locally, never reported by the store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid ID supplied")]
    InvalidId,

    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("Unknown field: {field}")]
    UnknownField { field: String },

    #[error("{subject} required to {action}")]
    MissingInput { subject: String, action: String },
}

impl ValidationError {
    /// Shorthand for the "X required to Y" family of messages.
    pub fn missing_input(subject: &str, action: &str) -> Self {
        Self::MissingInput {
            subject: subject.to_string(),
            action: action.to_string(),
        }
    }
}

/// Store/business-rule failures reported by the controller delegate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("Insert failed: {reason}")]
    InsertFailed { reason: String },

    #[error("Read failed: {reason}")]
    ReadFailed { reason: String },

    #[error("Update failed: {reason}")]
    UpdateFailed { reason: String },

    #[error("Delete failed: {reason}")]
    DeleteFailed { reason: String },

    #[error("Record not found: {id}")]
    NotFound { id: Uuid },

    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Master error type for service-layer operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Controller error: {0}")]
    Controller(#[from] ControllerError),
}

impl ServiceError {
    /// True when the failure originated from caller input.
    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Validation(_))
    }
}

/// Result type alias for service-layer operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
