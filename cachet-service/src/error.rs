//! Error classification
//!
//! Every operation failure leaves the service as a [`ClassifiedError`]:
//! a tagged record naming the service, the operation, and whether the
//! caller can fix the failure. Raw controller detail is logged here and
//! never exposed in the outgoing message.

use std::fmt;

use serde::{Deserialize, Serialize};

use cachet_core::{ControllerError, ServiceError};

/// Failure class, for callers deciding whether to retry or repair input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Caller input was malformed or missing; resubmitting the same
    /// request will fail again.
    Validation,
    /// The persistence controller failed; the request itself may be fine.
    ControllerFailure,
}

impl ErrorKind {
    /// True when the caller can fix the failure by changing the request.
    pub fn is_client_fixable(&self) -> bool {
        matches!(self, ErrorKind::Validation)
    }
}

/// A classified, caller-safe operation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    /// Service name, e.g. `"UserService"`.
    pub service: String,
    /// Operation name, e.g. `"update_record_by_id"`.
    pub operation: String,
    /// Caller-safe message. Validation messages are verbatim; controller
    /// messages are sanitized.
    pub message: String,
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}: {}",
            self.service, self.operation, self.message
        )
    }
}

impl std::error::Error for ClassifiedError {}

/// Classify a service-layer failure for the caller.
///
/// Validation errors pass their message through unchanged. Controller
/// errors are logged with full detail and replaced by a generic message,
/// except not-found and unavailable which keep a specific but safe form.
pub fn format_error(service: &str, operation: &str, error: &ServiceError) -> ClassifiedError {
    match error {
        ServiceError::Validation(v) => ClassifiedError {
            kind: ErrorKind::Validation,
            service: service.to_string(),
            operation: operation.to_string(),
            message: v.to_string(),
        },
        ServiceError::Controller(c) => {
            tracing::error!(
                service,
                operation,
                error = %c,
                "controller operation failed"
            );
            ClassifiedError {
                kind: ErrorKind::ControllerFailure,
                service: service.to_string(),
                operation: operation.to_string(),
                message: controller_message(c).to_string(),
            }
        }
    }
}

fn controller_message(error: &ControllerError) -> &'static str {
    match error {
        ControllerError::NotFound { .. } => "Record not found",
        ControllerError::Unavailable { .. } => "Service temporarily unavailable",
        _ => "The data operation failed",
    }
}
