//! Payload validation
//!
//! Validation runs before any controller call. The [`RecordSchema`] trait
//! keeps the service generic over validation policy; [`FieldSchema`] is
//! the declarative implementation used by most services.

use serde_json::Value;

use cachet_core::{JsonMap, ValidationError};

/// Validation policy for create/update payloads.
pub trait RecordSchema: Send + Sync {
    /// Check a payload, returning the first violation found.
    fn validate(&self, payload: &JsonMap) -> Result<(), ValidationError>;
}

/// Declarative field schema.
///
/// Required fields must be present and non-null; a required string must
/// also be non-empty. With `deny_unknown`, any field outside the declared
/// set is rejected.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    required: Vec<String>,
    permitted: Vec<String>,
    deny_unknown: bool,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// A schema that accepts any payload.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Declare a required field.
    pub fn require(mut self, field: impl Into<String>) -> Self {
        self.required.push(field.into());
        self
    }

    /// Declare an optional field, relevant only with `deny_unknown`.
    pub fn permit(mut self, field: impl Into<String>) -> Self {
        self.permitted.push(field.into());
        self
    }

    /// Reject fields outside the required and permitted sets.
    pub fn deny_unknown(mut self) -> Self {
        self.deny_unknown = true;
        self
    }

    fn is_known(&self, field: &str) -> bool {
        self.required.iter().any(|f| f == field) || self.permitted.iter().any(|f| f == field)
    }
}

impl RecordSchema for FieldSchema {
    fn validate(&self, payload: &JsonMap) -> Result<(), ValidationError> {
        for field in &self.required {
            let missing = match payload.get(field) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            };
            if missing {
                return Err(ValidationError::RequiredFieldMissing {
                    field: field.clone(),
                });
            }
        }
        if self.deny_unknown {
            if let Some(field) = payload.keys().find(|k| !self.is_known(k)) {
                return Err(ValidationError::UnknownField {
                    field: field.clone(),
                });
            }
        }
        Ok(())
    }
}
