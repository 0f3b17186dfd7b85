//! Cachet Core - Data types for the record-access service layer
//!
//! Defines the record model, seek-condition vocabulary, error taxonomy,
//! and request shape shared by the cache and service crates. This crate
//! is pure data: no I/O, no async.

pub mod error;
pub mod filter;
pub mod record;
pub mod request;

pub use error::{ControllerError, ServiceError, ServiceResult, ValidationError};
pub use filter::{compare_values, BuiltQuery, Criterion, SeekCondition, SeekConditions, SortOrder};
pub use record::{DeletionOutcome, MutationOutcome, Record, RecordId};
pub use request::{PathParams, RequestBody, ServiceRequest};

/// JSON object map used for record fields, query options, and update data.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
