//! Record model
//!
//! A [`Record`] is an opaque, schema-defined entity instance owned by the
//! persistence controller. The service layer never interprets its fields,
//! only passes them through and addresses records by [`RecordId`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Unique primary key for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a record id from an existing UUID.
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh time-ordered record id.
    pub fn now_v7() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An entity instance as handed back by the controller.
///
/// `fields` is schema-defined and opaque to the service layer. The
/// `is_active` flag implements soft deletion: the id-addressed read path
/// only surfaces active records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique primary key.
    pub id: RecordId,
    /// Soft-active flag; inactive records are invisible to id reads.
    pub is_active: bool,
    /// Schema-defined payload, owned by the controller.
    pub fields: Map<String, Value>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Create a new active record with a fresh id and the given fields.
    pub fn new(fields: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::now_v7(),
            is_active: true,
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    /// Get a field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Get a string field by name; `None` if absent or not a string.
    pub fn field_as_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Resolve a field for condition matching.
    ///
    /// Unlike [`Record::get`], this also resolves the addressable
    /// meta-fields `id` and `is_active`, so seek conditions can target
    /// them uniformly.
    pub fn lookup(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(Value::String(self.id.to_string())),
            "is_active" => Some(Value::Bool(self.is_active)),
            _ => self.fields.get(field).cloned(),
        }
    }

    /// Merge an update payload into the record fields.
    ///
    /// Used by controller implementations: existing keys are overwritten,
    /// new keys inserted, and `updated_at` is bumped.
    pub fn merge(&mut self, data: &Map<String, Value>) {
        for (key, value) in data {
            self.fields.insert(key.clone(), value.clone());
        }
        self.updated_at = Utc::now();
    }
}

/// Outcome of a condition-addressed update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationOutcome {
    /// Records matched by the conditions.
    pub matched: u64,
    /// Records actually modified.
    pub modified: u64,
}

/// Outcome of a condition-addressed delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionOutcome {
    /// Records removed.
    pub deleted: u64,
}
