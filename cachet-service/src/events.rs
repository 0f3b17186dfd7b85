//! Record lifecycle events
//!
//! After a mutation commits, the service publishes a fire-and-forget
//! event. Sinks must never fail the operation; there is no delivery
//! guarantee and no acknowledgment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cachet_core::RecordId;

/// What happened to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordEventKind {
    Created,
    Updated,
    Deleted,
}

/// A committed mutation, as announced to sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEvent {
    /// Entity/service name the record belongs to.
    pub entity: String,
    pub kind: RecordEventKind,
    /// Affected record, when the operation addressed a single record.
    pub id: Option<RecordId>,
    pub occurred_at: DateTime<Utc>,
}

impl RecordEvent {
    pub fn new(entity: impl Into<String>, kind: RecordEventKind, id: Option<RecordId>) -> Self {
        Self {
            entity: entity.into(),
            kind,
            id,
            occurred_at: Utc::now(),
        }
    }
}

/// Destination for lifecycle events. Implementations must be infallible
/// and non-blocking; drop the event rather than stall the operation.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: RecordEvent);
}

/// Sink that logs events via `tracing`, for deployments without a bus.
#[derive(Debug, Default)]
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn publish(&self, event: RecordEvent) {
        tracing::info!(
            entity = %event.entity,
            kind = ?event.kind,
            id = ?event.id,
            "record event"
        );
    }
}
