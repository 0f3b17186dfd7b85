//! Record service
//!
//! The orchestration layer: each operation validates its input, delegates
//! persistence to the [`Controller`], keeps the cache coherent, publishes
//! lifecycle events, and classifies any failure before it leaves.
//!
//! Cache policy: the id-addressed read path is read-through; id-addressed
//! mutations invalidate after the controller commits. Bulk mutations
//! bypass the cache entirely since the affected ids are unknown, so a
//! bulk write can leave id-cached entries stale until they are next
//! invalidated or evicted.

use std::str::FromStr;
use std::sync::Arc;

use serde_json::json;

use cachet_cache::{CacheBackend, CacheStore};
use cachet_core::{
    BuiltQuery, DeletionOutcome, MutationOutcome, Record, RecordId, SeekCondition, SeekConditions,
    ServiceRequest, ServiceResult, ValidationError,
};

use crate::controller::Controller;
use crate::error::{format_error, ClassifiedError};
use crate::events::{EventSink, RecordEvent, RecordEventKind};
use crate::query::{build_query, build_wildcard_options};
use crate::schema::{FieldSchema, RecordSchema};

/// Cache index field for id-addressed records.
const ID_FIELD: &str = "id";

/// A record service for one entity, generic over the cache backend.
pub struct RecordService<B: CacheBackend> {
    name: String,
    controller: Arc<dyn Controller>,
    cache: CacheStore<B>,
    create_schema: Arc<dyn RecordSchema>,
    update_schema: Arc<dyn RecordSchema>,
    events: Option<Arc<dyn EventSink>>,
}

impl<B: CacheBackend> RecordService<B> {
    /// Create a service named `name`, caching under a namespace of the
    /// same name. Schemas default to permissive.
    pub fn new(name: impl Into<String>, controller: Arc<dyn Controller>, backend: Arc<B>) -> Self {
        let name = name.into();
        let cache = CacheStore::new(name.clone(), backend);
        Self {
            name,
            controller,
            cache,
            create_schema: Arc::new(FieldSchema::permissive()),
            update_schema: Arc::new(FieldSchema::permissive()),
            events: None,
        }
    }

    /// Set the create-payload schema.
    pub fn with_create_schema(mut self, schema: Arc<dyn RecordSchema>) -> Self {
        self.create_schema = schema;
        self
    }

    /// Set the update-payload schema.
    pub fn with_update_schema(mut self, schema: Arc<dyn RecordSchema>) -> Self {
        self.update_schema = schema;
        self
    }

    /// Attach a lifecycle event sink.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    /// The service/namespace name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The cache store, for diagnostics.
    pub fn cache(&self) -> &CacheStore<B> {
        &self.cache
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Validate and persist a new record, then cache it by id.
    pub async fn create_record(
        &self,
        request: &ServiceRequest,
    ) -> Result<Record, ClassifiedError> {
        self.create_record_inner(request)
            .await
            .map_err(|e| format_error(&self.name, "create_record", &e))
    }

    /// Read one active record by id, serving from cache when possible.
    pub async fn read_record_by_id(
        &self,
        request: &ServiceRequest,
    ) -> Result<Option<Record>, ClassifiedError> {
        self.read_record_by_id_inner(request)
            .await
            .map_err(|e| format_error(&self.name, "read_record_by_id", &e))
    }

    /// Read every record, unfiltered.
    pub async fn read_records(&self) -> Result<Vec<Record>, ClassifiedError> {
        self.controller
            .read_records(&BuiltQuery::empty())
            .await
            .map_err(|e| format_error(&self.name, "read_records", &e.into()))
    }

    /// Read records matching the request's query options.
    pub async fn read_records_by_filter(
        &self,
        request: &ServiceRequest,
    ) -> Result<Vec<Record>, ClassifiedError> {
        self.read_records_by_filter_inner(request)
            .await
            .map_err(|e| format_error(&self.name, "read_records_by_filter", &e))
    }

    /// Read records where the keyword appears in any of the given keys.
    pub async fn read_records_by_wildcard(
        &self,
        request: &ServiceRequest,
    ) -> Result<Vec<Record>, ClassifiedError> {
        self.read_records_by_wildcard_inner(request)
            .await
            .map_err(|e| format_error(&self.name, "read_records_by_wildcard", &e))
    }

    /// Update one record by id, invalidating its cache entry on success.
    pub async fn update_record_by_id(
        &self,
        request: &ServiceRequest,
    ) -> Result<MutationOutcome, ClassifiedError> {
        self.update_record_by_id_inner(request)
            .await
            .map_err(|e| format_error(&self.name, "update_record_by_id", &e))
    }

    /// Update every record matching the request's condition options.
    /// Bypasses the cache; see the module docs for the staleness window.
    pub async fn update_records(
        &self,
        request: &ServiceRequest,
    ) -> Result<MutationOutcome, ClassifiedError> {
        self.update_records_inner(request)
            .await
            .map_err(|e| format_error(&self.name, "update_records", &e))
    }

    /// Delete one record by id, invalidating its cache entry.
    pub async fn delete_record_by_id(
        &self,
        request: &ServiceRequest,
    ) -> Result<DeletionOutcome, ClassifiedError> {
        self.delete_record_by_id_inner(request)
            .await
            .map_err(|e| format_error(&self.name, "delete_record_by_id", &e))
    }

    /// Delete every record matching the request's condition options.
    /// Bypasses the cache, like [`RecordService::update_records`].
    pub async fn delete_records(
        &self,
        request: &ServiceRequest,
    ) -> Result<DeletionOutcome, ClassifiedError> {
        self.delete_records_inner(request)
            .await
            .map_err(|e| format_error(&self.name, "delete_records", &e))
    }

    // ========================================================================
    // Inner flows
    // ========================================================================

    async fn create_record_inner(&self, request: &ServiceRequest) -> ServiceResult<Record> {
        if request.body.fields.is_empty() {
            return Err(ValidationError::missing_input("Fields", "create").into());
        }
        self.create_schema.validate(&request.body.fields)?;

        let record = self.controller.create_record(request.body.fields.clone()).await?;

        // Best-effort cache warm; the create already committed.
        self.cache
            .insert_record(ID_FIELD, &record.id.to_string(), &record)
            .await;
        self.publish(RecordEventKind::Created, Some(record.id));
        Ok(record)
    }

    async fn read_record_by_id_inner(
        &self,
        request: &ServiceRequest,
    ) -> ServiceResult<Option<Record>> {
        let id = require_id(request)?;
        let id_text = id.to_string();

        if let Some(cached) = self.cache.get_record(ID_FIELD, &id_text).await {
            return Ok(Some(cached));
        }

        let conditions = SeekConditions::new()
            .with(SeekCondition::eq(ID_FIELD, json!(id_text)))
            .with(SeekCondition::eq("is_active", json!(true)));
        let mut found = self
            .controller
            .read_records(&BuiltQuery::from_conditions(conditions))
            .await?;

        let record = if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        };
        if let Some(record) = &record {
            self.cache.insert_record(ID_FIELD, &id_text, record).await;
        }
        Ok(record)
    }

    async fn read_records_by_filter_inner(
        &self,
        request: &ServiceRequest,
    ) -> ServiceResult<Vec<Record>> {
        if request.query.is_empty() {
            return Err(ValidationError::missing_input("Query", "filter").into());
        }
        let query = build_query(&request.query)?;
        Ok(self.controller.read_records(&query).await?)
    }

    async fn read_records_by_wildcard_inner(
        &self,
        request: &ServiceRequest,
    ) -> ServiceResult<Vec<Record>> {
        if request.params.keys.is_empty() {
            return Err(ValidationError::missing_input("Keys", "read").into());
        }
        let keyword = match request.keyword() {
            Some(k) if !k.trim().is_empty() => k.trim(),
            _ => return Err(ValidationError::missing_input("Keyword", "read").into()),
        };

        let conditions = build_wildcard_options(&request.params.keys, keyword);
        Ok(self
            .controller
            .read_records(&BuiltQuery::from_conditions(conditions))
            .await?)
    }

    async fn update_record_by_id_inner(
        &self,
        request: &ServiceRequest,
    ) -> ServiceResult<MutationOutcome> {
        let id = require_id(request)?;
        if request.body.data.is_empty() {
            return Err(ValidationError::missing_input("Data", "update").into());
        }
        self.update_schema.validate(&request.body.data)?;

        let conditions =
            SeekConditions::new().with(SeekCondition::eq(ID_FIELD, json!(id.to_string())));
        let outcome = self
            .controller
            .update_records(&conditions, &request.body.data)
            .await?;

        // Invalidate only after the controller committed, so a failed
        // update cannot evict a still-valid entry.
        self.cache.delete_record(ID_FIELD, &id.to_string()).await;
        self.publish(RecordEventKind::Updated, Some(id));
        Ok(outcome)
    }

    async fn update_records_inner(
        &self,
        request: &ServiceRequest,
    ) -> ServiceResult<MutationOutcome> {
        if request.body.options.is_empty() {
            return Err(ValidationError::missing_input("Options", "update").into());
        }
        if request.body.data.is_empty() {
            return Err(ValidationError::missing_input("Data", "update").into());
        }
        self.update_schema.validate(&request.body.data)?;

        let query = build_query(&request.body.options)?;
        let outcome = self
            .controller
            .update_records(&query.conditions, &request.body.data)
            .await?;
        self.publish(RecordEventKind::Updated, None);
        Ok(outcome)
    }

    async fn delete_record_by_id_inner(
        &self,
        request: &ServiceRequest,
    ) -> ServiceResult<DeletionOutcome> {
        let id = require_id(request)?;

        let conditions =
            SeekConditions::new().with(SeekCondition::eq(ID_FIELD, json!(id.to_string())));
        let outcome = self.controller.delete_records(&conditions).await?;

        self.cache.delete_record(ID_FIELD, &id.to_string()).await;
        self.publish(RecordEventKind::Deleted, Some(id));
        Ok(outcome)
    }

    async fn delete_records_inner(
        &self,
        request: &ServiceRequest,
    ) -> ServiceResult<DeletionOutcome> {
        if request.body.options.is_empty() {
            return Err(ValidationError::missing_input("Options", "delete").into());
        }
        let query = build_query(&request.body.options)?;
        let outcome = self.controller.delete_records(&query.conditions).await?;
        self.publish(RecordEventKind::Deleted, None);
        Ok(outcome)
    }

    fn publish(&self, kind: RecordEventKind, id: Option<RecordId>) {
        if let Some(sink) = &self.events {
            sink.publish(RecordEvent::new(self.name.clone(), kind, id));
        }
    }
}

impl<B: CacheBackend> Clone for RecordService<B> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            controller: Arc::clone(&self.controller),
            cache: self.cache.clone(),
            create_schema: Arc::clone(&self.create_schema),
            update_schema: Arc::clone(&self.update_schema),
            events: self.events.clone(),
        }
    }
}

/// Extract and parse the path id. Whitespace is trimmed first; a missing,
/// blank, or unparseable id is a validation failure, never a controller one.
fn require_id(request: &ServiceRequest) -> Result<RecordId, ValidationError> {
    let raw = request
        .params
        .id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::InvalidId)?;
    RecordId::from_str(raw).map_err(|_| ValidationError::InvalidId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::MemoryController;
    use cachet_cache::MemoryCacheBackend;
    use serde_json::{json, Map, Value};

    fn fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn service() -> RecordService<MemoryCacheBackend> {
        RecordService::new(
            "SampleService",
            Arc::new(MemoryController::new()),
            Arc::new(MemoryCacheBackend::with_defaults()),
        )
    }

    #[tokio::test]
    async fn test_create_requires_fields() {
        let err = service()
            .create_record(&ServiceRequest::new())
            .await
            .unwrap_err();
        assert!(err.kind.is_client_fixable());
        assert_eq!(err.message, "Fields required to create");
    }

    #[tokio::test]
    async fn test_create_then_read_by_id() -> Result<(), ClassifiedError> {
        let service = service();
        let created = service
            .create_record(&ServiceRequest::new().with_fields(fields(&[("name", json!("alpha"))])))
            .await?;

        let read = service
            .read_record_by_id(&ServiceRequest::new().with_id(created.id.to_string()))
            .await?;
        assert_eq!(read, Some(created));
        Ok(())
    }

    #[tokio::test]
    async fn test_read_by_id_rejects_bad_ids() {
        let service = service();
        for bad in ["", "   ", "not-a-uuid"] {
            let err = service
                .read_record_by_id(&ServiceRequest::new().with_id(bad))
                .await
                .unwrap_err();
            assert_eq!(err.kind, crate::error::ErrorKind::Validation);
            assert_eq!(err.message, "Invalid ID supplied");
        }
        // Missing id entirely.
        let err = service
            .read_record_by_id(&ServiceRequest::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_read_by_id_absent_is_ok_none() -> Result<(), ClassifiedError> {
        let read = service()
            .read_record_by_id(&ServiceRequest::new().with_id(RecordId::now_v7().to_string()))
            .await?;
        assert_eq!(read, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_read_by_id_skips_inactive_records() -> Result<(), ClassifiedError> {
        let controller = Arc::new(MemoryController::new());
        let mut record = Record::new(fields(&[("name", json!("ghost"))]));
        record.is_active = false;
        let id = record.id;
        controller.seed(record).unwrap();

        let service = RecordService::new(
            "SampleService",
            controller,
            Arc::new(MemoryCacheBackend::with_defaults()),
        );
        let read = service
            .read_record_by_id(&ServiceRequest::new().with_id(id.to_string()))
            .await?;
        assert_eq!(read, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_filter_requires_query() {
        let err = service()
            .read_records_by_filter(&ServiceRequest::new())
            .await
            .unwrap_err();
        assert_eq!(err.message, "Query required to filter");
    }

    #[tokio::test]
    async fn test_filter_reads_through_builder() -> Result<(), ClassifiedError> {
        let service = service();
        for rank in [1, 5, 9] {
            service
                .create_record(&ServiceRequest::new().with_fields(fields(&[("rank", json!(rank))])))
                .await?;
        }

        let matched = service
            .read_records_by_filter(
                &ServiceRequest::new().with_query("rank", json!({"gte": 5})),
            )
            .await?;
        assert_eq!(matched.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_wildcard_requires_keys_and_keyword() {
        let service = service();

        let err = service
            .read_records_by_wildcard(&ServiceRequest::new().with_query("keyword", json!("x")))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Keys required to read");

        let err = service
            .read_records_by_wildcard(&ServiceRequest::new().with_keys(["name"]))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Keyword required to read");

        let err = service
            .read_records_by_wildcard(
                &ServiceRequest::new()
                    .with_keys(["name"])
                    .with_query("keyword", json!("   ")),
            )
            .await
            .unwrap_err();
        assert_eq!(err.message, "Keyword required to read");
    }

    #[tokio::test]
    async fn test_update_by_id_requires_data() -> Result<(), ClassifiedError> {
        let service = service();
        let created = service
            .create_record(&ServiceRequest::new().with_fields(fields(&[("name", json!("a"))])))
            .await?;

        let err = service
            .update_record_by_id(&ServiceRequest::new().with_id(created.id.to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Data required to update");
        Ok(())
    }

    #[tokio::test]
    async fn test_update_by_id_reports_counts() -> Result<(), ClassifiedError> {
        let service = service();
        let created = service
            .create_record(&ServiceRequest::new().with_fields(fields(&[("rank", json!(1))])))
            .await?;

        let outcome = service
            .update_record_by_id(
                &ServiceRequest::new()
                    .with_id(created.id.to_string())
                    .with_data(fields(&[("rank", json!(2))])),
            )
            .await?;
        assert_eq!(outcome, MutationOutcome { matched: 1, modified: 1 });
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_update_requires_options_and_data() {
        let service = service();

        let err = service
            .update_records(&ServiceRequest::new().with_data(fields(&[("rank", json!(1))])))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Options required to update");

        let err = service
            .update_records(
                &ServiceRequest::new().with_options(fields(&[("kind", json!("a"))])),
            )
            .await
            .unwrap_err();
        assert_eq!(err.message, "Data required to update");
    }

    #[tokio::test]
    async fn test_delete_by_id_then_gone() -> Result<(), ClassifiedError> {
        let service = service();
        let created = service
            .create_record(&ServiceRequest::new().with_fields(fields(&[("name", json!("a"))])))
            .await?;
        let by_id = ServiceRequest::new().with_id(created.id.to_string());

        let outcome = service.delete_record_by_id(&by_id).await?;
        assert_eq!(outcome.deleted, 1);
        assert_eq!(service.read_record_by_id(&by_id).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_delete_requires_options() {
        let err = service()
            .delete_records(&ServiceRequest::new())
            .await
            .unwrap_err();
        assert_eq!(err.message, "Options required to delete");
    }

    #[tokio::test]
    async fn test_bulk_delete_by_conditions() -> Result<(), ClassifiedError> {
        let service = service();
        for kind in ["a", "a", "b"] {
            service
                .create_record(&ServiceRequest::new().with_fields(fields(&[("kind", json!(kind))])))
                .await?;
        }

        let outcome = service
            .delete_records(
                &ServiceRequest::new().with_options(fields(&[("kind", json!("a"))])),
            )
            .await?;
        assert_eq!(outcome.deleted, 2);
        assert_eq!(service.read_records().await?.len(), 1);
        Ok(())
    }
}
