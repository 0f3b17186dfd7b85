//! End-to-end flows through the record service: cache coherence across
//! mutations, validation short-circuits, and wildcard search.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use cachet_cache::MemoryCacheBackend;
use cachet_core::{
    BuiltQuery, DeletionOutcome, JsonMap, MutationOutcome, Record, SeekConditions, ServiceRequest,
};
use cachet_service::{
    Controller, ControllerResult, ErrorKind, EventSink, MemoryController, RecordEvent,
    RecordEventKind, RecordService,
};

/// Wraps a controller and counts how often each operation is invoked,
/// to observe which requests the cache absorbs.
struct CountingController {
    inner: MemoryController,
    reads: AtomicUsize,
    updates: AtomicUsize,
}

impl CountingController {
    fn new() -> Self {
        Self {
            inner: MemoryController::new(),
            reads: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
        }
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Controller for CountingController {
    async fn create_record(&self, fields: JsonMap) -> ControllerResult<Record> {
        self.inner.create_record(fields).await
    }

    async fn read_records(&self, query: &BuiltQuery) -> ControllerResult<Vec<Record>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_records(query).await
    }

    async fn update_records(
        &self,
        conditions: &SeekConditions,
        data: &JsonMap,
    ) -> ControllerResult<MutationOutcome> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update_records(conditions, data).await
    }

    async fn delete_records(&self, conditions: &SeekConditions) -> ControllerResult<DeletionOutcome> {
        self.inner.delete_records(conditions).await
    }
}

#[derive(Default)]
struct CapturingSink {
    events: Mutex<Vec<RecordEvent>>,
}

impl EventSink for CapturingSink {
    fn publish(&self, event: RecordEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

fn fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn counting_service() -> (RecordService<MemoryCacheBackend>, Arc<CountingController>) {
    let controller = Arc::new(CountingController::new());
    let service = RecordService::new(
        "SampleService",
        Arc::clone(&controller) as Arc<dyn Controller>,
        Arc::new(MemoryCacheBackend::with_defaults()),
    );
    (service, controller)
}

#[tokio::test]
async fn test_create_warms_cache_so_id_read_skips_controller() {
    let (service, controller) = counting_service();

    let created = service
        .create_record(&ServiceRequest::new().with_fields(fields(&[("name", json!("alpha"))])))
        .await
        .unwrap();

    let read = service
        .read_record_by_id(&ServiceRequest::new().with_id(created.id.to_string()))
        .await
        .unwrap();

    assert_eq!(read, Some(created));
    assert_eq!(controller.reads(), 0, "id read should be a cache hit");
}

#[tokio::test]
async fn test_repeat_id_reads_hit_controller_once() {
    let controller = Arc::new(CountingController::new());
    // Seed behind the service's back so the cache starts cold.
    let record = Record::new(fields(&[("name", json!("alpha"))]));
    let id = record.id;
    controller.inner.seed(record).unwrap();

    let service = RecordService::new(
        "SampleService",
        Arc::clone(&controller) as Arc<dyn Controller>,
        Arc::new(MemoryCacheBackend::with_defaults()),
    );
    let by_id = ServiceRequest::new().with_id(id.to_string());

    for _ in 0..3 {
        assert!(service.read_record_by_id(&by_id).await.unwrap().is_some());
    }
    assert_eq!(controller.reads(), 1, "only the cold read reaches the controller");
}

#[tokio::test]
async fn test_update_invalidates_so_read_sees_new_value() {
    let (service, _controller) = counting_service();

    let created = service
        .create_record(&ServiceRequest::new().with_fields(fields(&[("rank", json!(1))])))
        .await
        .unwrap();
    let by_id = ServiceRequest::new().with_id(created.id.to_string());

    // Warm the cache with the pre-update snapshot.
    service.read_record_by_id(&by_id).await.unwrap();

    service
        .update_record_by_id(
            &ServiceRequest::new()
                .with_id(created.id.to_string())
                .with_data(fields(&[("rank", json!(2))])),
        )
        .await
        .unwrap();

    let read = service.read_record_by_id(&by_id).await.unwrap().unwrap();
    assert_eq!(read.get("rank"), Some(&json!(2)), "stale snapshot must not survive an update");
}

#[tokio::test]
async fn test_delete_invalidates_cache_entry() {
    let (service, _controller) = counting_service();

    let created = service
        .create_record(&ServiceRequest::new().with_fields(fields(&[("name", json!("a"))])))
        .await
        .unwrap();
    let by_id = ServiceRequest::new().with_id(created.id.to_string());

    service.read_record_by_id(&by_id).await.unwrap();
    service.delete_record_by_id(&by_id).await.unwrap();

    assert_eq!(service.read_record_by_id(&by_id).await.unwrap(), None);
}

#[tokio::test]
async fn test_invalid_id_is_validation_not_controller_failure() {
    let (service, controller) = counting_service();

    for bad in ["", "   ", "definitely-not-a-uuid"] {
        let err = service
            .read_record_by_id(&ServiceRequest::new().with_id(bad))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.service, "SampleService");
        assert_eq!(err.operation, "read_record_by_id");
    }
    let err = service
        .read_record_by_id(&ServiceRequest::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(controller.reads(), 0, "validation must short-circuit the controller");
}

#[tokio::test]
async fn test_bulk_update_validation_short_circuits() {
    let (service, controller) = counting_service();

    let err = service
        .update_records(&ServiceRequest::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.message, "Options required to update");

    let err = service
        .update_records(&ServiceRequest::new().with_options(fields(&[("kind", json!("a"))])))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.message, "Data required to update");

    assert_eq!(controller.updates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_bulk_update_leaves_cached_snapshot_stale() {
    // Documented blind spot: condition-addressed updates bypass cache
    // invalidation, so an already-cached record keeps serving its old
    // snapshot until an id-addressed mutation evicts it.
    let (service, _controller) = counting_service();

    let created = service
        .create_record(&ServiceRequest::new().with_fields(fields(&[("kind", json!("a")), ("rank", json!(1))])))
        .await
        .unwrap();
    let by_id = ServiceRequest::new().with_id(created.id.to_string());

    service
        .update_records(
            &ServiceRequest::new()
                .with_options(fields(&[("kind", json!("a"))]))
                .with_data(fields(&[("rank", json!(2))])),
        )
        .await
        .unwrap();

    let cached = service.read_record_by_id(&by_id).await.unwrap().unwrap();
    assert_eq!(cached.get("rank"), Some(&json!(1)));
}

#[tokio::test]
async fn test_wildcard_matches_across_keys() {
    let service = RecordService::new(
        "SampleService",
        Arc::new(MemoryController::new()) as Arc<dyn Controller>,
        Arc::new(MemoryCacheBackend::with_defaults()),
    );

    for (name, email) in [
        ("foobar", "a@one.com"),
        ("bar", "x@foo.com"),
        ("baz", "y@bar.com"),
    ] {
        service
            .create_record(
                &ServiceRequest::new()
                    .with_fields(fields(&[("name", json!(name)), ("email", json!(email))])),
            )
            .await
            .unwrap();
    }

    let matched = service
        .read_records_by_wildcard(
            &ServiceRequest::new()
                .with_keys(["name", "email"])
                .with_query("keyword", json!("foo")),
        )
        .await
        .unwrap();

    let names: Vec<&str> = matched
        .iter()
        .filter_map(|r| r.get("name").and_then(Value::as_str))
        .collect();
    assert_eq!(matched.len(), 2);
    assert!(names.contains(&"foobar"));
    assert!(names.contains(&"bar"));
}

#[tokio::test]
async fn test_filtered_read_with_hints() {
    let (service, _controller) = counting_service();

    for rank in 0..10 {
        service
            .create_record(&ServiceRequest::new().with_fields(fields(&[("rank", json!(rank))])))
            .await
            .unwrap();
    }

    let page = service
        .read_records_by_filter(
            &ServiceRequest::new()
                .with_query("rank", json!({"gte": 2}))
                .with_query("sort_by", json!("-rank"))
                .with_query("page", json!(1))
                .with_query("population", json!(3)),
        )
        .await
        .unwrap();

    let ranks: Vec<i64> = page
        .iter()
        .filter_map(|r| r.get("rank").and_then(Value::as_i64))
        .collect();
    assert_eq!(ranks, vec![6, 5, 4]);
}

#[tokio::test]
async fn test_lifecycle_events_are_published() {
    let sink = Arc::new(CapturingSink::default());
    let service = RecordService::new(
        "SampleService",
        Arc::new(MemoryController::new()) as Arc<dyn Controller>,
        Arc::new(MemoryCacheBackend::with_defaults()),
    )
    .with_event_sink(Arc::clone(&sink) as Arc<dyn EventSink>);

    let created = service
        .create_record(&ServiceRequest::new().with_fields(fields(&[("name", json!("a"))])))
        .await
        .unwrap();
    service
        .update_record_by_id(
            &ServiceRequest::new()
                .with_id(created.id.to_string())
                .with_data(fields(&[("name", json!("b"))])),
        )
        .await
        .unwrap();
    service
        .delete_record_by_id(&ServiceRequest::new().with_id(created.id.to_string()))
        .await
        .unwrap();

    let events = sink.events.lock().unwrap();
    let kinds: Vec<RecordEventKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            RecordEventKind::Created,
            RecordEventKind::Updated,
            RecordEventKind::Deleted,
        ]
    );
    assert!(events.iter().all(|e| e.entity == "SampleService"));
    assert!(events.iter().all(|e| e.id == Some(created.id)));
}

#[tokio::test]
async fn test_failed_validation_publishes_no_event() {
    let sink = Arc::new(CapturingSink::default());
    let service = RecordService::new(
        "SampleService",
        Arc::new(MemoryController::new()) as Arc<dyn Controller>,
        Arc::new(MemoryCacheBackend::with_defaults()),
    )
    .with_event_sink(Arc::clone(&sink) as Arc<dyn EventSink>);

    let _ = service.create_record(&ServiceRequest::new()).await;
    let _ = service
        .update_record_by_id(&ServiceRequest::new().with_id("bad"))
        .await;

    assert!(sink.events.lock().unwrap().is_empty());
}
