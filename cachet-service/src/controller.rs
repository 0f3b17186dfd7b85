//! Controller contract
//!
//! The persistence seam of the service layer. A [`Controller`] owns the
//! authoritative store for one entity; the service validates, caches, and
//! classifies around it but never touches storage directly.
//!
//! [`MemoryController`] is the reference implementation used in tests and
//! for small deployments that do not need a durable store.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use cachet_core::filter::compare_values;
use cachet_core::{
    BuiltQuery, ControllerError, DeletionOutcome, JsonMap, MutationOutcome, Record, RecordId,
    SeekConditions, SortOrder,
};

/// Result type for controller operations.
pub type ControllerResult<T> = Result<T, ControllerError>;

/// Persistence delegate for one entity.
///
/// Every method reports failure through [`ControllerError`]; there is no
/// out-of-band failure channel. Bulk mutations return outcome counts, not
/// the affected records.
#[async_trait]
pub trait Controller: Send + Sync {
    /// Persist a new record built from the given fields.
    async fn create_record(&self, fields: JsonMap) -> ControllerResult<Record>;

    /// Read all records satisfying the query, honoring its pagination,
    /// sort, and projection hints.
    async fn read_records(&self, query: &BuiltQuery) -> ControllerResult<Vec<Record>>;

    /// Apply `data` to every record matching `conditions`.
    async fn update_records(
        &self,
        conditions: &SeekConditions,
        data: &JsonMap,
    ) -> ControllerResult<MutationOutcome>;

    /// Remove every record matching `conditions`.
    async fn delete_records(&self, conditions: &SeekConditions) -> ControllerResult<DeletionOutcome>;
}

/// In-memory controller backed by a `RwLock<HashMap>`.
pub struct MemoryController {
    records: RwLock<HashMap<RecordId, Record>>,
}

impl MemoryController {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a pre-built record, for seeding test fixtures.
    pub fn seed(&self, record: Record) -> ControllerResult<()> {
        let mut records = self.records.write().map_err(|_| unavailable())?;
        records.insert(record.id, record);
        Ok(())
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryController {
    fn default() -> Self {
        Self::new()
    }
}

fn unavailable() -> ControllerError {
    ControllerError::Unavailable {
        reason: "record store lock poisoned".to_string(),
    }
}

/// Compare two records on a sort hint. Records missing the field sort
/// after records that have it, regardless of direction.
fn compare_on(a: &Record, b: &Record, field: &str, order: SortOrder) -> CmpOrdering {
    let (va, vb) = (a.lookup(field), b.lookup(field));
    match (va, vb) {
        (Some(x), Some(y)) => {
            let ord = compare_values(&x, &y).unwrap_or(CmpOrdering::Equal);
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        }
        (Some(_), None) => CmpOrdering::Less,
        (None, Some(_)) => CmpOrdering::Greater,
        (None, None) => CmpOrdering::Equal,
    }
}

fn project(mut record: Record, fields_to_return: &[String]) -> Record {
    if !fields_to_return.is_empty() {
        record
            .fields
            .retain(|key, _| fields_to_return.iter().any(|f| f == key));
    }
    record
}

#[async_trait]
impl Controller for MemoryController {
    async fn create_record(&self, fields: JsonMap) -> ControllerResult<Record> {
        let record = Record::new(fields);
        let mut records = self.records.write().map_err(|_| unavailable())?;
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn read_records(&self, query: &BuiltQuery) -> ControllerResult<Vec<Record>> {
        let records = self.records.read().map_err(|_| unavailable())?;
        let mut matched: Vec<Record> = records
            .values()
            .filter(|r| query.conditions.matches(r))
            .cloned()
            .collect();

        if query.sort.is_empty() {
            // Deterministic order for an unsorted HashMap scan.
            matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.as_uuid().cmp(&b.id.as_uuid())));
        } else {
            matched.sort_by(|a, b| {
                query
                    .sort
                    .iter()
                    .map(|(field, order)| compare_on(a, b, field, *order))
                    .find(|ord| !ord.is_eq())
                    .unwrap_or(CmpOrdering::Equal)
            });
        }

        let iter = matched.into_iter().skip(query.skip as usize);
        let page: Vec<Record> = match query.limit {
            Some(limit) => iter.take(limit as usize).collect(),
            None => iter.collect(),
        };

        Ok(page
            .into_iter()
            .map(|r| project(r, &query.fields_to_return))
            .collect())
    }

    async fn update_records(
        &self,
        conditions: &SeekConditions,
        data: &JsonMap,
    ) -> ControllerResult<MutationOutcome> {
        let mut records = self.records.write().map_err(|_| unavailable())?;
        let mut outcome = MutationOutcome::default();
        for record in records.values_mut() {
            if !conditions.matches(record) {
                continue;
            }
            outcome.matched += 1;
            let changes = data
                .iter()
                .any(|(key, value)| record.fields.get(key) != Some(value));
            if changes {
                record.merge(data);
                outcome.modified += 1;
            }
        }
        Ok(outcome)
    }

    async fn delete_records(&self, conditions: &SeekConditions) -> ControllerResult<DeletionOutcome> {
        let mut records = self.records.write().map_err(|_| unavailable())?;
        let before = records.len();
        records.retain(|_, record| !conditions.matches(record));
        Ok(DeletionOutcome {
            deleted: (before - records.len()) as u64,
        })
    }
}
