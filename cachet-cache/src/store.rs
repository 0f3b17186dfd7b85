//! Namespaced best-effort cache facade.
//!
//! [`CacheStore`] is what the record service talks to. Every method is
//! infallible from the caller's perspective: backend failures are logged
//! and absorbed, because the cache is best-effort and persistence is
//! authoritative.

use std::sync::Arc;

use chrono::Utc;

use cachet_core::Record;

use crate::backend::CacheBackend;
use crate::key::CacheKey;

/// A cache handle scoped to one service's namespace.
pub struct CacheStore<B: CacheBackend> {
    namespace: String,
    backend: Arc<B>,
}

impl<B: CacheBackend> CacheStore<B> {
    /// Create a store scoped to `namespace` over a shared backend.
    pub fn new(namespace: impl Into<String>, backend: Arc<B>) -> Self {
        Self {
            namespace: namespace.into(),
            backend,
        }
    }

    /// The namespace this store is scoped to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The shared backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn key(&self, index_field: &str, index_value: &str) -> CacheKey {
        CacheKey::new(self.namespace.clone(), index_field, index_value)
    }

    /// Look up a cached record by an indexed field. Never raises: a miss
    /// and a backend failure both come back as `None`.
    pub async fn get_record(&self, index_field: &str, index_value: &str) -> Option<Record> {
        match self.backend.get(&self.key(index_field, index_value)).await {
            Ok(found) => found.map(|(record, _cached_at)| record),
            Err(e) => {
                tracing::error!(
                    namespace = %self.namespace,
                    index_field,
                    error = %e,
                    "cache read failed; treating as miss"
                );
                None
            }
        }
    }

    /// Cache a record snapshot under an indexed field. Idempotent
    /// overwrite; failure to cache is logged and swallowed.
    pub async fn insert_record(&self, index_field: &str, index_value: &str, record: &Record) {
        let key = self.key(index_field, index_value);
        if let Err(e) = self.backend.put(key, record.clone(), Utc::now()).await {
            tracing::warn!(
                namespace = %self.namespace,
                index_field,
                error = %e,
                "cache insert failed; record served from store only"
            );
        }
    }

    /// Invalidate a cached record. Idempotent; an absent key is a no-op
    /// and a backend failure is logged and swallowed.
    pub async fn delete_record(&self, index_field: &str, index_value: &str) {
        let key = self.key(index_field, index_value);
        if let Err(e) = self.backend.delete(&key).await {
            tracing::error!(
                namespace = %self.namespace,
                index_field,
                index_value,
                error = %e,
                "cache invalidation failed; entry may serve stale data until overwritten"
            );
        }
    }

    /// Drop every entry in this store's namespace. Returns how many were
    /// removed; zero on backend failure.
    pub async fn purge(&self) -> u64 {
        match self.backend.purge_namespace(&self.namespace).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::error!(namespace = %self.namespace, error = %e, "cache purge failed");
                0
            }
        }
    }
}

impl<B: CacheBackend> Clone for CacheStore<B> {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            backend: Arc::clone(&self.backend),
        }
    }
}
