//! Cache backend trait.
//!
//! Abstracts over cache implementations (in-memory, external stores).
//! Implementations must be thread-safe: concurrent get/put/delete on the
//! same backend must not corrupt the mapping. Per-key atomicity suffices;
//! no multi-key transactions are required.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use cachet_core::Record;

use crate::key::CacheKey;

/// Cache backend errors.
///
/// These never escape the [`crate::CacheStore`] facade; they are logged
/// and swallowed there.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache lock poisoned")]
    LockPoisoned,

    #[error("Cache backend failure: {reason}")]
    Backend { reason: String },
}

/// Result type alias for backend operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Pluggable cache backend.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a cached record and when it was cached; `None` on miss.
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<(Record, DateTime<Utc>)>>;

    /// Insert or overwrite a record snapshot. Idempotent.
    async fn put(&self, key: CacheKey, record: Record, cached_at: DateTime<Utc>)
        -> CacheResult<()>;

    /// Delete a key. Deleting an absent key is a no-op.
    async fn delete(&self, key: &CacheKey) -> CacheResult<()>;

    /// Remove every entry in a namespace; returns the number removed.
    async fn purge_namespace(&self, namespace: &str) -> CacheResult<u64>;

    /// Get usage statistics.
    async fn stats(&self) -> CacheResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Entries currently cached.
    pub entry_count: u64,
    /// Entries evicted due to capacity.
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate in `[0.0, 1.0]`.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
