//! Bounded in-memory cache backend.
//!
//! A `RwLock<HashMap>` keyed by [`CacheKey`] with least-recently-used
//! eviction once capacity is reached. Explicit deletion remains the
//! consistency mechanism; the capacity bound only protects memory.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use cachet_core::Record;

use crate::backend::{CacheBackend, CacheError, CacheResult, CacheStats};
use crate::key::CacheKey;

/// Configuration for the in-memory backend.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached entries before eviction kicks in.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
        }
    }
}

impl CacheConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the capacity bound.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }
}

struct CacheSlot {
    record: Record,
    cached_at: DateTime<Utc>,
    /// Logical clock tick of the last access, for LRU eviction.
    last_used: AtomicU64,
}

/// In-memory cache backend.
pub struct MemoryCacheBackend {
    entries: RwLock<HashMap<CacheKey, CacheSlot>>,
    config: CacheConfig,
    tick: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl MemoryCacheBackend {
    /// Create a backend with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
            tick: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Create a backend with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Evict the least-recently-used entry. Caller holds the write lock.
    fn evict_one(&self, entries: &mut HashMap<CacheKey, CacheSlot>) {
        let victim = entries
            .iter()
            .min_by_key(|(_, slot)| slot.last_used.load(Ordering::Relaxed))
            .map(|(key, _)| key.clone());
        if let Some(key) = victim {
            entries.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Default for MemoryCacheBackend {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<(Record, DateTime<Utc>)>> {
        let entries = self.entries.read().map_err(|_| CacheError::LockPoisoned)?;
        match entries.get(key) {
            Some(slot) => {
                slot.last_used.store(self.next_tick(), Ordering::Relaxed);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some((slot.record.clone(), slot.cached_at)))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn put(
        &self,
        key: CacheKey,
        record: Record,
        cached_at: DateTime<Utc>,
    ) -> CacheResult<()> {
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        // Overwrites never trigger eviction; only net-new entries count
        // against capacity.
        if !entries.contains_key(&key) && entries.len() >= self.config.max_entries {
            self.evict_one(&mut entries);
        }
        entries.insert(
            key,
            CacheSlot {
                record,
                cached_at,
                last_used: AtomicU64::new(self.next_tick()),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> CacheResult<()> {
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }

    async fn purge_namespace(&self, namespace: &str) -> CacheResult<u64> {
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        let before = entries.len();
        entries.retain(|key, _| key.namespace() != namespace);
        Ok((before - entries.len()) as u64)
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        let entries = self.entries.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: entries.len() as u64,
            evictions: self.evictions.load(Ordering::Relaxed),
        })
    }
}
