//! Cachet Cache - Namespaced lookaside cache for records
//!
//! A keyed read-through companion store: the record service checks it
//! before the persistence controller and invalidates entries on mutation.
//! Staleness is controlled entirely by explicit invalidation; there is no
//! TTL at this layer.
//!
//! # Namespacing
//!
//! Every key carries the owning service's namespace. [`CacheKey`]'s private
//! constructor makes an un-namespaced key unrepresentable, so cross-entity
//! collisions are impossible by construction.
//!
//! # Best effort
//!
//! The [`CacheStore`] facade never raises: a miss is `None`, a backend
//! failure is logged and treated as a miss (reads) or skipped (writes).
//! Persistence stays authoritative.

pub mod backend;
pub mod key;
pub mod memory;
pub mod store;

pub use backend::{CacheBackend, CacheError, CacheResult, CacheStats};
pub use key::CacheKey;
pub use memory::{CacheConfig, MemoryCacheBackend};
pub use store::CacheStore;
