//! Cachet Service - Record service orchestration
//!
//! Ties the pieces together: payload validation, condition building,
//! controller delegation, read-through/write-invalidate caching, event
//! publication, and error classification. Construct a [`RecordService`]
//! per entity over a shared cache backend and a registered controller.
//!
//! ```no_run
//! use std::sync::Arc;
//! use cachet_cache::MemoryCacheBackend;
//! use cachet_service::{ControllerRegistry, MemoryController, RecordService};
//!
//! let registry = ControllerRegistry::builder()
//!     .register("users", Arc::new(MemoryController::new()))
//!     .build();
//! let backend = Arc::new(MemoryCacheBackend::with_defaults());
//! let users = RecordService::new(
//!     "UserService",
//!     registry.get("users").expect("registered"),
//!     backend,
//! );
//! # let _ = users;
//! ```

pub mod controller;
pub mod error;
pub mod events;
pub mod query;
pub mod registry;
pub mod schema;
pub mod service;

pub use controller::{Controller, ControllerResult, MemoryController};
pub use error::{format_error, ClassifiedError, ErrorKind};
pub use events::{EventSink, LoggingEventSink, RecordEvent, RecordEventKind};
pub use query::{build_query, build_wildcard_options};
pub use registry::{ControllerRegistry, ControllerRegistryBuilder};
pub use schema::{FieldSchema, RecordSchema};
pub use service::RecordService;
