//! Controller registry
//!
//! Dependency-injected lookup from entity name to controller. Built once
//! at startup and immutable afterwards, so handles can be shared freely
//! across tasks without synchronization.

use std::collections::HashMap;
use std::sync::Arc;

use crate::controller::Controller;

/// Immutable name-to-controller map.
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Arc<dyn Controller>>,
}

impl ControllerRegistry {
    /// Start building a registry.
    pub fn builder() -> ControllerRegistryBuilder {
        ControllerRegistryBuilder::default()
    }

    /// Look up a controller by entity name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Controller>> {
        self.controllers.get(name).map(Arc::clone)
    }

    /// Registered entity names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.controllers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

/// Builder for [`ControllerRegistry`]. Registration replaces any earlier
/// controller registered under the same name.
#[derive(Default)]
pub struct ControllerRegistryBuilder {
    controllers: HashMap<String, Arc<dyn Controller>>,
}

impl ControllerRegistryBuilder {
    /// Register a controller under an entity name.
    pub fn register(mut self, name: impl Into<String>, controller: Arc<dyn Controller>) -> Self {
        self.controllers.insert(name.into(), controller);
        self
    }

    /// Freeze the registry.
    pub fn build(self) -> ControllerRegistry {
        ControllerRegistry {
            controllers: self.controllers,
        }
    }
}
