//! Protocol adapter registry
//!
//! Maps each protocol version to the adapter that speaks it, so supporting
//! a new version means registering one more adapter.

use crate::domain::ports::ProtocolAdapter;
use crate::domain::value_objects::ProtocolVersion;
use std::collections::HashMap;
use std::sync::Arc;

/// Protocol adapters keyed by the version they speak.
#[derive(Clone, Default)]
pub struct ProtocolAdapters {
    adapters: HashMap<ProtocolVersion, Arc<dyn ProtocolAdapter>>,
}

impl ProtocolAdapters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own version, replacing any previous one.
    pub fn register(
        &mut self,
        adapter: Arc<dyn ProtocolAdapter>,
    ) -> Option<Arc<dyn ProtocolAdapter>> {
        self.adapters.insert(adapter.version(), adapter)
    }

    /// Adapter for `version`, if one is registered.
    pub fn get(&self, version: ProtocolVersion) -> Option<Arc<dyn ProtocolAdapter>> {
        self.adapters.get(&version).cloned()
    }

    /// Registered versions in ascending order.
    pub fn versions(&self) -> Vec<ProtocolVersion> {
        let mut versions: Vec<_> = self.adapters.keys().copied().collect();
        versions.sort();
        versions
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl FromIterator<Arc<dyn ProtocolAdapter>> for ProtocolAdapters {
    fn from_iter<I: IntoIterator<Item = Arc<dyn ProtocolAdapter>>>(iter: I) -> Self {
        let mut adapters = Self::new();
        for adapter in iter {
            adapters.register(adapter);
        }
        adapters
    }
}
