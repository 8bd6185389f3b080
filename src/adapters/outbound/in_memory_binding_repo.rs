//! In-Memory Binding Repository
//!
//! Implements BindingRepository with an insertion-ordered vector.

use crate::domain::entities::{Binding, BindingKey};
use crate::domain::ports::BindingRepository;
use parking_lot::RwLock;

/// Vector-backed binding repository.
///
/// Expected scale is dozens of bindings, so lookups are linear scans.
/// `list` clones under the read lock and never observes a partial write.
pub struct InMemoryBindingRepository {
    bindings: RwLock<Vec<Binding>>,
}

impl InMemoryBindingRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            bindings: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryBindingRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingRepository for InMemoryBindingRepository {
    fn find(&self, key: &BindingKey) -> Option<Binding> {
        self.bindings
            .read()
            .iter()
            .find(|b| b.key() == *key)
            .cloned()
    }

    fn insert(&self, binding: Binding) {
        self.bindings.write().push(binding);
    }

    fn remove(&self, key: &BindingKey) -> Option<Binding> {
        let mut bindings = self.bindings.write();
        let idx = bindings.iter().position(|b| b.key() == *key)?;
        Some(bindings.remove(idx))
    }

    fn list(&self) -> Vec<Binding> {
        self.bindings.read().clone()
    }

    fn count(&self) -> usize {
        self.bindings.read().len()
    }
}
