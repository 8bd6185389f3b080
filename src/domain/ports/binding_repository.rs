//! Binding Repository Port
//!
//! Defines the interface for the set of active port-to-port bindings.
//! The repository mirrors rules installed on switches; it does not
//! validate what it is given.

use crate::domain::entities::{Binding, BindingKey};

/// Ordered collection of active bindings.
///
/// Callers must check `find` before `insert`: the repository does not
/// enforce one binding per ingress port on its own.
pub trait BindingRepository: Send + Sync {
    /// Get the binding for an ingress port, if one exists.
    fn find(&self, key: &BindingKey) -> Option<Binding>;

    /// Append a binding.
    fn insert(&self, binding: Binding);

    /// Remove the binding stored under `key`, returning it.
    fn remove(&self, key: &BindingKey) -> Option<Binding>;

    /// Snapshot of all bindings in insertion order.
    fn list(&self) -> Vec<Binding>;

    /// Number of active bindings.
    fn count(&self) -> usize;
}
