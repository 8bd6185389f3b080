//! Application Layer
//!
//! Use cases orchestrating domain ports.

mod adapter_registry;
mod patch_service;

pub use adapter_registry::ProtocolAdapters;
pub use patch_service::{PatchPanelService, DEFAULT_ADAPTER_TIMEOUT};
