//! Patch Panel Library
//!
//! Port-to-port patching for OpenFlow switches: a binding registry, a
//! protocol dispatch engine and the HTTP API in front of them. Exposed as a
//! library for integration tests and embedding.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{PatchPanelService, ProtocolAdapters};
pub use config::load_config;
pub use domain::entities::{Binding, BindingKey, FlowRule, SwitchHandle};
pub use domain::error::{AdapterError, PatchError};
pub use domain::ports::{BindingRepository, ProtocolAdapter, SwitchChannel, SwitchDirectory};
pub use domain::services::RuleBuilder;
pub use domain::value_objects::{DeviceId, PortNo, ProtocolVersion};
