//! Adapters Layer
//!
//! Inbound adapters drive the application (HTTP API); outbound adapters
//! implement domain ports (registry storage, switch directory, OpenFlow).

pub mod inbound;
pub mod outbound;
