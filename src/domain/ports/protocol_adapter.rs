//! Protocol Adapter Port
//!
//! Defines the interface for installing and removing forwarding rules
//! using one specific OpenFlow version.

use crate::domain::entities::{FlowRule, SwitchHandle};
use crate::domain::error::AdapterError;
use crate::domain::value_objects::ProtocolVersion;
use async_trait::async_trait;

/// Translates abstract flow rules into one protocol version's messages.
///
/// Both operations complete only once the switch has acknowledged the
/// change or failed; there are no partial results.
#[async_trait]
pub trait ProtocolAdapter: Send + Sync {
    /// Protocol version this adapter speaks.
    fn version(&self) -> ProtocolVersion;

    /// Install `rule` on the switch.
    async fn install(&self, switch: &SwitchHandle, rule: &FlowRule) -> Result<(), AdapterError>;

    /// Remove every rule with `rule`'s match from the switch. Actions are
    /// ignored.
    async fn uninstall(&self, switch: &SwitchHandle, rule: &FlowRule) -> Result<(), AdapterError>;
}
