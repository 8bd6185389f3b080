//! Switch Channel Port
//!
//! Defines how encoded control messages reach a switch.

use crate::domain::entities::SwitchHandle;
use crate::domain::error::AdapterError;
use async_trait::async_trait;
use bytes::Bytes;

/// Delivers one encoded OpenFlow message to a switch.
///
/// Returns once the switch has confirmed it processed the message
/// (barrier reply) or reported an error for it.
#[async_trait]
pub trait SwitchChannel: Send + Sync {
    async fn deliver(&self, switch: &SwitchHandle, message: Bytes) -> Result<(), AdapterError>;
}
