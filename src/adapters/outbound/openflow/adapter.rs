//! OpenFlow Protocol Adapters
//!
//! One ProtocolAdapter per supported OpenFlow version. Each encodes the
//! flow-mod for its version and hands it to a switch channel.

use super::codec;
use crate::domain::entities::{FlowCommand, FlowRule, SwitchHandle};
use crate::domain::error::AdapterError;
use crate::domain::ports::{ProtocolAdapter, SwitchChannel};
use crate::domain::value_objects::ProtocolVersion;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Transaction id source shared by the adapters of one channel.
#[derive(Debug, Default)]
pub struct XidGenerator {
    next: AtomicU32,
}

impl XidGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    /// Next transaction id. Wraps, skipping zero.
    pub fn next(&self) -> u32 {
        loop {
            let xid = self.next.fetch_add(1, Ordering::Relaxed);
            if xid != 0 {
                return xid;
            }
        }
    }
}

/// Checks that the switch speaks the adapter's version, then delivers.
async fn send_flow_mod(
    channel: &dyn SwitchChannel,
    expected: ProtocolVersion,
    switch: &SwitchHandle,
    message: Result<bytes::Bytes, AdapterError>,
) -> Result<(), AdapterError> {
    if switch.version != expected {
        return Err(AdapterError::Protocol(format!(
            "switch dpid={} speaks {}, adapter speaks {}",
            switch.dpid, switch.version, expected
        )));
    }
    channel.deliver(switch, message?).await
}

/// OpenFlow 1.0 adapter.
pub struct OpenFlow10Adapter {
    channel: Arc<dyn SwitchChannel>,
    xids: Arc<XidGenerator>,
}

impl OpenFlow10Adapter {
    pub fn new(channel: Arc<dyn SwitchChannel>, xids: Arc<XidGenerator>) -> Self {
        Self { channel, xids }
    }
}

#[async_trait]
impl ProtocolAdapter for OpenFlow10Adapter {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::OpenFlow10
    }

    async fn install(&self, switch: &SwitchHandle, rule: &FlowRule) -> Result<(), AdapterError> {
        let message = codec::encode_flow_mod_v10(FlowCommand::Add, rule, self.xids.next());
        send_flow_mod(self.channel.as_ref(), self.version(), switch, message).await
    }

    async fn uninstall(&self, switch: &SwitchHandle, rule: &FlowRule) -> Result<(), AdapterError> {
        let message = codec::encode_flow_mod_v10(FlowCommand::Delete, rule, self.xids.next());
        send_flow_mod(self.channel.as_ref(), self.version(), switch, message).await
    }
}

/// OpenFlow 1.2 adapter.
pub struct OpenFlow12Adapter {
    channel: Arc<dyn SwitchChannel>,
    xids: Arc<XidGenerator>,
}

impl OpenFlow12Adapter {
    pub fn new(channel: Arc<dyn SwitchChannel>, xids: Arc<XidGenerator>) -> Self {
        Self { channel, xids }
    }
}

#[async_trait]
impl ProtocolAdapter for OpenFlow12Adapter {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::OpenFlow12
    }

    async fn install(&self, switch: &SwitchHandle, rule: &FlowRule) -> Result<(), AdapterError> {
        let message = codec::encode_flow_mod_oxm(
            self.version(),
            FlowCommand::Add,
            rule,
            self.xids.next(),
        );
        send_flow_mod(self.channel.as_ref(), self.version(), switch, message).await
    }

    async fn uninstall(&self, switch: &SwitchHandle, rule: &FlowRule) -> Result<(), AdapterError> {
        let message = codec::encode_flow_mod_oxm(
            self.version(),
            FlowCommand::Delete,
            rule,
            self.xids.next(),
        );
        send_flow_mod(self.channel.as_ref(), self.version(), switch, message).await
    }
}

/// OpenFlow 1.3 adapter.
pub struct OpenFlow13Adapter {
    channel: Arc<dyn SwitchChannel>,
    xids: Arc<XidGenerator>,
}

impl OpenFlow13Adapter {
    pub fn new(channel: Arc<dyn SwitchChannel>, xids: Arc<XidGenerator>) -> Self {
        Self { channel, xids }
    }
}

#[async_trait]
impl ProtocolAdapter for OpenFlow13Adapter {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::OpenFlow13
    }

    async fn install(&self, switch: &SwitchHandle, rule: &FlowRule) -> Result<(), AdapterError> {
        let message = codec::encode_flow_mod_oxm(
            self.version(),
            FlowCommand::Add,
            rule,
            self.xids.next(),
        );
        send_flow_mod(self.channel.as_ref(), self.version(), switch, message).await
    }

    async fn uninstall(&self, switch: &SwitchHandle, rule: &FlowRule) -> Result<(), AdapterError> {
        let message = codec::encode_flow_mod_oxm(
            self.version(),
            FlowCommand::Delete,
            rule,
            self.xids.next(),
        );
        send_flow_mod(self.channel.as_ref(), self.version(), switch, message).await
    }
}
