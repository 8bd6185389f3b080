//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the patch panel.
//! They have no dependencies on transport or wire formats.

use crate::domain::value_objects::{DeviceId, PortNo, ProtocolVersion};
use serde::{Deserialize, Serialize};

/// A port-to-port forwarding binding on one switch.
///
/// Traffic entering `inport` is forwarded to `outport`, and additionally
/// to `mirrorport` when one is set. The serialized field names are the
/// ones exchanged with operators over the REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Binding {
    /// Datapath id of the switch
    pub dpid: DeviceId,
    /// Ingress port, unique per switch among active bindings
    pub inport: PortNo,
    /// Primary egress port
    pub outport: PortNo,
    /// Optional second egress port receiving a copy of the traffic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirrorport: Option<PortNo>,
}

impl Binding {
    pub fn new(dpid: DeviceId, inport: PortNo, outport: PortNo) -> Self {
        Self {
            dpid,
            inport,
            outport,
            mirrorport: None,
        }
    }

    /// Add a mirror port to the binding.
    pub fn with_mirror(mut self, mirrorport: PortNo) -> Self {
        self.mirrorport = Some(mirrorport);
        self
    }

    /// Key under which the binding is exclusive.
    pub fn key(&self) -> BindingKey {
        BindingKey::new(self.dpid, self.inport)
    }
}

/// Exclusivity key of a binding: one binding per ingress port per switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingKey {
    pub dpid: DeviceId,
    pub inport: PortNo,
}

impl BindingKey {
    pub fn new(dpid: DeviceId, inport: PortNo) -> Self {
        Self { dpid, inport }
    }
}

/// Forwarding action of a flow rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowAction {
    /// Send the packet out of a port
    Output(PortNo),
}

/// Protocol-independent description of a forwarding rule.
///
/// Only ever built transiently from a binding to drive a protocol adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRule {
    /// Match predicate: ingress port
    pub in_port: PortNo,
    /// Actions in application order
    pub actions: Vec<FlowAction>,
}

impl FlowRule {
    /// A rule matching `in_port` with no actions.
    pub fn matching(in_port: PortNo) -> Self {
        Self {
            in_port,
            actions: Vec::new(),
        }
    }

    pub fn with_output(mut self, port: PortNo) -> Self {
        self.actions.push(FlowAction::Output(port));
        self
    }
}

/// Operation requested from a protocol adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowCommand {
    Add,
    Delete,
}

/// A switch known to the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchHandle {
    /// Datapath id
    pub dpid: DeviceId,
    /// Negotiated OpenFlow version
    pub version: ProtocolVersion,
    /// Management address the switch accepts OpenFlow connections on
    pub address: String,
}

impl SwitchHandle {
    pub fn new(dpid: DeviceId, version: ProtocolVersion, address: impl Into<String>) -> Self {
        Self {
            dpid,
            version,
            address: address.into(),
        }
    }

    /// Whether `address` is `host:port` with a non-empty host and a
    /// numeric port.
    pub fn is_valid_address(address: &str) -> bool {
        match address.rsplit_once(':') {
            Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
            None => false,
        }
    }
}
