//! Domain Errors
//!
//! Typed failures of the patch panel. Every failure leaves the binding
//! registry consistent with switch state.

use crate::domain::value_objects::{DeviceId, PortNo, ProtocolVersion};
use std::time::Duration;
use thiserror::Error;

/// Failure of a patch panel operation.
#[derive(Debug, Error)]
pub enum PatchError {
    /// Request body could not be decoded into a binding request
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// The switch is not present in the directory
    #[error("device not found: dpid={0}")]
    DeviceNotFound(DeviceId),

    /// The ingress port already carries a binding
    #[error("port already in use: dpid={dpid}, inport={inport}")]
    PortInUse { dpid: DeviceId, inport: PortNo },

    /// No binding exists for the ingress port
    #[error("binding not found: dpid={dpid}, inport={inport}")]
    BindingNotFound { dpid: DeviceId, inport: PortNo },

    /// No adapter is installed for the switch's protocol version
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(ProtocolVersion),

    /// The adapter failed to install the rule
    #[error("flow installation failed: {0}")]
    InstallationFailed(#[source] AdapterError),

    /// The adapter failed to remove the rule
    #[error("flow removal failed: {0}")]
    RemovalFailed(#[source] AdapterError),
}

/// Failure reported by a protocol adapter or its switch channel.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The rule cannot be expressed in this protocol version
    #[error("cannot encode flow: {0}")]
    Encode(String),

    /// Connection-level failure talking to the switch
    #[error("switch I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The switch answered with an OpenFlow error message
    #[error("switch rejected flow: type={err_type}, code={err_code}")]
    Rejected { err_type: u16, err_code: u16 },

    /// The switch sent something we could not make sense of
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The adapter did not finish in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The task running the operation panicked or was cancelled
    #[error("operation aborted: {0}")]
    Aborted(String),
}
