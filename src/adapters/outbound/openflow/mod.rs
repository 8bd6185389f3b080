//! OpenFlow outbound adapters: wire codec, per-version protocol adapters
//! and the TCP channel that carries their messages to switches.

mod adapter;
pub mod codec;
mod tcp_channel;

pub use adapter::{OpenFlow10Adapter, OpenFlow12Adapter, OpenFlow13Adapter, XidGenerator};
pub use tcp_channel::{transact, TcpSwitchChannel};

use crate::domain::ports::{ProtocolAdapter, SwitchChannel};
use std::sync::Arc;

/// Adapters for every OpenFlow version the patch panel supports
/// (1.0, 1.2 and 1.3), all sharing one channel and xid space.
pub fn supported_adapters(
    channel: Arc<dyn SwitchChannel>,
    xids: Arc<XidGenerator>,
) -> Vec<Arc<dyn ProtocolAdapter>> {
    vec![
        Arc::new(OpenFlow10Adapter::new(channel.clone(), xids.clone())),
        Arc::new(OpenFlow12Adapter::new(channel.clone(), xids.clone())),
        Arc::new(OpenFlow13Adapter::new(channel, xids)),
    ]
}
