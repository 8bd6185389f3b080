mod dashmap_switch_directory;
mod in_memory_binding_repo;
pub mod openflow;

pub use dashmap_switch_directory::DashMapSwitchDirectory;
pub use in_memory_binding_repo::InMemoryBindingRepository;
pub use openflow::{
    OpenFlow10Adapter, OpenFlow12Adapter, OpenFlow13Adapter, TcpSwitchChannel, XidGenerator,
};
