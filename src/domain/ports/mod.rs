mod binding_repository;
mod protocol_adapter;
mod switch_channel;
mod switch_directory;

pub use binding_repository::BindingRepository;
pub use protocol_adapter::ProtocolAdapter;
pub use switch_channel::SwitchChannel;
pub use switch_directory::SwitchDirectory;
