//! DashMap Switch Directory
//!
//! Implements SwitchDirectory using DashMap for lock-free concurrent access.

use crate::domain::entities::SwitchHandle;
use crate::domain::ports::SwitchDirectory;
use crate::domain::value_objects::DeviceId;
use dashmap::DashMap;

/// DashMap-backed switch directory.
pub struct DashMapSwitchDirectory {
    switches: DashMap<DeviceId, SwitchHandle>,
}

impl DashMapSwitchDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self {
            switches: DashMap::new(),
        }
    }

    /// Create a directory pre-populated with `handles`.
    pub fn with_switches(handles: impl IntoIterator<Item = SwitchHandle>) -> Self {
        let directory = Self::new();
        for handle in handles {
            directory.register(handle);
        }
        directory
    }

    pub fn len(&self) -> usize {
        self.switches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }
}

impl Default for DashMapSwitchDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl SwitchDirectory for DashMapSwitchDirectory {
    fn lookup(&self, dpid: DeviceId) -> Option<SwitchHandle> {
        self.switches.get(&dpid).map(|e| e.value().clone())
    }

    fn register(&self, handle: SwitchHandle) {
        tracing::info!(
            "connected datapath: dpid={} version={} address={}",
            handle.dpid,
            handle.version.as_str(),
            handle.address
        );
        self.switches.insert(handle.dpid, handle);
    }

    fn unregister(&self, dpid: DeviceId) -> Option<SwitchHandle> {
        let removed = self.switches.remove(&dpid).map(|(_, handle)| handle);
        if removed.is_some() {
            tracing::info!("disconnected datapath: dpid={}", dpid);
        }
        removed
    }

    fn list(&self) -> Vec<SwitchHandle> {
        let mut switches: Vec<SwitchHandle> =
            self.switches.iter().map(|e| e.value().clone()).collect();
        switches.sort_by_key(|s| s.dpid);
        switches
    }
}
