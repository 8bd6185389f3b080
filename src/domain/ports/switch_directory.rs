//! Switch Directory Port
//!
//! Defines the interface for looking up connected switches.

use crate::domain::entities::SwitchHandle;
use crate::domain::value_objects::DeviceId;

/// Directory of switches the patch panel can program.
pub trait SwitchDirectory: Send + Sync {
    /// Look up a switch by datapath id.
    fn lookup(&self, dpid: DeviceId) -> Option<SwitchHandle>;

    /// Add or replace a switch.
    fn register(&self, handle: SwitchHandle);

    /// Remove a switch, returning its handle if it was known.
    fn unregister(&self, dpid: DeviceId) -> Option<SwitchHandle>;

    /// All known switches ordered by datapath id.
    fn list(&self) -> Vec<SwitchHandle>;
}
