//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Datapath identifier of a switch.
pub type DeviceId = u64;

/// Switch port number.
///
/// Wide enough for OpenFlow 1.2+ ports; narrower protocol versions
/// validate the range when encoding.
pub type PortNo = u32;

/// OpenFlow protocol version negotiated with a switch.
///
/// Every released version is representable so that the directory can hold
/// switches whose version has no installed adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolVersion {
    OpenFlow10,
    OpenFlow11,
    OpenFlow12,
    OpenFlow13,
    OpenFlow14,
    OpenFlow15,
}

impl ProtocolVersion {
    /// Version byte carried in every OpenFlow header.
    pub fn wire_version(&self) -> u8 {
        match self {
            Self::OpenFlow10 => 0x01,
            Self::OpenFlow11 => 0x02,
            Self::OpenFlow12 => 0x03,
            Self::OpenFlow13 => 0x04,
            Self::OpenFlow14 => 0x05,
            Self::OpenFlow15 => 0x06,
        }
    }

    /// Map a header version byte back to a version.
    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::OpenFlow10),
            0x02 => Some(Self::OpenFlow11),
            0x03 => Some(Self::OpenFlow12),
            0x04 => Some(Self::OpenFlow13),
            0x05 => Some(Self::OpenFlow14),
            0x06 => Some(Self::OpenFlow15),
            _ => None,
        }
    }

    /// Dotted representation ("1.3").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenFlow10 => "1.0",
            Self::OpenFlow11 => "1.1",
            Self::OpenFlow12 => "1.2",
            Self::OpenFlow13 => "1.3",
            Self::OpenFlow14 => "1.4",
            Self::OpenFlow15 => "1.5",
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpenFlow {}", self.as_str())
    }
}

/// Error returned when a version string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown OpenFlow version: {0}")]
pub struct UnknownVersion(pub String);

impl FromStr for ProtocolVersion {
    type Err = UnknownVersion;

    /// Accepts "1.3", "13", "of13", "openflow13", "OpenFlow 1.3" and the
    /// hex wire byte ("0x04").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        if let Some(hex) = normalized.strip_prefix("0x") {
            return u8::from_str_radix(hex, 16)
                .ok()
                .and_then(Self::from_wire)
                .ok_or_else(|| UnknownVersion(s.to_string()));
        }

        let digits = normalized
            .trim_start_matches("openflow")
            .trim_start_matches("of")
            .trim_start_matches('v')
            .replace('.', "");

        match digits.as_str() {
            "10" => Ok(Self::OpenFlow10),
            "11" => Ok(Self::OpenFlow11),
            "12" => Ok(Self::OpenFlow12),
            "13" => Ok(Self::OpenFlow13),
            "14" => Ok(Self::OpenFlow14),
            "15" => Ok(Self::OpenFlow15),
            _ => Err(UnknownVersion(s.to_string())),
        }
    }
}

impl Serialize for ProtocolVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProtocolVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
