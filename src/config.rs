use crate::domain::entities::SwitchHandle;
use crate::domain::value_objects::{DeviceId, ProtocolVersion, UnknownVersion};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub adapter_timeout_ms: u64,
    /// Switches known at startup.
    pub switches: Vec<SwitchHandle>,
    pub debug: bool,
}

impl Config {
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_millis(self.adapter_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            adapter_timeout_ms: 5000,
            switches: Vec::new(),
            debug: false,
        }
    }
}

/// Invalid `PATCHPANEL_SWITCHES` entry.
#[derive(Debug, thiserror::Error)]
#[error("invalid switch entry {entry:?}: {reason}")]
pub struct SwitchEntryError {
    pub entry: String,
    pub reason: String,
}

impl SwitchEntryError {
    fn new(entry: &str, reason: impl Into<String>) -> Self {
        Self {
            entry: entry.to_string(),
            reason: reason.into(),
        }
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Build the configuration from an arbitrary variable source.
pub fn load_config_from<F>(var: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let listen_addr =
        var("PATCHPANEL_LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());

    let adapter_timeout_ms = var("PATCHPANEL_ADAPTER_TIMEOUT_MS")
        .unwrap_or_else(|| "5000".to_string())
        .parse()
        .unwrap_or(5000);

    let switches = match var("PATCHPANEL_SWITCHES") {
        Some(list) => parse_switches(&list)?,
        None => Vec::new(),
    };

    let debug = var("DEBUG").is_some();

    Ok(Config {
        listen_addr,
        adapter_timeout_ms,
        switches,
        debug,
    })
}

/// Parse a comma separated list of `dpid=version@host:port` entries.
pub fn parse_switches(list: &str) -> Result<Vec<SwitchHandle>, SwitchEntryError> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_switch)
        .collect()
}

fn parse_switch(entry: &str) -> Result<SwitchHandle, SwitchEntryError> {
    let (dpid, rest) = entry
        .split_once('=')
        .ok_or_else(|| SwitchEntryError::new(entry, "expected dpid=version@host:port"))?;
    let (version, address) = rest
        .split_once('@')
        .ok_or_else(|| SwitchEntryError::new(entry, "missing @host:port"))?;

    let dpid =
        parse_dpid(dpid.trim()).ok_or_else(|| SwitchEntryError::new(entry, "bad dpid"))?;
    let version: ProtocolVersion = version
        .trim()
        .parse()
        .map_err(|e: UnknownVersion| SwitchEntryError::new(entry, e.to_string()))?;

    let address = address.trim();
    if !SwitchHandle::is_valid_address(address) {
        return Err(SwitchEntryError::new(entry, "address must be host:port"));
    }

    Ok(SwitchHandle::new(dpid, version, address))
}

fn parse_dpid(s: &str) -> Option<DeviceId> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => DeviceId::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}
