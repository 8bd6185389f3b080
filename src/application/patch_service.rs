//! Patch Panel Service - Main application use case
//!
//! Validates binding requests against the switch directory and the binding
//! repository, realizes them through the protocol adapter matching the
//! switch's version, and commits the repository only after the switch
//! confirmed the change.

use crate::application::ProtocolAdapters;
use crate::domain::entities::{Binding, BindingKey, SwitchHandle};
use crate::domain::error::{AdapterError, PatchError};
use crate::domain::ports::{BindingRepository, ProtocolAdapter, SwitchDirectory};
use crate::domain::services::RuleBuilder;
use crate::domain::value_objects::DeviceId;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Bound on a single adapter call unless configured otherwise.
pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(5);

/// Patch panel service - main application use case.
///
/// Create and delete run as one critical section per device: the directory
/// lookup, validation, the adapter call and the repository commit all
/// happen under the device's lock, so two requests racing for the same
/// ingress port cannot both succeed. Each critical section runs on its own
/// task and finishes even if the caller stops waiting for it. Listing takes
/// no device lock and sees a snapshot.
#[derive(Clone)]
pub struct PatchPanelService {
    directory: Arc<dyn SwitchDirectory>,
    bindings: Arc<dyn BindingRepository>,
    adapters: Arc<ProtocolAdapters>,
    device_locks: Arc<DashMap<DeviceId, Arc<Mutex<()>>>>,
    adapter_timeout: Duration,
}

impl PatchPanelService {
    /// Create a new patch panel service.
    pub fn new(
        directory: Arc<dyn SwitchDirectory>,
        bindings: Arc<dyn BindingRepository>,
        adapters: ProtocolAdapters,
    ) -> Self {
        Self {
            directory,
            bindings,
            adapters: Arc::new(adapters),
            device_locks: Arc::new(DashMap::new()),
            adapter_timeout: DEFAULT_ADAPTER_TIMEOUT,
        }
    }

    /// Override the bound on each adapter call.
    pub fn with_adapter_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout = timeout;
        self
    }

    /// Create a binding and install its forwarding rule.
    ///
    /// Fails with `PortInUse` whenever the ingress port is already bound on
    /// the device, even if the egress ports are identical.
    pub async fn create_binding(&self, request: Binding) -> Result<Binding, PatchError> {
        // Unknown devices fail without touching the lock table
        self.lookup_switch(request.dpid)?;

        let service = self.clone();
        tokio::spawn(async move { service.create_locked(request).await })
            .await
            .unwrap_or_else(|e| {
                tracing::error!("create task failed: {}", e);
                Err(PatchError::InstallationFailed(AdapterError::Aborted(
                    e.to_string(),
                )))
            })
    }

    /// Delete the binding stored for `key` and remove its forwarding rule.
    ///
    /// Only the device and ingress port identify the binding; the stored
    /// binding is returned.
    pub async fn delete_binding(&self, key: BindingKey) -> Result<Binding, PatchError> {
        self.lookup_switch(key.dpid)?;

        let service = self.clone();
        tokio::spawn(async move { service.delete_locked(key).await })
            .await
            .unwrap_or_else(|e| {
                tracing::error!("delete task failed: {}", e);
                Err(PatchError::RemovalFailed(AdapterError::Aborted(e.to_string())))
            })
    }

    async fn create_locked(&self, request: Binding) -> Result<Binding, PatchError> {
        let lock = self.device_lock(request.dpid);
        let _guard = lock.lock().await;

        // The switch may have been re-registered while we waited
        let switch = self.lookup_switch(request.dpid)?;

        let key = request.key();
        if self.bindings.find(&key).is_some() {
            tracing::info!(
                "requested inport is already used (dpid:{}, inport:{})",
                key.dpid,
                key.inport
            );
            return Err(PatchError::PortInUse {
                dpid: key.dpid,
                inport: key.inport,
            });
        }

        let rule = RuleBuilder::install_rule(&request);
        let adapter = self.select_adapter(&switch)?;

        self.bounded(adapter.install(&switch, &rule))
            .await
            .map_err(|e| {
                tracing::warn!(
                    "failed to install flow on dpid={} inport={}: {}",
                    key.dpid,
                    key.inport,
                    e
                );
                PatchError::InstallationFailed(e)
            })?;

        self.bindings.insert(request.clone());
        tracing::info!(
            "patched dpid={} inport={} -> outport={} mirrorport={:?} ({})",
            request.dpid,
            request.inport,
            request.outport,
            request.mirrorport,
            switch.version
        );
        Ok(request)
    }

    async fn delete_locked(&self, key: BindingKey) -> Result<Binding, PatchError> {
        let lock = self.device_lock(key.dpid);
        let _guard = lock.lock().await;

        let switch = self.lookup_switch(key.dpid)?;

        if self.bindings.find(&key).is_none() {
            tracing::info!(
                "requested inport is not used (dpid:{}, inport:{})",
                key.dpid,
                key.inport
            );
            return Err(PatchError::BindingNotFound {
                dpid: key.dpid,
                inport: key.inport,
            });
        }

        let rule = RuleBuilder::removal_rule(&key);
        let adapter = self.select_adapter(&switch)?;

        self.bounded(adapter.uninstall(&switch, &rule))
            .await
            .map_err(|e| {
                tracing::warn!(
                    "failed to remove flow on dpid={} inport={}: {}",
                    key.dpid,
                    key.inport,
                    e
                );
                PatchError::RemovalFailed(e)
            })?;

        let removed = self
            .bindings
            .remove(&key)
            .ok_or(PatchError::BindingNotFound {
                dpid: key.dpid,
                inport: key.inport,
            })?;
        tracing::info!("unpatched dpid={} inport={}", key.dpid, key.inport);
        Ok(removed)
    }

    /// All active bindings in creation order.
    pub fn list_bindings(&self) -> Vec<Binding> {
        self.bindings.list()
    }

    /// Number of active bindings.
    pub fn binding_count(&self) -> usize {
        self.bindings.count()
    }

    /// Add or replace a switch in the directory.
    pub fn register_switch(&self, handle: SwitchHandle) {
        self.directory.register(handle);
    }

    /// Remove a switch from the directory. Its bindings are kept.
    pub fn unregister_switch(&self, dpid: DeviceId) -> Option<SwitchHandle> {
        self.directory.unregister(dpid)
    }

    /// All known switches.
    pub fn switches(&self) -> Vec<SwitchHandle> {
        self.directory.list()
    }

    fn lookup_switch(&self, dpid: DeviceId) -> Result<SwitchHandle, PatchError> {
        self.directory.lookup(dpid).ok_or_else(|| {
            tracing::info!("unknown datapath: dpid={}", dpid);
            PatchError::DeviceNotFound(dpid)
        })
    }

    fn select_adapter(
        &self,
        switch: &SwitchHandle,
    ) -> Result<Arc<dyn ProtocolAdapter>, PatchError> {
        self.adapters.get(switch.version).ok_or_else(|| {
            tracing::info!(
                "unsupported OpenFlow protocol {} on dpid={}",
                switch.version,
                switch.dpid
            );
            PatchError::UnsupportedProtocol(switch.version)
        })
    }

    fn device_lock(&self, dpid: DeviceId) -> Arc<Mutex<()>> {
        self.device_locks.entry(dpid).or_default().clone()
    }

    async fn bounded<F>(&self, call: F) -> Result<(), AdapterError>
    where
        F: Future<Output = Result<(), AdapterError>>,
    {
        match tokio::time::timeout(self.adapter_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::Timeout(self.adapter_timeout)),
        }
    }
}
