//! Patch Panel - OpenFlow port patching service
//!
//! This is the composition root that wires together all the components.

use patch_panel::adapters::inbound::ApiServer;
use patch_panel::adapters::outbound::openflow::supported_adapters;
use patch_panel::adapters::outbound::{
    DashMapSwitchDirectory, InMemoryBindingRepository, TcpSwitchChannel, XidGenerator,
};
use patch_panel::application::{PatchPanelService, ProtocolAdapters};
use patch_panel::config::load_config;
use patch_panel::infrastructure::{shutdown_signal, ShutdownController};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!(
        "starting patch panel listen={} adapter_timeout={}ms",
        cfg.listen_addr,
        cfg.adapter_timeout_ms
    );

    // ===== COMPOSITION ROOT =====
    // Wire up all adapters and services

    // 1. Create outbound adapters

    // Switch directory (DashMap), seeded from configuration
    let directory = Arc::new(DashMapSwitchDirectory::with_switches(cfg.switches.clone()));

    // Binding registry (in memory, insertion ordered)
    let bindings = Arc::new(InMemoryBindingRepository::new());

    // OpenFlow adapters over one TCP channel and xid space
    let xids = Arc::new(XidGenerator::new());
    let channel = Arc::new(TcpSwitchChannel::new(xids.clone()));
    let adapters: ProtocolAdapters = supported_adapters(channel, xids).into_iter().collect();
    tracing::info!("protocol adapters: {:?}", adapters.versions());

    // 2. Create application service
    let service = Arc::new(
        PatchPanelService::new(directory, bindings, adapters)
            .with_adapter_timeout(cfg.adapter_timeout()),
    );

    // 3. Create inbound adapter and run until shutdown
    let shutdown = ShutdownController::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let server = ApiServer::new(cfg.listen_addr, service).with_shutdown(shutdown);
    server.run().await
}
