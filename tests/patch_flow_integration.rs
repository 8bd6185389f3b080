//! Integration tests for the patch panel
//!
//! Runs the HTTP API, the engine and the real TCP switch channel against a
//! fake OpenFlow switch listening on an ephemeral port.

use parking_lot::Mutex;
use patch_panel::adapters::inbound::ApiServer;
use patch_panel::adapters::outbound::openflow::{codec, supported_adapters};
use patch_panel::adapters::outbound::{
    DashMapSwitchDirectory, InMemoryBindingRepository, TcpSwitchChannel, XidGenerator,
};
use patch_panel::infrastructure::ShutdownController;
use patch_panel::{BindingKey, PatchPanelService, ProtocolAdapters, ProtocolVersion, SwitchHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ===== Fake Switch =====

#[derive(Clone, Copy)]
enum Behavior {
    /// Apply every flow-mod and answer the barrier.
    Accept,
    /// Answer every flow-mod with OFPET_FLOW_MOD_FAILED.
    Reject,
    /// Complete the handshake, then never answer.
    Stall,
    /// Apply every flow-mod, but hold the barrier reply back for a while.
    Slow(Duration),
}

struct FakeSwitch {
    addr: SocketAddr,
    flow_mods: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl FakeSwitch {
    async fn start(version: ProtocolVersion, behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let flow_mods = Arc::new(Mutex::new(Vec::new()));

        let recorded = flow_mods.clone();
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    let _ = serve_connection(socket, version, behavior, recorded).await;
                });
            }
        });

        Self { addr, flow_mods }
    }

    fn handle(&self, dpid: u64, version: ProtocolVersion) -> SwitchHandle {
        SwitchHandle::new(dpid, version, self.addr.to_string())
    }

    fn flow_mods(&self) -> Vec<Vec<u8>> {
        self.flow_mods.lock().clone()
    }
}

async fn read_frame(socket: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut frame = vec![0u8; codec::HEADER_LEN];
    socket.read_exact(&mut frame).await?;
    let length = u16::from_be_bytes([frame[2], frame[3]]) as usize;
    frame.resize(length, 0);
    socket.read_exact(&mut frame[codec::HEADER_LEN..]).await?;
    Ok(frame)
}

fn xid_of(frame: &[u8]) -> u32 {
    u32::from_be_bytes([frame[4], frame[5], frame[6], frame[7]])
}

async fn serve_connection(
    mut socket: TcpStream,
    version: ProtocolVersion,
    behavior: Behavior,
    recorded: Arc<Mutex<Vec<Vec<u8>>>>,
) -> std::io::Result<()> {
    let hello = read_frame(&mut socket).await?;
    assert_eq!(hello[1], codec::OFPT_HELLO);
    socket.write_all(&codec::encode_hello(version, 1)).await?;

    if let Behavior::Stall = behavior {
        tokio::time::sleep(Duration::from_secs(30)).await;
        return Ok(());
    }

    let flow_mod = read_frame(&mut socket).await?;
    let barrier = read_frame(&mut socket).await?;
    let (_, barrier_reply) = codec::barrier_types(version);

    match behavior {
        Behavior::Accept | Behavior::Slow(_) => {
            recorded.lock().push(flow_mod);
            if let Behavior::Slow(delay) = behavior {
                tokio::time::sleep(delay).await;
            }
            socket
                .write_all(&codec::encode_empty(version, barrier_reply, xid_of(&barrier)))
                .await?;
        }
        Behavior::Reject => {
            let mut error = vec![version.wire_version(), codec::OFPT_ERROR, 0, 12];
            error.extend_from_slice(&xid_of(&flow_mod).to_be_bytes());
            error.extend_from_slice(&[0, 5, 0, 0]);
            socket.write_all(&error).await?;
        }
        Behavior::Stall => unreachable!(),
    }
    Ok(())
}

// ===== Test Stack =====

struct TestStack {
    base: String,
    client: reqwest::Client,
    service: Arc<PatchPanelService>,
    shutdown: ShutdownController,
}

impl TestStack {
    async fn start(switches: Vec<SwitchHandle>, adapter_timeout: Duration) -> Self {
        let directory = Arc::new(DashMapSwitchDirectory::with_switches(switches));
        let xids = Arc::new(XidGenerator::new());
        let channel = Arc::new(TcpSwitchChannel::new(xids.clone()));
        let adapters: ProtocolAdapters = supported_adapters(channel, xids).into_iter().collect();
        let service = Arc::new(
            PatchPanelService::new(
                directory,
                Arc::new(InMemoryBindingRepository::new()),
                adapters,
            )
            .with_adapter_timeout(adapter_timeout),
        );

        let shutdown = ShutdownController::new();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = ApiServer::new(addr.to_string(), service.clone())
            .with_shutdown(shutdown.clone());
        tokio::spawn(async move { server.serve(listener).await });

        Self {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
            service,
            shutdown,
        }
    }

    async fn put_flow(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .put(format!("{}/patch/flow", self.base))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn delete_flow(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .delete(format!("{}/patch/flow", self.base))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn list_flows(&self) -> serde_json::Value {
        self.client
            .get(format!("{}/patch/flow", self.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }
}

impl Drop for TestStack {
    fn drop(&mut self) {
        self.shutdown.shutdown();
    }
}

const TIMEOUT: Duration = Duration::from_secs(2);

// ===== Lifecycle Tests =====

#[tokio::test]
async fn test_patch_lifecycle_openflow13() {
    let switch = FakeSwitch::start(ProtocolVersion::OpenFlow13, Behavior::Accept).await;
    let stack =
        TestStack::start(vec![switch.handle(1, ProtocolVersion::OpenFlow13)], TIMEOUT).await;

    let resp = stack
        .put_flow(serde_json::json!({"dpid": 1, "inport": 1, "outport": 2}))
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.json::<serde_json::Value>().await.unwrap(),
        serde_json::json!({"dpid": 1, "inport": 1, "outport": 2})
    );
    assert_eq!(
        stack.list_flows().await,
        serde_json::json!([{"dpid": 1, "inport": 1, "outport": 2}])
    );

    let resp = stack
        .delete_flow(serde_json::json!({"dpid": 1, "inport": 1, "outport": 2}))
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(stack.list_flows().await, serde_json::json!([]));

    let flow_mods = switch.flow_mods();
    assert_eq!(flow_mods.len(), 2);

    // Add with one output action, then a match-only delete
    assert_eq!(flow_mods[0][0], 0x04);
    assert_eq!(flow_mods[0][1], codec::OFPT_FLOW_MOD);
    assert_eq!(flow_mods[0][25], 0);
    assert_eq!(flow_mods[0].len(), 64 + 8 + 16);
    assert_eq!(flow_mods[1][25], 3);
    assert_eq!(flow_mods[1].len(), 64);
}

#[tokio::test]
async fn test_patch_with_mirror_openflow10() {
    let switch = FakeSwitch::start(ProtocolVersion::OpenFlow10, Behavior::Accept).await;
    let stack =
        TestStack::start(vec![switch.handle(7, ProtocolVersion::OpenFlow10)], TIMEOUT).await;

    let resp = stack
        .put_flow(serde_json::json!({"dpid": 7, "inport": 1, "outport": 2, "mirrorport": 3}))
        .await;
    assert_eq!(resp.status(), 200);

    let flow_mods = switch.flow_mods();
    assert_eq!(flow_mods.len(), 1);
    let fm = &flow_mods[0];
    assert_eq!(fm[0], 0x01);
    assert_eq!(fm.len(), 72 + 2 * 8);

    // in_port in the match, then outputs to 2 and 3 in that order
    assert_eq!(u16::from_be_bytes([fm[12], fm[13]]), 1);
    assert_eq!(u16::from_be_bytes([fm[76], fm[77]]), 2);
    assert_eq!(u16::from_be_bytes([fm[84], fm[85]]), 3);
}

#[tokio::test]
async fn test_delete_matches_on_inport_only() {
    let switch = FakeSwitch::start(ProtocolVersion::OpenFlow12, Behavior::Accept).await;
    let stack =
        TestStack::start(vec![switch.handle(2, ProtocolVersion::OpenFlow12)], TIMEOUT).await;

    assert_eq!(
        stack
            .put_flow(serde_json::json!({"dpid": 2, "inport": 5, "outport": 6, "mirrorport": 7}))
            .await
            .status(),
        200
    );

    let resp = stack
        .delete_flow(serde_json::json!({"dpid": 2, "inport": 5, "outport": 99}))
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.json::<serde_json::Value>().await.unwrap(),
        serde_json::json!({"dpid": 2, "inport": 5, "outport": 6, "mirrorport": 7})
    );
}

// ===== Failure Tests =====

#[tokio::test]
async fn test_unknown_device_is_bad_request() {
    let switch = FakeSwitch::start(ProtocolVersion::OpenFlow13, Behavior::Accept).await;
    let stack =
        TestStack::start(vec![switch.handle(1, ProtocolVersion::OpenFlow13)], TIMEOUT).await;

    let resp = stack
        .put_flow(serde_json::json!({"dpid": 99, "inport": 1, "outport": 2}))
        .await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("device not found"));
    assert!(switch.flow_mods().is_empty());
}

#[tokio::test]
async fn test_unsupported_version_is_not_implemented() {
    let stack = TestStack::start(Vec::new(), TIMEOUT).await;

    let resp = stack
        .client
        .post(format!("{}/switches", stack.base))
        .json(&serde_json::json!({"dpid": 4, "version": "1.4", "address": "127.0.0.1:6653"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = stack
        .put_flow(serde_json::json!({"dpid": 4, "inport": 1, "outport": 2}))
        .await;
    assert_eq!(resp.status(), 501);
    assert_eq!(stack.list_flows().await, serde_json::json!([]));
}

#[tokio::test]
async fn test_switch_rejection_is_bad_gateway() {
    let switch = FakeSwitch::start(ProtocolVersion::OpenFlow13, Behavior::Reject).await;
    let stack =
        TestStack::start(vec![switch.handle(1, ProtocolVersion::OpenFlow13)], TIMEOUT).await;

    let resp = stack
        .put_flow(serde_json::json!({"dpid": 1, "inport": 1, "outport": 2}))
        .await;
    assert_eq!(resp.status(), 502);
    assert_eq!(stack.list_flows().await, serde_json::json!([]));

    // The port stays free for a later attempt
    assert!(stack.service.list_bindings().is_empty());
}

#[tokio::test]
async fn test_stalled_switch_times_out() {
    let switch = FakeSwitch::start(ProtocolVersion::OpenFlow13, Behavior::Stall).await;
    let stack = TestStack::start(
        vec![switch.handle(1, ProtocolVersion::OpenFlow13)],
        Duration::from_millis(200),
    )
    .await;

    let resp = stack
        .put_flow(serde_json::json!({"dpid": 1, "inport": 1, "outport": 2}))
        .await;
    assert_eq!(resp.status(), 502);
    assert_eq!(stack.list_flows().await, serde_json::json!([]));
}

#[tokio::test]
async fn test_unreachable_switch_is_bad_gateway() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let stack = TestStack::start(
        vec![SwitchHandle::new(1, ProtocolVersion::OpenFlow10, addr.to_string())],
        TIMEOUT,
    )
    .await;

    let resp = stack
        .put_flow(serde_json::json!({"dpid": 1, "inport": 1, "outport": 2}))
        .await;
    assert_eq!(resp.status(), 502);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let stack = TestStack::start(Vec::new(), TIMEOUT).await;

    let resp = stack
        .client
        .put(format!("{}/patch/flow", stack.base))
        .body("{'dpid': 1, 'inport': 1, 'outport': 2}")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_create_survives_client_disconnect() {
    let switch = FakeSwitch::start(
        ProtocolVersion::OpenFlow13,
        Behavior::Slow(Duration::from_millis(300)),
    )
    .await;
    let stack =
        TestStack::start(vec![switch.handle(1, ProtocolVersion::OpenFlow13)], TIMEOUT).await;

    // The client hangs up before the switch acknowledges the flow-mod
    let impatient = reqwest::Client::builder()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let result = impatient
        .put(format!("{}/patch/flow", stack.base))
        .json(&serde_json::json!({"dpid": 1, "inport": 1, "outport": 2}))
        .send()
        .await;
    assert!(result.is_err());

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(switch.flow_mods().len(), 1);
    assert_eq!(
        stack.list_flows().await,
        serde_json::json!([{"dpid": 1, "inport": 1, "outport": 2}])
    );

    // The rule on the switch stays removable through the API
    let resp = stack
        .delete_flow(serde_json::json!({"dpid": 1, "inport": 1, "outport": 2}))
        .await;
    assert_eq!(resp.status(), 200);
}

// ===== Concurrency Tests =====

#[tokio::test]
async fn test_concurrent_puts_on_same_inport() {
    let switch = FakeSwitch::start(ProtocolVersion::OpenFlow13, Behavior::Accept).await;
    let stack =
        TestStack::start(vec![switch.handle(1, ProtocolVersion::OpenFlow13)], TIMEOUT).await;

    let requests = (0..8).map(|i| {
        stack.put_flow(serde_json::json!({"dpid": 1, "inport": 1, "outport": 10 + i}))
    });
    let responses = futures::future::join_all(requests).await;

    let ok = responses.iter().filter(|r| r.status() == 200).count();
    let rejected = responses.iter().filter(|r| r.status() == 400).count();
    assert_eq!(ok, 1);
    assert_eq!(rejected, 7);
    assert_eq!(switch.flow_mods().len(), 1);
    assert_eq!(stack.service.binding_count(), 1);
}

#[tokio::test]
async fn test_concurrent_puts_on_distinct_inports() {
    let switch = FakeSwitch::start(ProtocolVersion::OpenFlow10, Behavior::Accept).await;
    let stack =
        TestStack::start(vec![switch.handle(1, ProtocolVersion::OpenFlow10)], TIMEOUT).await;

    let requests = (1..=5).map(|inport| {
        stack.put_flow(serde_json::json!({"dpid": 1, "inport": inport, "outport": 100}))
    });
    let responses = futures::future::join_all(requests).await;

    assert!(responses.iter().all(|r| r.status() == 200));
    assert_eq!(stack.service.binding_count(), 5);

    let removed = tokio_test::assert_ok!(stack.service.delete_binding(BindingKey::new(1, 3)).await);
    assert_eq!(removed.outport, 100);
    assert_eq!(stack.service.binding_count(), 4);
}

// ===== Health Tests =====

#[tokio::test]
async fn test_health_reports_counts() {
    let switch = FakeSwitch::start(ProtocolVersion::OpenFlow13, Behavior::Accept).await;
    let stack =
        TestStack::start(vec![switch.handle(1, ProtocolVersion::OpenFlow13)], TIMEOUT).await;

    stack
        .put_flow(serde_json::json!({"dpid": 1, "inport": 1, "outport": 2}))
        .await;

    let body: serde_json::Value = stack
        .client
        .get(format!("{}/health", stack.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["bindings"], 1);
    assert_eq!(body["switches"], 1);
}
