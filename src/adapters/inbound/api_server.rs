//! Patch Panel API Server
//!
//! HTTP API for operators to patch ports together and for registering the
//! switches the patch panel may program.

use crate::application::PatchPanelService;
use crate::domain::entities::{Binding, SwitchHandle};
use crate::domain::error::PatchError;
use crate::domain::value_objects::{DeviceId, ProtocolVersion};
use crate::infrastructure::ShutdownController;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Switch registration request.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterSwitchRequest {
    pub dpid: DeviceId,
    pub version: ProtocolVersion,
    pub address: String,
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub bindings: usize,
    pub switches: usize,
}

/// API Server state.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<PatchPanelService>,
}

impl ApiState {
    pub fn new(service: Arc<PatchPanelService>) -> Self {
        Self { service }
    }
}

/// HTTP status for a failed patch operation.
pub fn status_for(err: &PatchError) -> StatusCode {
    match err {
        PatchError::MalformedRequest(_)
        | PatchError::DeviceNotFound(_)
        | PatchError::PortInUse { .. }
        | PatchError::BindingNotFound { .. } => StatusCode::BAD_REQUEST,
        PatchError::UnsupportedProtocol(_) => StatusCode::NOT_IMPLEMENTED,
        PatchError::InstallationFailed(_) | PatchError::RemovalFailed(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn error_response(err: PatchError) -> (StatusCode, Json<serde_json::Value>) {
    (
        status_for(&err),
        Json(serde_json::json!({
            "error": err.to_string()
        })),
    )
}

/// Strictly decode a JSON body; anything else is a malformed request.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, PatchError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("invalid request body: {}", e);
        PatchError::MalformedRequest(e.to_string())
    })
}

/// Build the API router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(health_handler))
        // Port-to-port bindings
        .route(
            "/patch/flow",
            put(set_patch_flow_handler)
                .delete(delete_patch_flow_handler)
                .get(list_patch_flows_handler),
        )
        // Switch directory
        .route("/switches", post(register_switch_handler))
        .route("/switches", get(list_switches_handler))
        .route("/switches/:dpid", delete(deregister_switch_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// API Server for the patch panel.
pub struct ApiServer {
    listen_addr: String,
    state: ApiState,
    shutdown: ShutdownController,
}

impl ApiServer {
    pub fn new(listen_addr: String, service: Arc<PatchPanelService>) -> Self {
        Self {
            listen_addr,
            state: ApiState::new(service),
            shutdown: ShutdownController::new(),
        }
    }

    /// Use an externally owned shutdown controller.
    pub fn with_shutdown(mut self, shutdown: ShutdownController) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Get shared state for use by other components.
    pub fn state(&self) -> ApiState {
        self.state.clone()
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(&self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!("patch panel API listening on {}", self.listen_addr);
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown is initiated.
    ///
    /// Requests already being handled run to completion.
    pub async fn serve(&self, listener: TcpListener) -> anyhow::Result<()> {
        let app = router(self.state.clone());
        let shutdown = self.shutdown.clone();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;
        tracing::info!("patch panel API stopped");
        Ok(())
    }
}

// Handler functions

async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        bindings: state.service.binding_count(),
        switches: state.service.switches().len(),
    };
    Json(response)
}

async fn set_patch_flow_handler(State(state): State<ApiState>, body: Bytes) -> impl IntoResponse {
    tracing::debug!("start set_patch_flow");
    let request: Binding = match decode_body(&body) {
        Ok(request) => request,
        Err(e) => return error_response(e),
    };

    match state.service.create_binding(request).await {
        Ok(binding) => (
            StatusCode::OK,
            Json(serde_json::to_value(binding).unwrap_or_default()),
        ),
        Err(e) => error_response(e),
    }
}

async fn delete_patch_flow_handler(
    State(state): State<ApiState>,
    body: Bytes,
) -> impl IntoResponse {
    let request: Binding = match decode_body(&body) {
        Ok(request) => request,
        Err(e) => return error_response(e),
    };

    match state.service.delete_binding(request.key()).await {
        Ok(removed) => (
            StatusCode::OK,
            Json(serde_json::to_value(removed).unwrap_or_default()),
        ),
        Err(e) => error_response(e),
    }
}

async fn list_patch_flows_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.service.list_bindings())
}

async fn register_switch_handler(
    State(state): State<ApiState>,
    body: Bytes,
) -> impl IntoResponse {
    let req: RegisterSwitchRequest = match decode_body(&body) {
        Ok(req) => req,
        Err(e) => return error_response(e),
    };
    if !SwitchHandle::is_valid_address(&req.address) {
        return error_response(PatchError::MalformedRequest(format!(
            "invalid switch address: {}",
            req.address
        )));
    }

    let handle = SwitchHandle::new(req.dpid, req.version, req.address);
    state.service.register_switch(handle.clone());
    (
        StatusCode::CREATED,
        Json(serde_json::to_value(handle).unwrap_or_default()),
    )
}

async fn deregister_switch_handler(
    State(state): State<ApiState>,
    Path(dpid): Path<DeviceId>,
) -> impl IntoResponse {
    if state.service.unregister_switch(dpid).is_some() {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "dpid": dpid,
                "deregistered": true
            })),
        )
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "dpid": dpid,
                "error": "switch not registered"
            })),
        )
    }
}

async fn list_switches_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.service.switches())
}
