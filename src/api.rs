//! HTTP transport for the IPC channels, run by `account-store serve`.
//!
//! Endpoints:
//!   GET  /ipc                 → registered channel names (JSON)
//!   POST /ipc/{channel}       → invoke channel; body is the JSON argument array
//!   GET  /api/status          → backend + record count (JSON)

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::StoreError;
use crate::ipc::IpcMainHandler;
use crate::store::writer::SharedStore;

/// Shared state passed to all handlers.
pub struct AppState {
    pub ipc: IpcMainHandler,
    pub store: SharedStore,
    pub config: Config,
}

#[derive(Serialize)]
struct StatusResponse {
    backend: String,
    base_path: String,
    records: usize,
    channels: Vec<String>,
}

/// Build the axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ipc", get(handle_channels))
        .route("/ipc/{channel}", post(handle_invoke))
        .route("/api/status", get(handle_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on loopback until `shutdown` resolves.
pub async fn start_server<F>(state: Arc<AppState>, port: u16, shutdown: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    let addr = format!("127.0.0.1:{}", port);
    info!(port, "IPC transport listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, "Failed to bind HTTP server");
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
        error!(error = %e, "HTTP server error");
    }
}

fn status_for(err: &StoreError) -> StatusCode {
    match err {
        StoreError::UnknownChannel { .. } => StatusCode::NOT_FOUND,
        StoreError::InvalidArgs { .. } | StoreError::InvalidKey { .. } => StatusCode::BAD_REQUEST,
        StoreError::WriterClosed => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: StoreError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(error = %err, "IPC call failed");
    } else {
        warn!(error = %err, "IPC call rejected");
    }
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

async fn handle_channels(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let channels: Vec<String> = state.ipc.channels().into_iter().map(String::from).collect();
    Json(channels)
}

async fn handle_invoke(
    State(state): State<Arc<AppState>>,
    Path(channel): Path<String>,
    body: Bytes,
) -> Response {
    let args: Vec<Value> = if body.iter().all(u8::is_ascii_whitespace) {
        Vec::new()
    } else {
        match serde_json::from_slice(&body) {
            Ok(args) => args,
            Err(e) => {
                return error_response(StoreError::InvalidArgs {
                    channel,
                    reason: format!("body must be a JSON array: {e}"),
                });
            }
        }
    };

    match state.ipc.invoke(&channel, args).await {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_status(State(state): State<Arc<AppState>>) -> Response {
    let records = match state.store.read().count() {
        Ok(n) => n,
        Err(e) => return error_response(e),
    };
    let resp = StatusResponse {
        backend: format!("{:?}", state.config.store.backend).to_lowercase(),
        base_path: state.config.store.base_path.display().to_string(),
        records,
        channels: state.ipc.channels().into_iter().map(String::from).collect(),
    };
    Json(resp).into_response()
}
