//! Control panel API route handlers.
//!
//! All endpoints return JSON. The engine is shared behind a `tokio::Mutex`
//! — the same lock the tick loop takes, so a control action and a tick are
//! never interleaved mid-transition.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::config::EngineConfig;
use crate::engine::{EngineSnapshot, TradeEngine};
use crate::events::{EventLog, LogEntry};
use crate::types::Tick;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct PanelState {
    pub engine: Mutex<TradeEngine>,
    pub events: Arc<EventLog>,
    pub tick_tx: mpsc::Sender<Tick>,
    pub engine_config: EngineConfig,
}

pub type AppState = Arc<PanelState>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub is_running: bool,
    #[serde(flatten)]
    pub snapshot: EngineSnapshot,
    /// Trailing log entries, oldest first.
    pub logs: Vec<LogEntry>,
}

/// Entries of the status payload's log tail.
const STATUS_LOG_TAIL: usize = 20;

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/config — the engine's effective strategy parameters.
pub async fn get_config(State(state): State<AppState>) -> Json<EngineConfig> {
    Json(state.engine_config.clone())
}

/// POST /api/start
pub async fn post_start(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let mut engine = state.engine.lock().await;
    if engine.is_running() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Engine is already running" })),
        );
    }
    state.events.clear();
    engine.start();
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": "Engine started" })),
    )
}

/// POST /api/stop
pub async fn post_stop(State(state): State<AppState>) -> Json<Value> {
    state.engine.lock().await.stop();
    Json(json!({ "success": true, "message": "Engine stopped" }))
}

/// POST /api/command — generic command dispatcher.
pub async fn post_command(
    State(state): State<AppState>,
    Json(request): Json<CommandRequest>,
) -> Json<Value> {
    state.engine.lock().await.handle_command(&request.command);
    Json(json!({ "success": true }))
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let engine = state.engine.lock().await;
    Json(StatusResponse {
        is_running: engine.is_running(),
        snapshot: engine.snapshot(),
        logs: state.events.tail(STATUS_LOG_TAIL),
    })
}

/// GET /api/logs — the full retained ring buffer.
pub async fn get_logs(State(state): State<AppState>) -> Json<Vec<LogEntry>> {
    Json(state.events.entries())
}

/// POST /api/tick — inbound tick push from the transport shell.
pub async fn post_tick(
    State(state): State<AppState>,
    Json(tick): Json<Tick>,
) -> (StatusCode, Json<Value>) {
    match state.tick_tx.send(tick).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "Tick consumer is gone" })),
        ),
    }
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
