//! /status and /daemon/shutdown handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::ApiState;

// ── /status ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatusResponse {
    pub display_name: String,
    pub listen_port: u16,
    pub peer_count: usize,
    pub message_count: usize,
    pub uptime_secs: u64,
}

pub async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        display_name: state.display_name.clone(),
        listen_port: state.listen_port,
        peer_count: state.registry.len(),
        message_count: state.chat.len(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

// ── /daemon/shutdown ──────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ShutdownResponse {
    pub status: String,
}

pub async fn handle_shutdown(State(state): State<ApiState>) -> Json<ShutdownResponse> {
    tracing::info!("shutdown requested over the API");
    state.shutdown.trigger();
    Json(ShutdownResponse {
        status: "shutting down".to_string(),
    })
}
