//! /peers and /connect handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use parley_services::Dispatcher;

use super::ApiState;

// ── /peers (GET) ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct PeersResponse {
    pub peers: Vec<String>,
}

pub async fn handle_peers(State(state): State<ApiState>) -> Json<PeersResponse> {
    let peers = state
        .registry
        .snapshot()
        .into_iter()
        .map(|key| key.to_string())
        .collect();
    Json(PeersResponse { peers })
}

// ── /connect (POST) ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ConnectRequest {
    pub host: String,
    pub port: u16,
}

#[derive(Serialize)]
pub struct ConnectResponse {
    /// The key the new connection is registered under.
    pub peer: String,
}

pub async fn handle_connect(
    State(state): State<ApiState>,
    Json(req): Json<ConnectRequest>,
) -> Result<Json<ConnectResponse>, (StatusCode, String)> {
    let addr = Dispatcher::resolve(&req.host, req.port)
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let peer = state
        .dispatcher
        .connect(addr)
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))?;

    Ok(Json(ConnectResponse {
        peer: peer.to_string(),
    }))
}
