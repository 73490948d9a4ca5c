//! /updates and /send handlers — the chat surface.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use parley_services::{ChatEntry, SendTarget};

use super::ApiState;

// ── /updates (GET) ────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct UpdatesResponse {
    pub chat_history: Vec<ChatEntry>,
    pub active_peers: Vec<String>,
}

pub async fn handle_updates(State(state): State<ApiState>) -> Json<UpdatesResponse> {
    let active_peers = state
        .registry
        .snapshot()
        .into_iter()
        .map(|key| key.to_string())
        .collect();

    Json(UpdatesResponse {
        chat_history: state.chat.snapshot(),
        active_peers,
    })
}

// ── /send (POST) ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SendRequest {
    /// `"all"` for broadcast, or a `"host:port"` peer address.
    pub target: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct SendFailure {
    pub peer: String,
    pub error: String,
}

#[derive(Serialize)]
pub struct SendResponse {
    pub delivered: usize,
    pub failures: Vec<SendFailure>,
}

pub async fn handle_send(
    State(state): State<ApiState>,
    Json(req): Json<SendRequest>,
) -> Result<Json<SendResponse>, (StatusCode, String)> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "message must not be empty".to_string()));
    }
    let target: SendTarget = req
        .target
        .parse()
        .map_err(|e: parley_services::TargetParseError| (StatusCode::BAD_REQUEST, e.to_string()))?;

    // Record our own line first, then deliver it prefixed with our name so
    // peers see who wrote it.
    state.chat.append(state.display_name.clone(), message);
    let payload = format!("{}: {}", state.display_name, message);

    let outcomes = match target {
        SendTarget::All => state.dispatcher.broadcast(&payload).await,
        SendTarget::Peer(key) => {
            vec![(key, state.dispatcher.send(key, &payload).await)]
        }
    };

    let mut delivered = 0;
    let mut failures = Vec::new();
    for (peer, result) in outcomes {
        match result {
            Ok(()) => delivered += 1,
            Err(e) => failures.push(SendFailure {
                peer: peer.to_string(),
                error: e.to_string(),
            }),
        }
    }

    Ok(Json(SendResponse { delivered, failures }))
}
