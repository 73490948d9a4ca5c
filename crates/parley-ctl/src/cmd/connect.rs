//! Peer connect command.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::http;

#[derive(Serialize)]
struct ConnectRequest {
    host: String,
    port: u16,
}

#[derive(Deserialize)]
struct ConnectResponse {
    peer: String,
}

pub async fn cmd_connect(port: u16, host: &str, peer_port: u16) -> Result<()> {
    let req = ConnectRequest {
        host: host.to_string(),
        port: peer_port,
    };

    let resp: ConnectResponse = http::post_body(port, "/connect", &req).await?;

    println!("Connected to {}.", resp.peer);
    Ok(())
}
