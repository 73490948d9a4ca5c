//! Peer listing command.

use anyhow::Result;
use serde::Deserialize;

use super::http;

#[derive(Deserialize)]
struct PeersResponse {
    peers: Vec<String>,
}

pub async fn cmd_peers(port: u16) -> Result<()> {
    let resp: PeersResponse = http::get(port, "/peers").await?;

    if resp.peers.is_empty() {
        println!("No active peers.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Active Peers ({})", resp.peers.len());
    println!("═══════════════════════════════════════");
    for peer in &resp.peers {
        println!("  {peer}");
    }

    Ok(())
}
