//! Status and shutdown commands.

use anyhow::Result;
use serde::Deserialize;

use super::http;

#[derive(Deserialize)]
struct StatusResponse {
    display_name: String,
    listen_port: u16,
    peer_count: usize,
    message_count: usize,
    uptime_secs: u64,
}

#[derive(Deserialize)]
struct ShutdownResponse {
    status: String,
}

pub async fn cmd_status(port: u16) -> Result<()> {
    let resp: StatusResponse = http::get(port, "/status").await?;

    println!("═══════════════════════════════════════");
    println!("  Parley Daemon Status");
    println!("═══════════════════════════════════════");
    println!("  Display name : {}", resp.display_name);
    println!("  Listen port  : {}", resp.listen_port);
    println!("  Active peers : {}", resp.peer_count);
    println!("  Chat lines   : {}", resp.message_count);
    println!("  Uptime       : {}s", resp.uptime_secs);

    Ok(())
}

pub async fn cmd_shutdown(port: u16) -> Result<()> {
    let resp: ShutdownResponse = http::post(port, "/daemon/shutdown").await?;
    println!("Daemon: {}", resp.status);
    Ok(())
}
