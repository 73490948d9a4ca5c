//! Chat history and send commands.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::http;

#[derive(Deserialize)]
struct UpdatesResponse {
    chat_history: Vec<ChatEntryJson>,
    active_peers: Vec<String>,
}

#[derive(Deserialize)]
struct ChatEntryJson {
    sender: String,
    text: String,
    timestamp: u64,
}

#[derive(Serialize)]
struct SendRequest {
    target: String,
    message: String,
}

#[derive(Deserialize)]
struct SendResponse {
    delivered: usize,
    failures: Vec<SendFailureJson>,
}

#[derive(Deserialize)]
struct SendFailureJson {
    peer: String,
    error: String,
}

pub async fn cmd_chat(port: u16) -> Result<()> {
    let resp: UpdatesResponse = http::get(port, "/updates").await?;

    if resp.chat_history.is_empty() {
        println!("No messages yet.");
    } else {
        println!("═══════════════════════════════════════");
        println!("  Chat History ({})", resp.chat_history.len());
        println!("═══════════════════════════════════════");
        for entry in &resp.chat_history {
            println!("  [{}] {}: {}", entry.timestamp, entry.sender, entry.text);
        }
    }

    if !resp.active_peers.is_empty() {
        println!();
        println!("  Peers: {}", resp.active_peers.join(", "));
    }

    Ok(())
}

pub async fn cmd_send(port: u16, target: &str, message: &str) -> Result<()> {
    let req = SendRequest {
        target: target.to_string(),
        message: message.to_string(),
    };

    let resp: SendResponse = http::post_body(port, "/send", &req).await?;

    println!("Delivered to {} peer(s).", resp.delivered);
    for failure in &resp.failures {
        println!("  failed for {}: {}", failure.peer, failure.error);
    }

    Ok(())
}
