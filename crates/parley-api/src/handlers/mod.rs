//! HTTP API handlers — exposes daemon state as JSON.

pub mod messages;
pub mod peers;
pub mod status;

use std::time::Instant;

use parley_services::{ChatLog, Dispatcher, PeerRegistry, Shutdown};

#[derive(Clone)]
pub struct ApiState {
    pub registry: PeerRegistry,
    pub chat: ChatLog,
    pub dispatcher: Dispatcher,
    /// Shutdown handle — lets `/daemon/shutdown` stop the whole daemon.
    pub shutdown: Shutdown,
    /// Name used as the sender label for messages submitted locally.
    pub display_name: String,
    /// The port our peer listener is actually bound to.
    pub listen_port: u16,
    pub started_at: Instant,
}

// Re-export handler functions for use in router setup.
pub use messages::{handle_send, handle_updates};
pub use peers::{handle_connect, handle_peers};
pub use status::{handle_shutdown, handle_status};
