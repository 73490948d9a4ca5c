//! Per-connection read loop.
//!
//! One handler task owns the read half of each connection, inbound or
//! outbound. It interprets announce messages (re-keying the registry entry
//! from the provisional key to the peer's real listen address), honors
//! `exit`, and forwards everything else to the chat log attributed to the
//! connection's current key.
//!
//! Framing: the protocol has no delimiter, so each successful read is
//! treated as one logical message. Chat lines are assumed to arrive in a
//! single read; a line split across reads becomes two entries. That is an
//! assumption of the plaintext protocol, not something this loop enforces.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;

use parley_core::wire::PeerMessage;

use crate::chat_log::ChatLog;
use crate::connection::Connection;
use crate::lifecycle::Shutdown;
use crate::registry::{PeerKey, PeerRegistry};

/// Upper bound on one read from a peer socket.
const READ_CHUNK: usize = 1024;

pub struct ConnectionHandler {
    conn: Arc<Connection>,
    reader: OwnedReadHalf,
    /// The key this connection is currently registered under. Starts
    /// provisional for inbound connections and is adopted on announce;
    /// cleanup always removes by this key, never the original one.
    key: PeerKey,
    registry: PeerRegistry,
    chat: ChatLog,
    shutdown: Shutdown,
}

impl ConnectionHandler {
    pub fn new(
        conn: Arc<Connection>,
        reader: OwnedReadHalf,
        key: PeerKey,
        registry: PeerRegistry,
        chat: ChatLog,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            conn,
            reader,
            key,
            registry,
            chat,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        let mut buf = vec![0u8; READ_CHUNK];

        loop {
            tokio::select! {
                _ = self.shutdown.signalled() => {
                    tracing::debug!(peer = %self.key, "handler stopping on shutdown");
                    break;
                }

                _ = self.conn.closed() => {
                    tracing::debug!(peer = %self.key, "connection closed locally");
                    break;
                }

                result = self.reader.read(&mut buf) => {
                    match result {
                        Ok(0) => {
                            tracing::info!(peer = %self.key, "connection closed by peer");
                            break;
                        }
                        Ok(n) => {
                            if !self.handle_frame(&buf[..n]) {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(peer = %self.key, error = %e, "read failed");
                            break;
                        }
                    }
                }
            }
        }

        // Always clean up by the current key; the identity check keeps a
        // stale handler from deleting an entry installed after a re-key.
        self.registry.remove(self.key, &self.conn);
        self.conn.close();
        tracing::debug!(peer = %self.key, "connection handler finished");
    }

    /// Process one received chunk. Returns false when the session is over.
    fn handle_frame(&mut self, data: &[u8]) -> bool {
        let text = String::from_utf8_lossy(data);

        match PeerMessage::parse(&text) {
            Ok(None) => true,

            Ok(Some(PeerMessage::Announce { listen_port })) => {
                let new_key = SocketAddr::new(self.key.ip(), listen_port);
                self.registry.rekey(self.key, new_key, &self.conn);
                tracing::info!(old = %self.key, new = %new_key, "peer announced listen port");
                self.key = new_key;
                true
            }

            Ok(Some(PeerMessage::Exit)) => {
                tracing::info!(peer = %self.key, "peer requested disconnect");
                false
            }

            Ok(Some(PeerMessage::Chat(message))) => {
                tracing::info!(peer = %self.key, %message, "chat message");
                self.chat.append(self.key.to_string(), message);
                true
            }

            Err(e) => {
                tracing::warn!(peer = %self.key, error = %e, "ignoring malformed announce");
                true
            }
        }
    }
}
