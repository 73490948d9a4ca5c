//! The peer wire protocol.
//!
//! Everything on the wire is plaintext UTF-8 over a raw TCP stream. There is
//! no length prefix and no delimiter; each read is interpreted as one
//! message. Three message forms exist:
//!
//!   `CONNECT:<port>` — the sender announces the port its own listener is
//!   bound to, so the receiver can re-key it from its ephemeral source port.
//!
//!   `exit` — the sender is closing the logical session (case-insensitive).
//!
//!   anything else — an opaque chat payload.

/// Prefix of the listen-port announcement message.
pub const ANNOUNCE_PREFIX: &str = "CONNECT:";

/// Session-terminating message, compared case-insensitively.
pub const EXIT: &str = "exit";

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerMessage {
    /// The peer announced its real listen port.
    Announce { listen_port: u16 },
    /// The peer is ending the session.
    Exit,
    /// An opaque chat payload.
    Chat(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("malformed announce {payload:?}: not a valid port number")]
    BadAnnounce { payload: String },
}

impl PeerMessage {
    /// Decode one received message. Returns `Ok(None)` for empty or
    /// whitespace-only input, which carries no meaning on this protocol.
    pub fn parse(text: &str) -> Result<Option<Self>, WireError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        if let Some(rest) = text.strip_prefix(ANNOUNCE_PREFIX) {
            let listen_port = rest.trim().parse::<u16>().map_err(|_| WireError::BadAnnounce {
                payload: text.to_string(),
            })?;
            return Ok(Some(PeerMessage::Announce { listen_port }));
        }

        if text.eq_ignore_ascii_case(EXIT) {
            return Ok(Some(PeerMessage::Exit));
        }

        Ok(Some(PeerMessage::Chat(text.to_string())))
    }

    /// Encode the announce message for our own listen port.
    pub fn announce(listen_port: u16) -> String {
        format!("{ANNOUNCE_PREFIX}{listen_port}")
    }
}
