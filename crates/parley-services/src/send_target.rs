//! Send targeting — broadcast vs a single peer.

use std::fmt;
use std::str::FromStr;

use crate::registry::PeerKey;

/// Target for message sending, as it arrives from the control surface:
/// the literal `"all"` or a `"host:port"` peer address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendTarget {
    /// Every currently registered peer.
    All,
    /// One specific peer.
    Peer(PeerKey),
}

#[derive(Debug, thiserror::Error)]
#[error("invalid target {input:?}: expected \"all\" or \"host:port\"")]
pub struct TargetParseError {
    pub input: String,
}

impl FromStr for SendTarget {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(SendTarget::All);
        }
        s.parse::<PeerKey>()
            .map(SendTarget::Peer)
            .map_err(|_| TargetParseError {
                input: s.to_string(),
            })
    }
}

impl fmt::Display for SendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendTarget::All => write!(f, "all"),
            SendTarget::Peer(key) => write!(f, "{key}"),
        }
    }
}
