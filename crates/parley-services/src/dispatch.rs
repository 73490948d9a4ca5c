//! Outbound dispatch — resolves a target to a live connection and writes
//! to it, opening the connection first when none exists.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::net::{lookup_host, TcpStream};

use parley_core::wire::{self, PeerMessage};

use crate::chat_log::ChatLog;
use crate::connection::Connection;
use crate::handler::ConnectionHandler;
use crate::lifecycle::Shutdown;
use crate::registry::{PeerKey, PeerRegistry};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("connect to {peer} failed: {source}")]
    Connect {
        peer: PeerKey,
        #[source]
        source: io::Error,
    },

    #[error("connect to {peer} timed out after {timeout:?}")]
    ConnectTimeout { peer: PeerKey, timeout: Duration },

    #[error("write to {peer} failed: {source}")]
    Write {
        peer: PeerKey,
        #[source]
        source: io::Error,
    },
}

/// Outbound side of the peer layer.
///
/// Cheap to clone; every clone shares the same registry and chat log.
#[derive(Clone)]
pub struct Dispatcher {
    registry: PeerRegistry,
    chat: ChatLog,
    shutdown: Shutdown,
    /// Our own listen port, announced to peers we connect to.
    listen_port: u16,
    connect_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        registry: PeerRegistry,
        chat: ChatLog,
        shutdown: Shutdown,
        listen_port: u16,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            chat,
            shutdown,
            listen_port,
            connect_timeout,
        }
    }

    /// Write `text` to `target`, opening a connection first if none is
    /// registered. A payload equal to `exit` also tears the connection
    /// down locally after a successful write, mirroring the peer-side
    /// handling of the same message. Single attempt, no retry.
    pub async fn send(&self, target: PeerKey, text: &str) -> Result<(), DispatchError> {
        let (key, conn) = self.ensure_connected(target).await?;

        if let Err(e) = conn.send(text).await {
            tracing::warn!(peer = %key, error = %e, "send failed, dropping connection");
            self.registry.remove(key, &conn);
            conn.close();
            return Err(DispatchError::Write {
                peer: key,
                source: e,
            });
        }
        tracing::debug!(peer = %key, "message sent");

        if text.eq_ignore_ascii_case(wire::EXIT) {
            tracing::info!(peer = %key, "local disconnect requested");
            self.registry.remove(key, &conn);
            conn.close();
        }
        Ok(())
    }

    /// Ensure a connection to `target` exists, then announce our listen
    /// port so the remote side can re-key us by it. Returns the key the
    /// connection is registered under.
    pub async fn connect(&self, target: PeerKey) -> Result<PeerKey, DispatchError> {
        let (key, conn) = self.ensure_connected(target).await?;

        let announce = PeerMessage::announce(self.listen_port);
        if let Err(e) = conn.send(&announce).await {
            tracing::warn!(peer = %key, error = %e, "announce failed, dropping connection");
            self.registry.remove(key, &conn);
            conn.close();
            return Err(DispatchError::Write {
                peer: key,
                source: e,
            });
        }
        tracing::info!(peer = %key, listen_port = self.listen_port, "announced to peer");
        Ok(key)
    }

    /// Send `text` to every registered peer, one independent dispatch per
    /// peer. A failure against one peer never aborts delivery to the
    /// others. Returns each peer paired with its outcome.
    pub async fn broadcast(&self, text: &str) -> Vec<(PeerKey, Result<(), DispatchError>)> {
        let peers = self.registry.snapshot();
        let results = join_all(peers.iter().map(|peer| self.send(*peer, text))).await;

        for (peer, result) in peers.iter().zip(&results) {
            if let Err(e) = result {
                tracing::warn!(peer = %peer, error = %e, "broadcast delivery failed, skipping peer");
            }
        }
        peers.into_iter().zip(results).collect()
    }

    /// Resolve a host name or address to a peer key.
    pub async fn resolve(host: &str, port: u16) -> Result<PeerKey, DispatchError> {
        let mut addrs = lookup_host((host, port))
            .await
            .map_err(|e| DispatchError::Resolve {
                host: host.to_string(),
                port,
                source: e,
            })?;
        addrs.next().ok_or_else(|| DispatchError::Resolve {
            host: host.to_string(),
            port,
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
        })
    }

    /// Look up `target`, or open a new connection to it under a bounded
    /// timeout. New connections are registered under the remote endpoint
    /// the OS reports (which is what the peer is actually reachable at)
    /// and get their own handler task.
    async fn ensure_connected(
        &self,
        target: PeerKey,
    ) -> Result<(PeerKey, Arc<Connection>), DispatchError> {
        if let Some(conn) = self.registry.lookup(target) {
            return Ok((target, conn));
        }

        tracing::debug!(peer = %target, "no connection registered, dialing");
        let stream = match tokio::time::timeout(self.connect_timeout, TcpStream::connect(target))
            .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(DispatchError::Connect {
                    peer: target,
                    source: e,
                })
            }
            Err(_) => {
                return Err(DispatchError::ConnectTimeout {
                    peer: target,
                    timeout: self.connect_timeout,
                })
            }
        };

        let key = stream.peer_addr().map_err(|e| DispatchError::Connect {
            peer: target,
            source: e,
        })?;
        let (conn, reader) = Connection::split(stream);
        self.registry.insert(key, Arc::clone(&conn));
        tokio::spawn(
            ConnectionHandler::new(
                Arc::clone(&conn),
                reader,
                key,
                self.registry.clone(),
                self.chat.clone(),
                self.shutdown.clone(),
            )
            .run(),
        );
        tracing::info!(peer = %key, "outbound connection established");
        Ok((key, conn))
    }
}
