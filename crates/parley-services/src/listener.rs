//! Inbound connection listener.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

use crate::chat_log::ChatLog;
use crate::connection::Connection;
use crate::handler::ConnectionHandler;
use crate::lifecycle::Shutdown;
use crate::registry::PeerRegistry;

/// Bind the peer listen socket on all interfaces with `SO_REUSEADDR`, so a
/// restarted daemon can reclaim its port without waiting out TIME_WAIT.
pub fn bind(port: u16) -> std::io::Result<TcpListener> {
    let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;
    socket.set_nonblocking(true)?;
    TcpListener::from_std(socket.into())
}

/// Accept loop. Each accepted connection is registered under its ephemeral
/// remote address and handed to its own handler task; the peer's announce
/// message later re-keys it to the real listen address.
pub struct Listener {
    listener: TcpListener,
    registry: PeerRegistry,
    chat: ChatLog,
    shutdown: Shutdown,
}

impl Listener {
    pub fn new(
        listener: TcpListener,
        registry: PeerRegistry,
        chat: ChatLog,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            listener,
            registry,
            chat,
            shutdown,
        }
    }

    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.shutdown.signalled() => {
                    tracing::info!("listener shutting down");
                    return;
                }

                result = self.listener.accept() => {
                    let (stream, peer_addr) = match result {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            if self.shutdown.is_triggered() {
                                return;
                            }
                            tracing::warn!(error = %e, "accept failed");
                            continue;
                        }
                    };

                    tracing::info!(peer = %peer_addr, "accepted connection");
                    let (conn, reader) = Connection::split(stream);
                    self.registry.insert(peer_addr, Arc::clone(&conn));
                    tokio::spawn(
                        ConnectionHandler::new(
                            conn,
                            reader,
                            peer_addr,
                            self.registry.clone(),
                            self.chat.clone(),
                            self.shutdown.clone(),
                        )
                        .run(),
                    );
                }
            }
        }
    }
}
