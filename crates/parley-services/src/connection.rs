//! A live peer connection — one TCP stream, split between one reader task
//! and any number of writers.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, Notify};

/// Shared handle to one peer socket.
///
/// The read half is owned exclusively by the connection's handler task; the
/// write half lives here behind a mutex so sends from other tasks never
/// consume from the read path. `close` is purely a signal — it sets a flag
/// and wakes the handler, which tears the socket down by dropping its half.
/// No registry critical section ever performs socket I/O.
pub struct Connection {
    writer: Mutex<OwnedWriteHalf>,
    closed: AtomicBool,
    close_notify: Notify,
}

impl Connection {
    /// Split a stream into a shared connection handle and the read half
    /// destined for the handler task.
    pub fn split(stream: TcpStream) -> (Arc<Self>, OwnedReadHalf) {
        let (reader, writer) = stream.into_split();
        let conn = Arc::new(Self {
            writer: Mutex::new(writer),
            closed: AtomicBool::new(false),
            close_notify: Notify::new(),
        });
        (conn, reader)
    }

    /// Write one message to the peer. Fails once the connection is closed.
    pub async fn send(&self, text: &str) -> io::Result<()> {
        if self.is_closed() {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection closed",
            ));
        }
        let mut writer = self.writer.lock().await;
        writer.write_all(text.as_bytes()).await
    }

    /// Signal this connection closed. Idempotent, never blocks.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.close_notify.notify_waiters();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Resolves once `close` has been called, immediately if it already was.
    pub async fn closed(&self) {
        loop {
            let notified = self.close_notify.notified();
            if self.is_closed() {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("closed", &self.is_closed())
            .finish()
    }
}
