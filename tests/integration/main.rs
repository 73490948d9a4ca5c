//! Parley integration test harness.
//!
//! Each test assembles real nodes in-process — listener, registry,
//! dispatcher, handlers — and talks actual TCP over loopback, so the whole
//! connection lifecycle (accept, announce re-key, supersede, exit,
//! shutdown) is exercised end to end without external processes.

mod lifecycle;
mod messaging;
mod peers;

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::task::JoinHandle;

use parley_services::{ChatLog, Dispatcher, Listener, PeerRegistry, Shutdown};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// One in-process node: shared state plus its running listener task.
pub struct TestNode {
    pub registry: PeerRegistry,
    pub chat: ChatLog,
    pub dispatcher: Dispatcher,
    pub shutdown: Shutdown,
    /// Loopback address peers can dial.
    pub addr: SocketAddr,
    listener_task: Option<JoinHandle<()>>,
}

pub async fn spawn_node() -> Result<TestNode> {
    let listener = parley_services::listener::bind(0).context("failed to bind test listener")?;
    let mut addr = listener.local_addr()?;
    addr.set_ip("127.0.0.1".parse()?);

    let registry = PeerRegistry::new();
    let chat = ChatLog::new();
    let shutdown = Shutdown::new();
    let dispatcher = Dispatcher::new(
        registry.clone(),
        chat.clone(),
        shutdown.clone(),
        addr.port(),
        CONNECT_TIMEOUT,
    );

    let listener_task = tokio::spawn(
        Listener::new(listener, registry.clone(), chat.clone(), shutdown.clone()).run(),
    );

    Ok(TestNode {
        registry,
        chat,
        dispatcher,
        shutdown,
        addr,
        listener_task: Some(listener_task),
    })
}

impl TestNode {
    /// Tear the node down the way the daemon does: signal, close every
    /// connection, bounded wait for the listener. Safe to call twice.
    pub async fn stop(&mut self) -> Result<()> {
        self.shutdown.trigger();
        self.registry.close_all();
        if let Some(task) = self.listener_task.take() {
            tokio::time::timeout(Duration::from_secs(2), task)
                .await
                .context("listener did not stop in time")??;
        }
        Ok(())
    }
}

/// Poll `f` until it holds or two seconds elapse.
pub async fn wait_until(f: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if f() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    f()
}

/// An address on loopback that refuses connections.
pub async fn refused_addr() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}
