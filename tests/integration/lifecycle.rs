use crate::*;

use anyhow::Result;
use tokio::net::TcpStream;

/// Shutting down twice produces the same end state — empty registry,
/// listener gone — without errors.
#[tokio::test]
async fn shutdown_is_idempotent() -> Result<()> {
    let mut a = spawn_node().await?;
    let mut b = spawn_node().await?;

    b.dispatcher.connect(a.addr).await?;
    assert!(wait_until(|| a.registry.len() == 1).await);

    a.stop().await?;
    assert!(a.registry.is_empty());
    assert!(a.shutdown.is_triggered());

    a.stop().await?;
    assert!(a.registry.is_empty());
    assert!(a.shutdown.is_triggered());

    b.stop().await?;
    Ok(())
}

/// Remote peers observe our shutdown as a connection close and clean up
/// their own registries.
#[tokio::test]
async fn shutdown_closes_peer_connections() -> Result<()> {
    let mut a = spawn_node().await?;
    let mut b = spawn_node().await?;

    b.dispatcher.connect(a.addr).await?;
    assert!(wait_until(|| a.registry.len() == 1 && b.registry.len() == 1).await);

    a.stop().await?;

    assert!(
        wait_until(|| b.registry.is_empty()).await,
        "peer should drop the entry once our side goes away"
    );

    b.stop().await?;
    Ok(())
}

/// Once stopped, the listen socket is really gone: new dials are refused.
#[tokio::test]
async fn listener_stops_accepting_after_shutdown() -> Result<()> {
    let mut a = spawn_node().await?;
    let addr = a.addr;
    a.stop().await?;

    let result = TcpStream::connect(addr).await;
    assert!(result.is_err(), "listen socket should be closed");
    Ok(())
}
