use crate::*;

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use parley_core::wire::PeerMessage;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// An inbound connection starts under its ephemeral source port and moves
/// to (host, announced port) on `CONNECT:`; chat sent afterwards is
/// attributed to the announced key.
#[tokio::test]
async fn announce_rekeys_inbound_connection() -> Result<()> {
    let mut a = spawn_node().await?;
    let mut b = spawn_node().await?;

    b.dispatcher.connect(a.addr).await?;

    let announced: SocketAddr = format!("127.0.0.1:{}", b.addr.port()).parse()?;
    assert!(
        wait_until(|| a.registry.snapshot() == vec![announced]).await,
        "expected A to re-key B to {announced}, registry is {:?}",
        a.registry.snapshot()
    );

    b.dispatcher.send(a.addr, "hello").await?;
    assert!(wait_until(|| a.chat.len() == 1).await, "chat never arrived");

    let entry = &a.chat.snapshot()[0];
    assert_eq!(entry.sender, announced.to_string());
    assert_eq!(entry.text, "hello");

    a.stop().await?;
    b.stop().await?;
    Ok(())
}

/// `exit` tears the session down on both ends: the sender drops its entry
/// after the write, the receiver drops its entry when it reads the message.
#[tokio::test]
async fn exit_removes_peer_on_both_sides() -> Result<()> {
    let mut a = spawn_node().await?;
    let mut b = spawn_node().await?;

    b.dispatcher.connect(a.addr).await?;

    // Wait for A to process the announce so the exit arrives as its own read.
    let announced: SocketAddr = format!("127.0.0.1:{}", b.addr.port()).parse()?;
    assert!(wait_until(|| a.registry.snapshot() == vec![announced]).await);
    assert_eq!(b.registry.len(), 1);

    b.dispatcher.send(a.addr, "exit").await?;

    assert!(wait_until(|| b.registry.is_empty()).await, "sender kept the entry");
    assert!(wait_until(|| a.registry.is_empty()).await, "receiver kept the entry");

    a.stop().await?;
    b.stop().await?;
    Ok(())
}

/// Two connections announcing the same listen port: the second supersedes
/// the first, which must be closed — never leaked, never duplicated.
#[tokio::test]
async fn superseding_connection_closes_previous() -> Result<()> {
    let mut a = spawn_node().await?;
    let announced: SocketAddr = "127.0.0.1:7777".parse()?;

    let mut first = TcpStream::connect(a.addr).await?;
    first
        .write_all(PeerMessage::announce(7777).as_bytes())
        .await?;
    assert!(wait_until(|| a.registry.snapshot() == vec![announced]).await);

    let mut second = TcpStream::connect(a.addr).await?;
    second
        .write_all(PeerMessage::announce(7777).as_bytes())
        .await?;

    // The superseded socket gets closed out from under us.
    let mut buf = [0u8; 8];
    let n = tokio::time::timeout(Duration::from_secs(2), first.read(&mut buf))
        .await
        .context("superseded connection was not closed")??;
    assert_eq!(n, 0, "expected EOF on the superseded connection");

    // Exactly one registry entry remains, and it is the live connection.
    assert_eq!(a.registry.snapshot(), vec![announced]);
    second.write_all(b"still alive").await?;
    assert!(wait_until(|| a.chat.len() == 1).await);
    assert_eq!(a.chat.snapshot()[0].sender, announced.to_string());

    a.stop().await?;
    Ok(())
}

/// Connecting to a dead address fails within the configured timeout and
/// leaves nothing behind in the registry.
#[tokio::test]
async fn unreachable_connect_reports_error_and_registers_nothing() -> Result<()> {
    let mut a = spawn_node().await?;
    let target = refused_addr().await?;

    let started = Instant::now();
    let result = a.dispatcher.connect(target).await;

    assert!(result.is_err(), "connect to {target} should fail");
    assert!(
        started.elapsed() < CONNECT_TIMEOUT + Duration::from_secs(1),
        "connect error took longer than the timeout"
    );
    assert!(a.registry.is_empty());

    a.stop().await?;
    Ok(())
}
