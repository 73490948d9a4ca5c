use crate::*;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use parley_services::Connection;
use tokio::net::{TcpListener, TcpStream};

/// After B announces itself to A, chat flows over the single shared
/// connection in both directions, attributed to each side's key.
#[tokio::test]
async fn chat_flows_in_both_directions() -> Result<()> {
    let mut a = spawn_node().await?;
    let mut b = spawn_node().await?;

    b.dispatcher.connect(a.addr).await?;
    let b_announced: SocketAddr = format!("127.0.0.1:{}", b.addr.port()).parse()?;
    assert!(wait_until(|| a.registry.snapshot() == vec![b_announced]).await);

    b.dispatcher.send(a.addr, "ping").await?;
    assert!(wait_until(|| a.chat.len() == 1).await);
    assert_eq!(a.chat.snapshot()[0].text, "ping");

    // A answers back over the re-keyed inbound connection — no new dial.
    a.dispatcher.send(b_announced, "pong").await?;
    assert!(wait_until(|| b.chat.len() == 1).await);
    let entry = &b.chat.snapshot()[0];
    assert_eq!(entry.text, "pong");
    assert_eq!(entry.sender, a.addr.to_string());

    a.stop().await?;
    b.stop().await?;
    Ok(())
}

/// Broadcast keeps going past a failing peer: with two live targets and one
/// dead one, both live peers get the message and exactly one failure is
/// reported — and the dead entry is cleaned out of the registry.
#[tokio::test]
async fn broadcast_skips_failed_peer() -> Result<()> {
    let mut x = spawn_node().await?;
    let mut a = spawn_node().await?;
    let mut b = spawn_node().await?;

    x.dispatcher.connect(a.addr).await?;
    x.dispatcher.connect(b.addr).await?;

    // Wait until both peers processed the announce, so the broadcast below
    // arrives as its own read on each connection.
    let x_announced: SocketAddr = format!("127.0.0.1:{}", x.addr.port()).parse()?;
    assert!(wait_until(|| {
        a.registry.snapshot() == vec![x_announced] && b.registry.snapshot() == vec![x_announced]
    })
    .await);
    assert_eq!(x.registry.len(), 2);

    // Plant a third entry whose connection is already dead.
    let dead_key: SocketAddr = "127.0.0.1:65000".parse()?;
    let helper = TcpListener::bind("127.0.0.1:0").await?;
    let stream = TcpStream::connect(helper.local_addr()?).await?;
    let _accepted = helper.accept().await?;
    let (dead, _reader) = Connection::split(stream);
    dead.close();
    x.registry.insert(dead_key, Arc::clone(&dead));

    let outcomes = x.dispatcher.broadcast("crew-x: hello everyone").await;
    assert_eq!(outcomes.len(), 3);

    let failed: Vec<_> = outcomes
        .iter()
        .filter(|(_, result)| result.is_err())
        .map(|(peer, _)| *peer)
        .collect();
    assert_eq!(failed, vec![dead_key], "exactly the dead peer should fail");

    assert!(wait_until(|| a.chat.len() == 1 && b.chat.len() == 1).await);
    assert_eq!(a.chat.snapshot()[0].text, "crew-x: hello everyone");
    assert_eq!(b.chat.snapshot()[0].text, "crew-x: hello everyone");

    // The write failure evicted the dead entry.
    assert_eq!(x.registry.len(), 2);

    x.stop().await?;
    a.stop().await?;
    b.stop().await?;
    Ok(())
}

/// Messages from different peers all land in the hub's chat log.
#[tokio::test]
async fn chat_log_collects_messages_from_multiple_peers() -> Result<()> {
    let mut hub = spawn_node().await?;
    let mut a = spawn_node().await?;
    let mut b = spawn_node().await?;

    a.dispatcher.connect(hub.addr).await?;
    b.dispatcher.connect(hub.addr).await?;

    let mut expected: Vec<SocketAddr> = vec![
        format!("127.0.0.1:{}", a.addr.port()).parse()?,
        format!("127.0.0.1:{}", b.addr.port()).parse()?,
    ];
    expected.sort();
    assert!(
        wait_until(|| hub.registry.snapshot() == expected).await,
        "hub should hold both announced keys, got {:?}",
        hub.registry.snapshot()
    );

    a.dispatcher.send(hub.addr, "from a").await?;
    b.dispatcher.send(hub.addr, "from b").await?;

    assert!(wait_until(|| hub.chat.len() == 2).await);
    let texts: Vec<String> = hub
        .chat
        .snapshot()
        .into_iter()
        .map(|entry| entry.text)
        .collect();
    assert!(texts.contains(&"from a".to_string()));
    assert!(texts.contains(&"from b".to_string()));

    hub.stop().await?;
    a.stop().await?;
    b.stop().await?;
    Ok(())
}
