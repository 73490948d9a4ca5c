//! parleyd — Parley peer-to-peer chat daemon.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use parley_core::config::ParleyConfig;
use parley_services::{ChatLog, Dispatcher, Listener, PeerRegistry, Shutdown};

/// Bounded wait for the listener task during teardown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = ParleyConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = ParleyConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        ParleyConfig::default()
    });

    // Optional CLI override of the listen port
    let listen_port = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<u16>()
            .with_context(|| format!("invalid listen port {arg:?}"))?,
        None => config.network.listen_port,
    };

    // Bind the peer listen socket — the only fatal failure path.
    let listener_socket = parley_services::listener::bind(listen_port)
        .with_context(|| format!("failed to bind peer listen socket on port {listen_port}"))?;
    let listen_port = listener_socket.local_addr()?.port();

    tracing::info!(
        listen_port,
        local_ip = %local_ip(),
        "parleyd starting — share this address with peers"
    );

    // Shared state
    let registry = PeerRegistry::new();
    let chat = ChatLog::new();
    let shutdown = Shutdown::new();
    let dispatcher = Dispatcher::new(
        registry.clone(),
        chat.clone(),
        shutdown.clone(),
        listen_port,
        config.connect_timeout(),
    );

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            shutdown.trigger();
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let mut listener_task = tokio::spawn(
        Listener::new(
            listener_socket,
            registry.clone(),
            chat.clone(),
            shutdown.clone(),
        )
        .run(),
    );

    let _peer_printer = {
        let registry = registry.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(30));
            loop {
                interval.tick().await;
                tracing::debug!(peers = registry.len(), "peer registry snapshot");
                for key in registry.snapshot() {
                    tracing::debug!(peer = %key, "  peer");
                }
            }
        })
    };

    // Connect out to configured bootstrap peers; failures are logged and
    // skipped, never fatal.
    for target in config.peers.bootstrap.clone() {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            match resolve_target(&target).await {
                Ok(addr) => {
                    if let Err(e) = dispatcher.connect(addr).await {
                        tracing::warn!(peer = %target, error = %e, "bootstrap connect failed");
                    }
                }
                Err(e) => tracing::warn!(peer = %target, error = %e, "bad bootstrap address"),
            }
        });
    }

    // HTTP control surface
    let api_port = config.network.api_port;
    let state = parley_api::ApiState {
        registry: registry.clone(),
        chat: chat.clone(),
        dispatcher: dispatcher.clone(),
        shutdown: shutdown.clone(),
        display_name: config.identity.display_name.clone(),
        listen_port,
        started_at: Instant::now(),
    };
    let mut api_task = tokio::spawn(async move {
        if let Err(e) = parley_api::serve(state, api_port).await {
            tracing::error!(error = %e, "api server failed");
        }
    });

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut listener_finished = false;
    tokio::select! {
        _ = shutdown.signalled()  => tracing::info!("shutting down"),
        r = &mut listener_task    => { tracing::error!("listener exited: {:?}", r); listener_finished = true; }
        r = &mut api_task         => tracing::error!("api server exited: {:?}", r),
    }

    // Teardown: stop the loops, close every peer connection, and give the
    // listener a bounded window to wind down. Safe to run twice.
    shutdown.trigger();
    registry.close_all();
    api_task.abort();
    if !listener_finished
        && tokio::time::timeout(SHUTDOWN_GRACE, &mut listener_task)
            .await
            .is_err()
    {
        tracing::warn!("listener did not stop in time, aborting it");
        listener_task.abort();
    }

    tracing::info!("goodbye");
    Ok(())
}

/// Best-effort local IP discovery: the address the OS would route outbound
/// traffic from. Never actually sends anything.
fn local_ip() -> IpAddr {
    let fallback = IpAddr::from([127, 0, 0, 1]);
    let Ok(probe) = std::net::UdpSocket::bind("0.0.0.0:0") else {
        return fallback;
    };
    if probe.connect("8.8.8.8:80").is_err() {
        return fallback;
    }
    probe.local_addr().map(|a| a.ip()).unwrap_or(fallback)
}

/// Parse "host:port", resolving host names if needed.
async fn resolve_target(target: &str) -> Result<std::net::SocketAddr> {
    if let Ok(addr) = target.parse() {
        return Ok(addr);
    }
    let (host, port) = target
        .rsplit_once(':')
        .with_context(|| format!("expected host:port, got {target:?}"))?;
    let port: u16 = port
        .parse()
        .with_context(|| format!("invalid port in {target:?}"))?;
    Dispatcher::resolve(host, port)
        .await
        .with_context(|| format!("failed to resolve {target:?}"))
}
