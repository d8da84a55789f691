//! Run-until-cancelled entry point wiring poller, distributor, and the
//! selected transport.
//!
//! The only fatal condition is failing to bind the configured socket at
//! startup; everything after that recovers locally (fetch backoff, sink
//! removal) until the cancellation token fires.

use std::sync::Arc;

use anyhow::{Context, Result};
use dishlink_dish::DishClient;
use dishlink_models::{OutputMode, SentenceOptions, ServerConfig};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::distributor::Distributor;
use crate::poller::Poller;
use crate::{tcp, udp};

/// Run the bridge until the token is cancelled.
pub async fn run(config: ServerConfig, cancel: CancellationToken) -> Result<()> {
    let distributor = Arc::new(Distributor::new());

    let client = match &config.test_file {
        Some(path) => {
            info!(path = %path.display(), "reading diagnostics from file");
            DishClient::from_file(path.clone())
        }
        None => DishClient::new(config.dish_host.clone()),
    };

    let transport = match config.mode {
        OutputMode::Tcp => {
            let addr = config.bind_addr();
            let listener = TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind TCP listener on {addr}"))?;
            info!(%addr, "TCP server listening");
            tokio::spawn(tcp::serve(listener, distributor.clone(), cancel.clone()))
        }
        OutputMode::Udp => {
            let target = udp::UdpTarget::new(&config.bind_host, config.bind_port, config.broadcast)
                .await
                .context("failed to open UDP socket")?;
            info!(
                destination = %config.bind_addr(),
                broadcast = config.broadcast,
                "UDP output configured"
            );
            let subscription = distributor.subscribe();
            tokio::spawn(target.serve(subscription, distributor.clone(), cancel.clone()))
        }
    };

    let poller = Poller::new(
        client,
        distributor.clone(),
        config.poll_interval,
        SentenceOptions::default(),
    );
    poller.run(cancel.clone()).await;

    // Poller only returns on cancellation; wait for the transport to
    // release its sockets before reporting a clean shutdown.
    let _ = transport.await;
    info!("shutdown complete");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
