//! UDP transport: single-destination datagram sender.
//!
//! One datagram per poll cycle, containing the RMC line followed by the
//! GGA line. The local port is ephemeral; `host:port` from the run
//! configuration names the destination, which may be a broadcast address
//! when broadcast is enabled.

use std::io;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::distributor::{Distributor, Subscription};

/// The configured UDP destination and the socket used to reach it.
pub struct UdpTarget {
    socket: UdpSocket,
    destination: String,
}

impl UdpTarget {
    /// Bind a local socket and configure it for the run.
    ///
    /// With `broadcast` the socket is permitted to send to broadcast
    /// addresses such as `255.255.255.255`; without it the OS will
    /// reject such sends.
    pub async fn new(destination_host: &str, port: u16, broadcast: bool) -> io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        socket.set_broadcast(broadcast)?;
        Ok(Self {
            socket,
            destination: format!("{destination_host}:{port}"),
        })
    }

    /// Whether the socket permits broadcast sends.
    #[allow(dead_code)] // exercised in tests; mirrors the config flag
    pub fn broadcast(&self) -> io::Result<bool> {
        self.socket.broadcast()
    }

    /// Send each published pair to the destination until cancelled.
    ///
    /// Send failures are logged and the cycle skipped; they are never
    /// fatal.
    pub async fn serve(
        self,
        mut subscription: Subscription,
        distributor: Arc<Distributor>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                maybe_pair = subscription.receiver.recv() => match maybe_pair {
                    Some(pair) => {
                        if let Err(e) = self
                            .socket
                            .send_to(pair.payload().as_bytes(), &self.destination)
                            .await
                        {
                            warn!(destination = %self.destination, error = %e, "UDP send failed, skipping cycle");
                        }
                    }
                    None => break,
                }
            }
        }
        distributor.unsubscribe(&subscription.id);
        info!("UDP sender stopped");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
