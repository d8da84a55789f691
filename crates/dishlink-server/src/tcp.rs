//! TCP transport: accept loop plus one forwarding task per client.
//!
//! Each accepted connection gets its own distributor subscription and its
//! own task, so a slow or dead client can only ever stall itself. Clients
//! are not expected to send anything; inbound bytes are read and
//! discarded, which doubles as disconnect detection.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::distributor::{Distributor, Subscription};

/// Pause after a failed accept, to avoid spinning on a persistent error.
const ACCEPT_RETRY: Duration = Duration::from_millis(250);

/// Accept clients until cancelled, spawning one forwarding task each.
pub async fn serve(
    listener: TcpListener,
    distributor: Arc<Distributor>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    info!(%peer, "client connected");
                    let subscription = distributor.subscribe();
                    tokio::spawn(handle_client(
                        stream,
                        subscription,
                        distributor.clone(),
                        cancel.clone(),
                    ));
                }
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_RETRY).await;
                }
            }
        }
    }
    info!("TCP server stopped");
}

/// Forward sentence pairs to one client until it disconnects, its sink is
/// dropped, or the server shuts down.
async fn handle_client(
    mut stream: TcpStream,
    mut subscription: Subscription,
    distributor: Arc<Distributor>,
    cancel: CancellationToken,
) {
    let peer = stream
        .peer_addr()
        .map_or_else(|_| "unknown".to_string(), |addr| addr.to_string());
    let (mut reader, mut writer) = stream.split();
    let mut discard = [0u8; 1024];

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            maybe_pair = subscription.receiver.recv() => match maybe_pair {
                Some(pair) => {
                    if let Err(e) = writer.write_all(pair.payload().as_bytes()).await {
                        debug!(%peer, error = %e, "write failed");
                        break;
                    }
                }
                // Sink dropped by the distributor (stalled buffer).
                None => break,
            },
            read = reader.read(&mut discard) => match read {
                Ok(0) => {
                    info!(%peer, "client disconnected");
                    break;
                }
                Ok(_) => {} // inbound bytes are ignored
                Err(e) => {
                    debug!(%peer, error = %e, "read failed");
                    break;
                }
            }
        }
    }

    distributor.unsubscribe(&subscription.id);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
