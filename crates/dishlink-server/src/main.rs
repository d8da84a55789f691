//! dishlink server — polls dish telemetry and republishes it as NMEA 0183.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dishlink_models::{OutputMode, ServerConfig};
use tokio_util::sync::CancellationToken;
use tracing::info;

mod distributor;
mod poller;
mod server;
mod tcp;
mod udp;

/// Serve dish telemetry as NMEA 0183 sentences.
#[derive(Parser, Debug)]
#[command(name = "dishlink-server", about = "Serve dish telemetry as NMEA 0183")]
struct Args {
    /// Output mode: "tcp" (listening server) or "udp" (datagram sender).
    #[arg(long, default_value = "tcp")]
    mode: OutputMode,

    /// Bind host for TCP, destination host for UDP.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port for TCP/UDP (10110 is the conventional NMEA-over-IP port).
    #[arg(long, default_value_t = 10110)]
    port: u16,

    /// Seconds between dish polls.
    #[arg(long, default_value_t = 1.0)]
    interval: f64,

    /// Dish IP/host (auto-detected if omitted).
    #[arg(long)]
    dish_host: Option<String>,

    /// Read diagnostic JSON from a file instead of the dish (for testing
    /// without a dish).
    #[arg(long, value_name = "PATH")]
    test_file: Option<PathBuf>,

    /// Enable UDP broadcast.
    #[arg(long)]
    broadcast: bool,

    /// Verbose output (debug-level logging).
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialise structured logging (RUST_LOG overrides the flag).
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let poll_interval = Duration::try_from_secs_f64(args.interval)
        .ok()
        .filter(|d| !d.is_zero())
        .context("poll interval must be a positive number of seconds")?;

    let config = ServerConfig {
        mode: args.mode,
        bind_host: args.host,
        bind_port: args.port,
        dish_host: args.dish_host,
        test_file: args.test_file,
        poll_interval,
        broadcast: args.broadcast,
        verbose: args.verbose,
    };
    config.validate()?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            signal_cancel.cancel();
        }
    });

    server::run(config, cancel).await
}
