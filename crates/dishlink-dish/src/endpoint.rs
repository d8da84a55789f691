//! Dish endpoint resolution and auto-discovery.
//!
//! Resolution order, strongest first:
//!
//! 1. Explicitly configured host (CLI flag).
//! 2. Environment override (`STARLINK_DISH_IP`, then `STARLINK_DISH_HOST`).
//! 3. Conventional DNS names (`dish`, `starlink`).
//! 4. TCP probe of the conventional management address
//!    (`192.168.100.1:9200`).
//!
//! Only results of steps 3 and 4 are marked `discovered`; a discovered
//! endpoint may be invalidated by the client after repeated fetch
//! failures, an explicitly configured one never is.

use std::time::Duration;

use tokio::net::{lookup_host, TcpStream};
use tracing::debug;

use crate::error::FetchError;

/// Conventional address of the dish on its local network.
pub(crate) const DEFAULT_DISH_IP: &str = "192.168.100.1";
/// Management (gRPC) port probed during discovery.
pub(crate) const DISH_PROBE_PORT: u16 = 9200;
/// Default port of the dish HTTP diagnostic interface.
pub(crate) const DISH_HTTP_PORT: u16 = 80;

/// Environment variables consulted when no host is configured.
pub(crate) const ENV_DISH_IP: &str = "STARLINK_DISH_IP";
pub(crate) const ENV_DISH_HOST: &str = "STARLINK_DISH_HOST";

const PROBE_TIMEOUT: Duration = Duration::from_millis(500);
const DISCOVERY_NAMES: [&str; 2] = ["dish", "starlink"];

// ---------------------------------------------------------------------------
// DishEndpoint
// ---------------------------------------------------------------------------

/// Resolved address of the telemetry source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DishEndpoint {
    /// Host name or IP of the dish.
    pub host: String,
    /// Port of the HTTP diagnostic interface.
    pub port: u16,
    /// Whether this endpoint came from auto-discovery rather than
    /// explicit configuration.
    pub discovered: bool,
}

impl DishEndpoint {
    /// Endpoint from an explicit `host` or `host:port` spec.
    pub fn configured(spec: &str) -> Self {
        let (host, port) = match spec.rsplit_once(':') {
            Some((host, port_str)) if !host.contains(':') => match port_str.parse::<u16>() {
                Ok(port) => (host.to_string(), port),
                Err(_) => (spec.to_string(), DISH_HTTP_PORT),
            },
            // No colon, or an IPv6 literal; keep the whole spec.
            _ => (spec.to_string(), DISH_HTTP_PORT),
        };
        Self {
            host,
            port,
            discovered: false,
        }
    }

    /// Endpoint found by auto-discovery.
    fn discovered(host: String) -> Self {
        Self {
            host,
            port: DISH_HTTP_PORT,
            discovered: true,
        }
    }

    /// The `host:port` authority for request URLs.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve the dish endpoint, running discovery if nothing is configured.
///
/// `env_override` is passed in by the caller (read from the process
/// environment in production, injected in tests).
pub(crate) async fn resolve(
    explicit: Option<&str>,
    env_override: Option<String>,
) -> Result<DishEndpoint, FetchError> {
    if let Some(spec) = explicit {
        return Ok(DishEndpoint::configured(spec));
    }
    if let Some(spec) = env_override {
        return Ok(DishEndpoint::configured(&spec));
    }

    for name in DISCOVERY_NAMES {
        if let Ok(mut addrs) = lookup_host((name, DISH_HTTP_PORT)).await {
            if let Some(addr) = addrs.next() {
                debug!(%name, ip = %addr.ip(), "discovered dish via DNS");
                return Ok(DishEndpoint::discovered(addr.ip().to_string()));
            }
        }
    }

    if probe(DEFAULT_DISH_IP, DISH_PROBE_PORT).await {
        debug!(ip = DEFAULT_DISH_IP, "discovered dish at conventional address");
        return Ok(DishEndpoint::discovered(DEFAULT_DISH_IP.to_string()));
    }

    Err(FetchError::DiscoveryFailed)
}

/// Whether a TCP connection to `host:port` succeeds within the probe
/// timeout.
async fn probe(host: &str, port: u16) -> bool {
    matches!(
        tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect((host, port))).await,
        Ok(Ok(_))
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
