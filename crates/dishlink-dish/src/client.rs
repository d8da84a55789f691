//! The per-poll telemetry fetch.
//!
//! [`DishClient`] owns the connection to the dish: the resolved (possibly
//! auto-discovered) endpoint, the HTTP client, and the consecutive-failure
//! counter that bounds how long a stale discovered address keeps being
//! hammered. It issues exactly one request per [`fetch`](DishClient::fetch)
//! call; retry policy belongs to the caller.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use dishlink_models::TelemetrySample;
use tracing::{debug, info, warn};

use crate::diagnostic::{extract_location, extract_location_from_text, Location};
use crate::endpoint::{self, DishEndpoint, ENV_DISH_HOST, ENV_DISH_IP};
use crate::error::FetchError;

/// Bound on a single fetch, resolution excluded.
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// After this many consecutive failures against a *discovered* endpoint,
/// the cached address is dropped and discovery runs again.
const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Paths tried against the dish HTTP interface, in order.
const DIAGNOSTIC_PATHS: [&str; 2] = ["/api/diagnostic", "/"];

/// User-Agent sent with every dish request.
const USER_AGENT: &str = "StarlinkNMEA/1.0";

/// Client for the dish's local management API.
pub struct DishClient {
    explicit_host: Option<String>,
    test_file: Option<PathBuf>,
    endpoint: Option<DishEndpoint>,
    consecutive_failures: u32,
    http: reqwest::Client,
}

impl DishClient {
    /// Client that fetches from the dish over the network.
    ///
    /// With `dish_host == None` the endpoint is resolved on the first
    /// fetch via environment override or auto-discovery.
    pub fn new(dish_host: Option<String>) -> Self {
        Self {
            explicit_host: dish_host,
            test_file: None,
            endpoint: None,
            consecutive_failures: 0,
            http: reqwest::Client::new(),
        }
    }

    /// Client that reads diagnostic JSON from a file instead of the
    /// network (for running without a dish).
    pub fn from_file(path: PathBuf) -> Self {
        Self {
            explicit_host: None,
            test_file: Some(path),
            endpoint: None,
            consecutive_failures: 0,
            http: reqwest::Client::new(),
        }
    }

    /// Fetch one telemetry sample.
    ///
    /// Issues a single request against the resolved endpoint and never
    /// blocks longer than the per-call timeout. On transport failure the
    /// error is returned without retrying; after
    /// [`MAX_CONSECUTIVE_FAILURES`] failures of a discovered endpoint the
    /// cached address is invalidated so the next call re-discovers.
    pub async fn fetch(&mut self) -> Result<TelemetrySample, FetchError> {
        if let Some(path) = self.test_file.clone() {
            return self.fetch_from_file(&path);
        }

        let endpoint = match &self.endpoint {
            Some(ep) => ep.clone(),
            None => {
                let ep =
                    endpoint::resolve(self.explicit_host.as_deref(), env_override()).await?;
                info!(host = %ep.host, discovered = ep.discovered, "resolved dish endpoint");
                self.endpoint = Some(ep.clone());
                ep
            }
        };

        match self.fetch_from(&endpoint).await {
            Ok(sample) => {
                self.consecutive_failures = 0;
                Ok(sample)
            }
            Err(e) => {
                self.consecutive_failures += 1;
                if endpoint.discovered && self.consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    warn!(
                        host = %endpoint.host,
                        failures = self.consecutive_failures,
                        "invalidating discovered dish endpoint"
                    );
                    self.endpoint = None;
                    self.consecutive_failures = 0;
                }
                Err(e)
            }
        }
    }

    /// One HTTP round-trip: try the diagnostic path, then the root.
    async fn fetch_from(&self, endpoint: &DishEndpoint) -> Result<TelemetrySample, FetchError> {
        let mut last_error: Option<FetchError> = None;

        for path in DIAGNOSTIC_PATHS {
            let url = format!("http://{}{}", endpoint.authority(), path);
            let request = self
                .http
                .get(&url)
                .header(reqwest::header::USER_AGENT, USER_AGENT);
            let response = match tokio::time::timeout(FETCH_TIMEOUT, request.send()).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    debug!(%url, error = %e, "dish request failed");
                    last_error = Some(e.into());
                    continue;
                }
                Err(_elapsed) => return Err(FetchError::Timeout),
            };

            // Read the raw body: it is usually JSON, but some dish UI
            // builds serve HTML with the diagnostic object embedded.
            let body = match tokio::time::timeout(FETCH_TIMEOUT, response.text()).await {
                Ok(Ok(body)) => body,
                Ok(Err(e)) => {
                    debug!(%url, error = %e, "reading dish response failed");
                    last_error = Some(e.into());
                    continue;
                }
                Err(_elapsed) => return Err(FetchError::Timeout),
            };

            if let Some(location) = extract_location_from_text(&body) {
                return Ok(sample_from(location));
            }
            debug!(%url, "diagnostic payload carried no location");
        }

        Err(last_error.unwrap_or_else(|| {
            FetchError::Unreachable("no location in diagnostic payload".to_string())
        }))
    }

    /// Read and parse diagnostic JSON from disk.
    fn fetch_from_file(&self, path: &std::path::Path) -> Result<TelemetrySample, FetchError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| FetchError::Unreachable(format!("{}: {e}", path.display())))?;
        let payload: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| FetchError::Unreachable(format!("{}: {e}", path.display())))?;
        extract_location(&payload).map(sample_from).ok_or_else(|| {
            FetchError::Unreachable("no location in diagnostic payload".to_string())
        })
    }
}

/// Stamp an extracted location into a telemetry sample.
fn sample_from(location: Location) -> TelemetrySample {
    TelemetrySample {
        latitude: location.latitude,
        longitude: location.longitude,
        altitude_m: location.altitude_m,
        speed_knots: location.speed_knots,
        heading_deg: location.heading_deg,
        timestamp: Utc::now(),
        fix_valid: location.fix_valid,
    }
}

/// The environment override for the dish host, if set.
fn env_override() -> Option<String> {
    std::env::var(ENV_DISH_IP)
        .or_else(|_| std::env::var(ENV_DISH_HOST))
        .ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
