//! The poll loop driving the pipeline: fetch → encode → publish.
//!
//! On a fixed cadence the poller asks its [`TelemetrySource`] for one
//! sample, encodes it, and hands the pair to the distributor. While the
//! source is unreachable nothing is published and the wait between
//! attempts grows exponentially up to a cap; the first success resets the
//! cadence. Cancellation interrupts the inter-tick wait promptly, never
//! waiting out a full backoff delay.

use std::sync::Arc;
use std::time::Duration;

use dishlink_dish::{DishClient, FetchError};
use dishlink_models::{SentenceOptions, TelemetrySample, nmea};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::distributor::Distributor;

/// Ceiling for the backoff delay between failed fetches.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// TelemetrySource
// ---------------------------------------------------------------------------

/// A source of telemetry samples, one per call.
///
/// Implemented by [`DishClient`]; tests substitute scripted sources.
pub trait TelemetrySource {
    /// Fetch one sample, bounded by the source's own timeout.
    async fn fetch(&mut self) -> Result<TelemetrySample, FetchError>;
}

impl TelemetrySource for DishClient {
    async fn fetch(&mut self) -> Result<TelemetrySample, FetchError> {
        DishClient::fetch(self).await
    }
}

// ---------------------------------------------------------------------------
// Backoff
// ---------------------------------------------------------------------------

/// Exponential backoff: base, 2×base, 4×base, … capped at a maximum.
#[derive(Debug, Clone)]
struct Backoff {
    base: Duration,
    max: Duration,
    current: Option<Duration>,
}

impl Backoff {
    fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            current: None,
        }
    }

    /// Delay before the next attempt after a failure.
    fn next(&mut self) -> Duration {
        let delay = match self.current {
            None => self.base,
            Some(current) => self.max.min(current * 2),
        };
        self.current = Some(delay);
        delay
    }

    /// Failures are not sticky: a success restores the base cadence.
    fn reset(&mut self) {
        self.current = None;
    }
}

// ---------------------------------------------------------------------------
// Poller
// ---------------------------------------------------------------------------

/// Drives the fetch/encode/publish cycle until cancelled.
pub struct Poller<S> {
    source: S,
    distributor: Arc<Distributor>,
    interval: Duration,
    options: SentenceOptions,
}

impl<S: TelemetrySource> Poller<S> {
    pub fn new(
        source: S,
        distributor: Arc<Distributor>,
        interval: Duration,
        options: SentenceOptions,
    ) -> Self {
        Self {
            source,
            distributor,
            interval,
            options,
        }
    }

    /// Run until the token is cancelled. Fetch failures are logged and
    /// backed off, never fatal.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut backoff = Backoff::new(self.interval, MAX_BACKOFF);
        let mut first_output = true;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let delay = match self.source.fetch().await {
                Ok(sample) => {
                    let pair = Arc::new(nmea::encode(&sample, &self.options));
                    if first_output {
                        first_output = false;
                        info!(
                            rmc = %pair.rmc.trim_end(),
                            gga = %pair.gga.trim_end(),
                            "first NMEA output"
                        );
                    } else {
                        debug!(rmc = %pair.rmc.trim_end(), "publishing");
                    }
                    self.distributor.publish(&pair);
                    backoff.reset();
                    self.interval
                }
                Err(e) => {
                    let delay = backoff.next();
                    warn!(
                        error = %e,
                        next_attempt_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "dish fetch failed, backing off"
                    );
                    delay
                }
            };

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }
        info!("poller stopped");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
