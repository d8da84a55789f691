//! Fetch error taxonomy.
//!
//! [`FetchError`] is the single error type returned by every fallible
//! operation against the dish. The variants map one-to-one onto the
//! recovery policies of the caller: `Unreachable` and `Timeout` are
//! retried with backoff, `DiscoveryFailed` additionally means there is no
//! endpoint to retry against yet.

/// Error type for dish telemetry fetches.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The dish endpoint could not be reached, or answered with something
    /// that was not a usable diagnostic payload.
    #[error("dish unreachable: {0}")]
    Unreachable(String),

    /// The per-call deadline elapsed before a response arrived.
    #[error("dish request timed out")]
    Timeout,

    /// No endpoint could be resolved: no explicit host, no environment
    /// override, and auto-discovery found nothing on the local network.
    #[error("no dish endpoint could be resolved")]
    DiscoveryFailed,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Unreachable(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_unreachable() {
        let err = FetchError::Unreachable("connection refused".into());
        assert_eq!(err.to_string(), "dish unreachable: connection refused");
    }

    #[test]
    fn error_display_timeout() {
        assert_eq!(FetchError::Timeout.to_string(), "dish request timed out");
    }

    #[test]
    fn error_display_discovery_failed() {
        assert_eq!(
            FetchError::DiscoveryFailed.to_string(),
            "no dish endpoint could be resolved"
        );
    }
}
