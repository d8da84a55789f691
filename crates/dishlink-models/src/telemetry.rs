//! The telemetry sample produced by one dish poll.
//!
//! A [`TelemetrySample`] is created once per poll cycle, encoded into a
//! sentence pair, and discarded. No history is retained anywhere in the
//! system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TelemetrySample
// ---------------------------------------------------------------------------

/// One position/motion reading from the dish, immutable after creation.
///
/// Fields the dish firmware does not report (speed and heading on current
/// diagnostic payloads) are zero rather than absent, so the encoder never
/// has to deal with missing data.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    /// Latitude in decimal degrees, negative south of the equator.
    pub latitude: f64,
    /// Longitude in decimal degrees, negative west of Greenwich.
    pub longitude: f64,
    /// Altitude above mean sea level, in metres.
    pub altitude_m: f64,
    /// Ground speed over the last interval, in knots.
    pub speed_knots: f64,
    /// Course over ground, in degrees true.
    pub heading_deg: f64,
    /// UTC instant the sample was taken.
    pub timestamp: DateTime<Utc>,
    /// Whether the dish had a usable position fix when the sample was taken.
    pub fix_valid: bool,
}

impl TelemetrySample {
    /// A sample representing "no fix" at the given instant.
    ///
    /// Encodes to syntactically valid sentences with status `V` and fix
    /// quality `0` (see [`crate::nmea::encode`]).
    pub fn no_fix(timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            altitude_m: 0.0,
            speed_knots: 0.0,
            heading_deg: 0.0,
            timestamp,
            fix_valid: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn no_fix_zeroes_everything_but_the_timestamp() {
        let ts = Utc.with_ymd_and_hms(2026, 8, 29, 12, 34, 56).unwrap();
        let sample = TelemetrySample::no_fix(ts);
        assert_eq!(sample.latitude, 0.0);
        assert_eq!(sample.longitude, 0.0);
        assert_eq!(sample.altitude_m, 0.0);
        assert!(!sample.fix_valid);
        assert_eq!(sample.timestamp, ts);
    }

    #[test]
    fn sample_roundtrip_serde() {
        let sample = TelemetrySample {
            latitude: 37.7749,
            longitude: -122.4194,
            altitude_m: 30.25,
            speed_knots: 4.2,
            heading_deg: 271.5,
            timestamp: Utc.with_ymd_and_hms(2026, 8, 29, 12, 34, 56).unwrap(),
            fix_valid: true,
        };
        let json = serde_json::to_string(&sample).unwrap();
        let back: TelemetrySample = serde_json::from_str(&json).unwrap();
        assert_eq!(sample, back);
    }
}
