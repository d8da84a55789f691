//! NMEA 0183 sentence encoding.
//!
//! Pure functions turning one [`TelemetrySample`] into a checksummed
//! `GPRMC`/`GPGGA` pair. Encoding is total: a sample without a fix is
//! rendered with NMEA's own "void" conventions (status `V`, fix quality
//! `0`), never rejected.
//!
//! The checksum is the XOR of every byte between `$` and `*`, rendered as
//! two uppercase hex digits. Consumers (OpenCPN and friends) verify it, so
//! it must be bit-exact with the standard.

use crate::telemetry::TelemetrySample;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SentenceOptions
// ---------------------------------------------------------------------------

/// Placeholder values for GGA fields the dish does not report.
///
/// Satellite count, HDOP, and geoid separation are not part of the dish
/// diagnostic payload. The defaults match what chartplotters conventionally
/// accept; none of the known consumers validate them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SentenceOptions {
    /// Satellites-in-use field (GGA field 7), e.g. `"08"`.
    pub satellite_count: String,
    /// Horizontal dilution of precision (GGA field 8), e.g. `"1.0"`.
    pub hdop: String,
    /// Geoid separation in metres (GGA field 11), e.g. `"0.0"`.
    pub geoid_separation: String,
}

impl Default for SentenceOptions {
    fn default() -> Self {
        Self {
            satellite_count: "08".to_string(),
            hdop: "1.0".to_string(),
            geoid_separation: "0.0".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// SentencePair
// ---------------------------------------------------------------------------

/// The two sentences derived from one telemetry sample.
///
/// Both sentences always describe the same sample and carry the same UTC
/// time. Each string is complete: `$`-prefixed, checksummed, and
/// `\r\n`-terminated, ready to be written to a socket as-is.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SentencePair {
    /// The `GPRMC` (recommended minimum) sentence.
    pub rmc: String,
    /// The `GPGGA` (fix data) sentence.
    pub gga: String,
}

impl SentencePair {
    /// The on-wire unit for one poll cycle: RMC line followed by GGA line.
    pub fn payload(&self) -> String {
        format!("{}{}", self.rmc, self.gga)
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// XOR checksum over a sentence body (the bytes between `$` and `*`),
/// as two uppercase hex digits.
pub fn checksum(body: &str) -> String {
    let sum = body.bytes().fold(0u8, |acc, b| acc ^ b);
    format!("{sum:02X}")
}

/// Decimal degrees → `ddmm.mmm` (latitude) with hemisphere letter.
fn format_latitude(value: f64) -> (String, char) {
    let hemisphere = if value < 0.0 { 'S' } else { 'N' };
    let value = value.abs();
    let degrees = value.trunc() as u32;
    let minutes = (value - f64::from(degrees)) * 60.0;
    (format!("{degrees:02}{minutes:06.3}"), hemisphere)
}

/// Decimal degrees → `dddmm.mmm` (longitude) with hemisphere letter.
fn format_longitude(value: f64) -> (String, char) {
    let hemisphere = if value < 0.0 { 'W' } else { 'E' };
    let value = value.abs();
    let degrees = value.trunc() as u32;
    let minutes = (value - f64::from(degrees)) * 60.0;
    (format!("{degrees:03}{minutes:06.3}"), hemisphere)
}

/// Wrap a sentence body into a complete line: `$body*HH\r\n`.
fn finish(body: String) -> String {
    let sum = checksum(&body);
    format!("${body}*{sum}\r\n")
}

/// Encode one sample into a `GPRMC`/`GPGGA` pair.
///
/// Total: never fails. A sample with `fix_valid == false` produces
/// sentences with status `V`, fix quality `0`, mode indicator `N`, and
/// zeroed position/speed/course/altitude; the UTC time and date fields are
/// kept, since they are known regardless of fix state.
pub fn encode(sample: &TelemetrySample, options: &SentenceOptions) -> SentencePair {
    let time = sample.timestamp.format("%H%M%S");
    let date = sample.timestamp.format("%d%m%y");

    let (latitude, longitude, altitude, speed, course) = if sample.fix_valid {
        (
            sample.latitude,
            sample.longitude,
            sample.altitude_m,
            sample.speed_knots,
            sample.heading_deg,
        )
    } else {
        (0.0, 0.0, 0.0, 0.0, 0.0)
    };
    let (status, quality, mode) = if sample.fix_valid {
        ('A', '1', 'A')
    } else {
        ('V', '0', 'N')
    };

    let (lat, lat_hemi) = format_latitude(latitude);
    let (lon, lon_hemi) = format_longitude(longitude);

    let rmc_body = format!(
        "GPRMC,{time}.00,{status},{lat},{lat_hemi},{lon},{lon_hemi},{speed:.1},{course:.1},{date},,,{mode}"
    );
    let gga_body = format!(
        "GPGGA,{time}.00,{lat},{lat_hemi},{lon},{lon_hemi},{quality},{sats},{hdop},{altitude:.1},M,{geoid},M,,",
        sats = options.satellite_count,
        hdop = options.hdop,
        geoid = options.geoid_separation,
    );

    SentencePair {
        rmc: finish(rmc_body),
        gga: finish(gga_body),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample() -> TelemetrySample {
        TelemetrySample {
            latitude: 37.7749,
            longitude: -122.4194,
            altitude_m: 30.25,
            speed_knots: 4.2,
            heading_deg: 271.5,
            timestamp: Utc.with_ymd_and_hms(2026, 8, 29, 12, 34, 56).unwrap(),
            fix_valid: true,
        }
    }

    /// Re-parse a finished sentence and recompute its checksum.
    fn verify_checksum(sentence: &str) {
        let line = sentence.strip_suffix("\r\n").expect("line-terminated");
        let body = line
            .strip_prefix('$')
            .expect("starts with $")
            .rsplit_once('*')
            .expect("has checksum delimiter");
        assert_eq!(checksum(body.0), body.1, "checksum mismatch in {line}");
    }

    #[test]
    fn rmc_reference_sentence() {
        let pair = encode(&sample(), &SentenceOptions::default());
        assert_eq!(
            pair.rmc,
            "$GPRMC,123456.00,A,3746.494,N,12225.164,W,4.2,271.5,290826,,,A*41\r\n"
        );
    }

    #[test]
    fn gga_reference_sentence() {
        let pair = encode(&sample(), &SentenceOptions::default());
        assert_eq!(
            pair.gga,
            "$GPGGA,123456.00,3746.494,N,12225.164,W,1,08,1.0,30.2,M,0.0,M,,*7B\r\n"
        );
    }

    #[test]
    fn checksums_recompute_for_both_sentences() {
        let pair = encode(&sample(), &SentenceOptions::default());
        verify_checksum(&pair.rmc);
        verify_checksum(&pair.gga);
    }

    #[test]
    fn sign_flip_swaps_hemispheres_same_magnitude() {
        let mut flipped = sample();
        flipped.latitude = -flipped.latitude;
        flipped.longitude = -flipped.longitude;
        flipped.speed_knots = 0.0;
        flipped.heading_deg = 0.0;
        let pair = encode(&flipped, &SentenceOptions::default());
        assert_eq!(
            pair.rmc,
            "$GPRMC,123456.00,A,3746.494,S,12225.164,E,0.0,0.0,290826,,,A*49\r\n"
        );
    }

    #[test]
    fn latitude_formatting() {
        assert_eq!(format_latitude(37.7749), ("3746.494".to_string(), 'N'));
        assert_eq!(format_latitude(-0.5), ("0030.000".to_string(), 'S'));
        assert_eq!(format_latitude(0.0), ("0000.000".to_string(), 'N'));
    }

    #[test]
    fn longitude_formatting() {
        assert_eq!(format_longitude(-122.4194), ("12225.164".to_string(), 'W'));
        assert_eq!(format_longitude(8.05), ("00803.000".to_string(), 'E'));
        assert_eq!(format_longitude(0.0), ("00000.000".to_string(), 'E'));
    }

    #[test]
    fn no_fix_is_void_but_still_well_formed() {
        let ts = Utc.with_ymd_and_hms(2026, 8, 29, 12, 34, 56).unwrap();
        let mut sample = TelemetrySample::no_fix(ts);
        // Garbage in the other fields must not leak into a void sentence.
        sample.latitude = 51.5;
        sample.speed_knots = 99.9;
        let pair = encode(&sample, &SentenceOptions::default());
        assert_eq!(
            pair.rmc,
            "$GPRMC,123456.00,V,0000.000,N,00000.000,E,0.0,0.0,290826,,,N*46\r\n"
        );
        assert_eq!(
            pair.gga,
            "$GPGGA,123456.00,0000.000,N,00000.000,E,0,08,1.0,0.0,M,0.0,M,,*53\r\n"
        );
        verify_checksum(&pair.rmc);
        verify_checksum(&pair.gga);
    }

    #[test]
    fn both_sentences_carry_the_same_time_field() {
        let pair = encode(&sample(), &SentenceOptions::default());
        let rmc_time = pair.rmc.split(',').nth(1).unwrap().to_string();
        let gga_time = pair.gga.split(',').nth(1).unwrap().to_string();
        assert_eq!(rmc_time, gga_time);
        assert_eq!(rmc_time, "123456.00");
    }

    #[test]
    fn custom_placeholders_are_used_verbatim() {
        let options = SentenceOptions {
            satellite_count: "12".to_string(),
            hdop: "0.8".to_string(),
            geoid_separation: "47.3".to_string(),
        };
        let pair = encode(&sample(), &options);
        assert!(pair.gga.contains(",12,0.8,30.2,M,47.3,M,,"));
        verify_checksum(&pair.gga);
    }

    #[test]
    fn payload_is_rmc_then_gga() {
        let pair = encode(&sample(), &SentenceOptions::default());
        let payload = pair.payload();
        assert!(payload.starts_with("$GPRMC"));
        let gga_at = payload.find("$GPGGA").unwrap();
        assert_eq!(&payload[..gga_at], pair.rmc);
        assert!(payload.ends_with("\r\n"));
    }

    #[test]
    fn checksum_known_values() {
        assert_eq!(
            checksum("GPRMC,123456.00,A,3746.494,N,12225.164,W,4.2,271.5,290826,,,A"),
            "41"
        );
        assert_eq!(
            checksum("GPGGA,000000.00,0000.000,N,00000.000,E,0,08,1.0,0.0,M,0.0,M,,"),
            "54"
        );
    }
}
