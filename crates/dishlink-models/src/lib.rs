#![deny(missing_docs)]

//! # Dishlink Models
//!
//! Core data types for the dishlink NMEA bridge.
//!
//! ## Data flow
//!
//! ```text
//! TelemetrySample           one dish poll result
//!   └── nmea::encode() ──▶ SentencePair { GPRMC, GPGGA }
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`telemetry`] | The per-poll [`TelemetrySample`](telemetry::TelemetrySample) |
//! | [`nmea`] | NMEA 0183 encoding: checksums, coordinates, `GPRMC`/`GPGGA` |
//! | [`config`] | Resolved run configuration ([`ServerConfig`](config::ServerConfig)) |
//! | [`error`] | Validation errors ([`ConfigError`](error::ConfigError)) |

pub mod config;
pub mod error;
pub mod nmea;
pub mod telemetry;

// Re-export all public types at crate root for convenience.
// Downstream crates can use `dishlink_models::TelemetrySample` directly.
pub use config::*;
pub use error::*;
pub use nmea::*;
pub use telemetry::*;
