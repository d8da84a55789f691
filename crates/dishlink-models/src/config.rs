//! Resolved run configuration.
//!
//! A [`ServerConfig`] is produced externally (CLI flags, environment) and
//! handed to the core fully resolved; it never changes for the lifetime of
//! a run.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// OutputMode
// ---------------------------------------------------------------------------

/// Which transport the sentence stream is published on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Multi-client TCP stream server.
    Tcp,
    /// Single-destination UDP datagram sender (optionally broadcast).
    Udp,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Tcp => f.write_str("tcp"),
            OutputMode::Udp => f.write_str("udp"),
        }
    }
}

impl FromStr for OutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(OutputMode::Tcp),
            "udp" => Ok(OutputMode::Udp),
            other => Err(ConfigError::InvalidMode {
                value: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Fully-resolved configuration for one server run.
///
/// In TCP mode `bind_host:bind_port` is the listening address. In UDP mode
/// it names the destination the datagrams are sent to (the local send port
/// is ephemeral), matching the conventions of NMEA-over-IP tooling.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Selected output transport.
    pub mode: OutputMode,
    /// Bind host (TCP) or destination host (UDP).
    pub bind_host: String,
    /// Bind port (TCP) or destination port (UDP).
    pub bind_port: u16,
    /// Explicit dish host, skipping auto-discovery when set.
    pub dish_host: Option<String>,
    /// Read diagnostic JSON from this file instead of the dish.
    pub test_file: Option<PathBuf>,
    /// Delay between dish polls.
    pub poll_interval: Duration,
    /// Permit sending to a broadcast address (UDP mode only).
    pub broadcast: bool,
    /// Debug-level logging requested.
    pub verbose: bool,
}

impl ServerConfig {
    /// Check invariants that cannot be expressed in the type.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_host.is_empty() {
            return Err(ConfigError::EmptyBindHost);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }

    /// The `host:port` pair the selected transport uses.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.bind_port)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
