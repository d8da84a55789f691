//! Error types for the `dishlink-models` crate.
//!
//! Sentence encoding is total and never fails; the only fallible surface
//! here is configuration validation, which returns [`ConfigError`].

/// Errors produced when validating a run configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The output mode string was neither `tcp` nor `udp`.
    #[error("invalid output mode \"{value}\": expected \"tcp\" or \"udp\"")]
    InvalidMode {
        /// The value that failed parsing.
        value: String,
    },

    /// The poll interval was zero.
    #[error("poll interval must be greater than zero")]
    ZeroInterval,

    /// The bind/destination host was empty.
    #[error("bind host must not be empty")]
    EmptyBindHost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_mode() {
        let err = ConfigError::InvalidMode {
            value: "serial".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid output mode \"serial\": expected \"tcp\" or \"udp\""
        );
    }

    #[test]
    fn error_display_zero_interval() {
        assert_eq!(
            ConfigError::ZeroInterval.to_string(),
            "poll interval must be greater than zero"
        );
    }

    #[test]
    fn error_display_empty_bind_host() {
        assert_eq!(
            ConfigError::EmptyBindHost.to_string(),
            "bind host must not be empty"
        );
    }
}
