//! Error types
//!
//! Startup problems (`Config`, `BackendStartup`) abort activation. Transport
//! and protocol failures stay local to the operation or session that hit them.

use thiserror::Error;

use crate::registry::RegistryError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("RTP server startup failed: {0}")]
    BackendStartup(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("subscription rejected: {0}")]
    Rejected(String),

    #[error("node actor closed")]
    NodeClosed,
}

/// Invalid configuration detected at startup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid IPv4 address: {0:?}")]
    InvalidAddress(String),

    #[error("{0} must be in 1..=65535")]
    InvalidPort(&'static str),

    #[error("max_subscribers must be at least 1")]
    InvalidMaxSubscribers,

    #[error("announcement is {size} bytes, packet limit is {max}")]
    PayloadTooLarge { size: usize, max: usize },
}

/// Session line framing failures; these terminate the offending session only
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("line is not valid UTF-8")]
    Decode,

    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let err: Error = ConfigError::InvalidMaxSubscribers.into();
        assert!(matches!(err, Error::Config(ConfigError::InvalidMaxSubscribers)));
        assert_eq!(
            err.to_string(),
            "configuration error: max_subscribers must be at least 1"
        );
    }

    #[test]
    fn test_payload_too_large_message() {
        let err = ConfigError::PayloadTooLarge { size: 2000, max: 1470 };
        assert_eq!(
            err.to_string(),
            "announcement is 2000 bytes, packet limit is 1470"
        );
    }
}
