//! Station configuration
//!
//! The hosting application hands us these values (usually deserialized from
//! its own config file). Everything is checked once by [`StationConfig::validate`]
//! before the backend starts.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::net::{broadcast_address_for, render_station_name};

/// Default announcement period
pub const DEFAULT_BROADCAST_PERIOD: Duration = Duration::from_secs(1);

/// Default ceiling for a single discovery datagram
pub const DEFAULT_MAX_PACKET_SIZE: usize = 1470;

/// Media pipeline identifiers
///
/// Opaque to this crate; forwarded unchanged to the routing collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Caps string describing the payload on the wire
    pub caps: String,
    /// Encoder element used on the sending side
    pub encoder: String,
    /// Decoder element used on the receiving side
    pub decoder: String,
}

/// Station configuration options
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Host address this node advertises and listens on
    pub hostname: String,

    /// Session listener port
    pub port: u16,

    /// Discovery broadcast port
    pub broadcast_port: u16,

    /// Maximum concurrent subscribers (and session connections)
    pub max_subscribers: usize,

    /// Announcement template; `%hostname` and `%port` are substituted
    pub station_name: String,

    /// Interval between announcements
    #[serde(with = "duration_secs")]
    pub broadcast_period: Duration,

    /// Largest discovery datagram we send or accept
    pub max_packet_size: usize,

    /// Connect/greeting timeout for the subscription client
    #[serde(with = "duration_secs")]
    pub connection_timeout: Duration,

    /// How long the client waits for an error reply before treating
    /// silence as success
    #[serde(with = "duration_secs")]
    pub reply_timeout: Duration,

    /// Media pipeline identifiers
    pub pipeline: PipelineConfig,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port: 6601,
            broadcast_port: 6602,
            max_subscribers: 4,
            station_name: "%hostname:%port".to_string(),
            broadcast_period: DEFAULT_BROADCAST_PERIOD,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            connection_timeout: Duration::from_secs(5),
            reply_timeout: Duration::from_millis(500),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl StationConfig {
    /// Set the advertised host
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Set the session listener port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the discovery broadcast port
    pub fn broadcast_port(mut self, port: u16) -> Self {
        self.broadcast_port = port;
        self
    }

    /// Set maximum subscribers
    pub fn max_subscribers(mut self, max: usize) -> Self {
        self.max_subscribers = max;
        self
    }

    /// Set the announcement template
    pub fn station_name(mut self, template: impl Into<String>) -> Self {
        self.station_name = template.into();
        self
    }

    /// Set the announcement period
    pub fn broadcast_period(mut self, period: Duration) -> Self {
        self.broadcast_period = period;
        self
    }

    /// Set the client connect/greeting timeout
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the client reply window
    pub fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Set the media pipeline identifiers
    pub fn pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// The announcement payload with placeholders substituted
    pub fn announcement(&self) -> String {
        render_station_name(&self.station_name, &self.hostname, self.port)
    }

    /// Check the configuration before activation
    pub fn validate(&self) -> Result<(), ConfigError> {
        broadcast_address_for(&self.hostname)?;

        if self.port == 0 {
            return Err(ConfigError::InvalidPort("port"));
        }
        if self.broadcast_port == 0 {
            return Err(ConfigError::InvalidPort("broadcast_port"));
        }
        if self.max_subscribers == 0 {
            return Err(ConfigError::InvalidMaxSubscribers);
        }

        let size = self.announcement().len();
        if size > self.max_packet_size {
            return Err(ConfigError::PayloadTooLarge {
                size,
                max: self.max_packet_size,
            });
        }

        Ok(())
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
