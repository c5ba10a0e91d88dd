//! Periodic station announcements

use std::net::{SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::StationConfig;
use crate::error::ConfigError;
use crate::net::broadcast_address_for;

/// Sends the station announcement to the subnet broadcast address every
/// `period`. A failed send is logged and the next tick proceeds as usual.
pub struct Advertiser {
    socket: Arc<UdpSocket>,
    target: SocketAddr,
    payload: Bytes,
    period: Duration,
}

impl Advertiser {
    /// Create an advertiser for an explicit target
    pub fn new(
        socket: Arc<UdpSocket>,
        target: SocketAddr,
        payload: impl Into<Bytes>,
        period: Duration,
    ) -> Self {
        Self {
            socket,
            target,
            payload: payload.into(),
            period,
        }
    }

    /// Create an advertiser from the station configuration.
    ///
    /// Targets `<subnet broadcast>:<broadcast_port>`. An announcement larger
    /// than `max_packet_size` is a configuration error.
    pub fn from_config(config: &StationConfig, socket: Arc<UdpSocket>) -> Result<Self, ConfigError> {
        let broadcast = broadcast_address_for(&config.hostname)?;
        let payload = config.announcement();

        if payload.len() > config.max_packet_size {
            return Err(ConfigError::PayloadTooLarge {
                size: payload.len(),
                max: config.max_packet_size,
            });
        }

        let target = SocketAddr::V4(SocketAddrV4::new(broadcast, config.broadcast_port));
        Ok(Self::new(socket, target, payload, config.broadcast_period))
    }

    /// Where announcements are sent
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// The announcement bytes
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Send one announcement
    pub async fn tick(&self) -> std::io::Result<usize> {
        self.socket.send_to(&self.payload, self.target).await
    }

    /// Run the announcement timer until the task is aborted
    pub fn spawn(self) -> JoinHandle<()> {
        tracing::info!(
            target_addr = %self.target,
            period_ms = self.period.as_millis() as u64,
            "RTP broadcast running"
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match self.tick().await {
                    Ok(sent) => {
                        tracing::trace!(target_addr = %self.target, bytes = sent, "Announcement sent");
                    }
                    Err(e) => {
                        tracing::warn!(target_addr = %self.target, error = %e, "Announcement send failed");
                    }
                }
            }
        })
    }
}
