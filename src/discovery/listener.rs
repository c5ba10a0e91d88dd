//! Passive discovery of other stations

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use crate::net::{format_hostname, peer_host};
use crate::node::NodeHandle;

/// Outcome of inspecting one announcement datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    /// Another station; record it
    Station { addr: String, name: String },
    /// Our own announcement echoed back
    OwnAdvertisement,
    /// Empty, oversized, or not UTF-8
    Invalid,
}

/// Receives announcements on the shared broadcast socket and records every
/// station other than ourselves.
pub struct DiscoveryListener {
    socket: Arc<UdpSocket>,
    self_host: String,
    max_packet_size: usize,
    node: NodeHandle,
}

impl DiscoveryListener {
    pub fn new(
        socket: Arc<UdpSocket>,
        self_host: &str,
        max_packet_size: usize,
        node: NodeHandle,
    ) -> Self {
        Self {
            socket,
            self_host: format_hostname(self_host),
            max_packet_size,
            node,
        }
    }

    /// Classify one received datagram
    pub fn classify(&self, data: &[u8], from: &SocketAddr) -> Announcement {
        if data.is_empty() || data.len() > self.max_packet_size {
            return Announcement::Invalid;
        }

        let addr = peer_host(from);
        if addr == self.self_host {
            return Announcement::OwnAdvertisement;
        }

        match std::str::from_utf8(data) {
            Ok(name) => Announcement::Station {
                addr,
                name: name.to_string(),
            },
            Err(_) => Announcement::Invalid,
        }
    }

    /// Receive until the node actor goes away or the task is aborted
    pub async fn run(self) {
        // One extra byte so oversized datagrams are detectable
        let mut buf = vec![0u8; self.max_packet_size + 1];

        loop {
            let (len, from) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    tracing::error!(error = %e, "No broadcast packet found");
                    continue;
                }
            };

            match self.classify(&buf[..len], &from) {
                Announcement::Station { addr, name } => {
                    tracing::debug!(from = %from, name = %name, "Received broadcast packet");
                    if self.node.record(&addr, &name).await.is_err() {
                        break;
                    }
                }
                Announcement::OwnAdvertisement => {}
                Announcement::Invalid => {
                    tracing::warn!(from = %from, bytes = len, "Discarding invalid broadcast packet");
                }
            }
        }

        tracing::debug!("Discovery listener stopped");
    }

    /// Run on a background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
