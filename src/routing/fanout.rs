//! Unicast UDP fan-out
//!
//! Encoded packets are published once on a `tokio::sync::broadcast` channel.
//! Each branch owns a task holding its own receiver and forwarding every packet
//! to its subscriber endpoint. `Bytes` is reference-counted, so branches share
//! the packet allocation.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::PipelineConfig;

use super::{BranchId, BranchRouter, RoutingError};

/// Default packet backlog per branch before a slow branch starts skipping
pub const DEFAULT_PACKET_BACKLOG: usize = 256;

/// Router that delivers packets to every branch over unicast UDP
pub struct UdpFanout {
    pipeline: PipelineConfig,
    socket: Arc<UdpSocket>,
    tx: broadcast::Sender<Bytes>,
    branches: Mutex<HashMap<BranchId, JoinHandle<()>>>,
}

impl UdpFanout {
    /// Bind the outbound socket on an ephemeral port
    pub async fn bind(pipeline: PipelineConfig) -> std::io::Result<Self> {
        Self::bind_with_backlog(pipeline, DEFAULT_PACKET_BACKLOG).await
    }

    /// Bind with a custom per-branch backlog
    pub async fn bind_with_backlog(
        pipeline: PipelineConfig,
        backlog: usize,
    ) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let (tx, _) = broadcast::channel(backlog.max(1));

        tracing::debug!(
            encoder = %pipeline.encoder,
            caps = %pipeline.caps,
            local = ?socket.local_addr().ok(),
            "UDP fan-out ready"
        );

        Ok(Self {
            pipeline,
            socket: Arc::new(socket),
            tx,
            branches: Mutex::new(HashMap::new()),
        })
    }

    /// Pipeline identifiers this router was built with
    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }

    /// Sender the media producer publishes encoded packets on
    pub fn sender(&self) -> broadcast::Sender<Bytes> {
        self.tx.clone()
    }

    /// Publish one packet to every live branch.
    ///
    /// Returns the number of branches it was queued for.
    pub fn publish(&self, packet: Bytes) -> usize {
        self.tx.send(packet).unwrap_or(0)
    }

    /// Number of live branches
    pub fn branch_count(&self) -> usize {
        self.branches.lock().len()
    }

    /// Check whether a branch is live
    pub fn has_branch(&self, id: &BranchId) -> bool {
        self.branches.lock().contains_key(id)
    }

    fn spawn_branch(&self, id: BranchId, target: SocketAddr) -> Result<JoinHandle<()>, RoutingError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| RoutingError::Unavailable(e.to_string()))?;

        let socket = Arc::clone(&self.socket);
        let mut rx = self.tx.subscribe();

        Ok(runtime.spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(packet) => {
                        if let Err(e) = socket.send_to(&packet, target).await {
                            tracing::debug!(branch = %id, error = %e, "Packet send failed");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(branch = %id, skipped = skipped, "Branch lagging, packets dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }))
    }
}

impl BranchRouter for UdpFanout {
    fn add_branch(&self, id: &BranchId, host: &str, port: u16) -> Result<(), RoutingError> {
        let mut branches = self.branches.lock();
        if branches.contains_key(id) {
            return Ok(());
        }

        let ip: IpAddr = host.parse().map_err(|_| RoutingError::Unroutable {
            host: host.to_string(),
            port,
        })?;
        let handle = self.spawn_branch(id.clone(), SocketAddr::new(ip, port))?;
        branches.insert(id.clone(), handle);

        tracing::info!(branch = %id, sink = %id.sink_name(), "Delivery branch added");
        Ok(())
    }

    fn remove_branch(&self, id: &BranchId) {
        if let Some(handle) = self.branches.lock().remove(id) {
            handle.abort();
            tracing::info!(branch = %id, "Delivery branch removed");
        }
    }
}

impl Drop for UdpFanout {
    fn drop(&mut self) {
        for (_, handle) in self.branches.lock().drain() {
            handle.abort();
        }
    }
}
