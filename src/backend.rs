//! Station backend lifecycle
//!
//! Starts and stops everything one node runs: the node actor, the session
//! server, and the advertiser/discovery pair sharing the broadcast socket.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::client::SubscriptionClient;
use crate::config::StationConfig;
use crate::discovery::{bind_broadcast_socket, Advertiser, DiscoveryListener, ServiceDirectory};
use crate::error::{ConfigError, Error, Result};
use crate::library::Library;
use crate::net::format_hostname;
use crate::node::{EventSourceSet, NodeHandle};
use crate::registry::FanoutRegistry;
use crate::routing::BranchRouter;
use crate::server::SubscriptionServer;

const ADVERTISER_SOURCE: &str = "broadcast";
const DISCOVERY_SOURCE: &str = "service";

/// A running station
pub struct RtpBackend {
    config: StationConfig,
    node: NodeHandle,
    node_task: Option<JoinHandle<()>>,
    session_addr: SocketAddr,
    server_stop: Option<oneshot::Sender<()>>,
    server_task: Option<JoinHandle<()>>,
    events: EventSourceSet,
    broadcast_socket: Option<Arc<UdpSocket>>,
    broadcast_target: SocketAddr,
}

impl RtpBackend {
    /// Validate `config` and start the station.
    ///
    /// Configuration problems fail with [`Error::Config`]; sockets that cannot
    /// be bound fail with [`Error::BackendStartup`]. Nothing is left running
    /// on failure.
    pub async fn start(config: StationConfig, router: Arc<dyn BranchRouter>) -> Result<Self> {
        config.validate()?;

        let hostname = format_hostname(&config.hostname);
        let host_ip: IpAddr = hostname
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(config.hostname.clone()))?;

        let registry = FanoutRegistry::new(config.max_subscribers, router);
        let (node, node_task) = NodeHandle::spawn(registry, ServiceDirectory::new());

        let pieces = Self::bind_sockets(&config, host_ip, &node).await;
        let (server, socket, advertiser) = match pieces {
            Ok(pieces) => pieces,
            Err(e) => {
                let _ = node.shutdown().await;
                return Err(e);
            }
        };

        let session_addr = server.local_addr();
        let broadcast_target = advertiser.target();

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server_task = tokio::spawn(async move {
            server
                .run_until(async {
                    let _ = stop_rx.await;
                })
                .await;
        });

        let mut events = EventSourceSet::new();
        events.register(ADVERTISER_SOURCE, advertiser.spawn());
        events.register(
            DISCOVERY_SOURCE,
            DiscoveryListener::new(
                Arc::clone(&socket),
                &hostname,
                config.max_packet_size,
                node.clone(),
            )
            .spawn(),
        );

        tracing::info!(
            session = %session_addr,
            broadcast = %broadcast_target,
            max_subscribers = config.max_subscribers,
            "RTP backend started"
        );

        Ok(Self {
            config,
            node,
            node_task: Some(node_task),
            session_addr,
            server_stop: Some(stop_tx),
            server_task: Some(server_task),
            events,
            broadcast_socket: Some(socket),
            broadcast_target,
        })
    }

    async fn bind_sockets(
        config: &StationConfig,
        host_ip: IpAddr,
        node: &NodeHandle,
    ) -> Result<(SubscriptionServer, Arc<UdpSocket>, Advertiser)> {
        let server = SubscriptionServer::bind(
            SocketAddr::new(host_ip, config.port),
            config.max_subscribers,
            node.clone(),
        )
        .await?;

        let broadcast_bind = SocketAddr::V4(SocketAddrV4::new(
            Ipv4Addr::UNSPECIFIED,
            config.broadcast_port,
        ));
        let socket = bind_broadcast_socket(broadcast_bind)
            .map_err(|e| Error::BackendStartup(format!("{}: {}", broadcast_bind, e)))?;

        let advertiser = Advertiser::from_config(config, Arc::clone(&socket))?;
        Ok((server, socket, advertiser))
    }

    /// Handle onto the node actor
    pub fn node(&self) -> &NodeHandle {
        &self.node
    }

    /// Library of discovered stations
    pub fn library(&self) -> Library {
        Library::new(self.node.clone())
    }

    /// Client for subscribing to other stations
    pub fn client(&self) -> SubscriptionClient {
        SubscriptionClient::from_config(&self.config)
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Address the session server listens on
    pub fn session_addr(&self) -> SocketAddr {
        self.session_addr
    }

    /// Where announcements are sent
    pub fn broadcast_target(&self) -> SocketAddr {
        self.broadcast_target
    }

    pub fn is_running(&self) -> bool {
        self.broadcast_socket.is_some()
    }

    /// Stop the station.
    ///
    /// Stops accepting sessions and cancels live ones, cancels the advertiser
    /// and discovery watch, removes every subscriber branch, and only then
    /// releases the broadcast socket.
    pub async fn stop(&mut self) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }

        if let Some(stop) = self.server_stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.server_task.take() {
            let _ = task.await;
        }

        self.events.deregister_all();

        let swept = self.node.remove_all().await;
        let _ = self.node.shutdown().await;
        if let Some(task) = self.node_task.take() {
            let _ = task.await;
        }

        self.broadcast_socket = None;

        let swept = swept?;
        tracing::info!(swept = swept, "RTP backend stopped");
        Ok(())
    }
}

impl Drop for RtpBackend {
    fn drop(&mut self) {
        if let Some(task) = self.server_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::net::{TcpListener, TcpStream};

    use super::*;
    use crate::routing::recording::RecordingRouter;

    async fn free_tcp_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    async fn free_udp_port() -> u16 {
        let socket = UdpSocket::bind("0.0.0.0:0").await.unwrap();
        socket.local_addr().unwrap().port()
    }

    async fn test_config(max: usize) -> StationConfig {
        StationConfig::default()
            .hostname("127.0.0.1")
            .port(free_tcp_port().await)
            .broadcast_port(free_udp_port().await)
            .max_subscribers(max)
            .broadcast_period(Duration::from_millis(50))
            .reply_timeout(Duration::from_millis(100))
    }

    async fn start(max: usize) -> (RtpBackend, Arc<RecordingRouter>) {
        let router = Arc::new(RecordingRouter::new());
        let backend = RtpBackend::start(test_config(max).await, router.clone())
            .await
            .unwrap();
        (backend, router)
    }

    #[tokio::test]
    async fn test_subscribe_round_trip() {
        let (mut backend, router) = start(2).await;
        let client = backend.client();

        let port = client.subscribe("127.0.0.1").await.unwrap();
        let branch = format!("{}@127.0.0.1", port);
        assert!(router.has(&branch));
        assert_eq!(backend.node().subscriber_count().await.unwrap(), 1);

        assert!(client.unsubscribe("127.0.0.1", port).await);
        assert!(!router.has(&branch));
        assert_eq!(backend.node().subscriber_count().await.unwrap(), 0);

        backend.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_capacity_enforced_end_to_end() {
        let (mut backend, router) = start(1).await;
        let client = backend.client();

        client.subscribe("127.0.0.1").await.unwrap();
        // The session cap is also 1; let the first session's slot free up
        tokio::time::sleep(Duration::from_millis(100)).await;
        match client.subscribe("127.0.0.1").await {
            Err(Error::Rejected(reply)) => assert_eq!(reply, "error subscriber_limit_reached"),
            other => panic!("unexpected result: {:?}", other),
        }

        assert_eq!(router.live().len(), 1);
        backend.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_refused_branch_fails_subscribe() {
        let router = Arc::new(RecordingRouter::failing_for("127.0.0.1"));
        let mut backend = RtpBackend::start(test_config(2).await, router.clone())
            .await
            .unwrap();

        let result = backend.client().subscribe("127.0.0.1").await;

        assert!(matches!(result, Err(Error::Rejected(_))));
        assert_eq!(backend.node().subscriber_count().await.unwrap(), 0);
        assert!(router.live().is_empty());
        backend.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_sweeps_registry_and_closes_listener() {
        let (mut backend, router) = start(3).await;
        let client = backend.client();
        client.subscribe("127.0.0.1").await.unwrap();
        client.subscribe("127.0.0.1").await.unwrap();
        assert_eq!(router.live().len(), 2);

        let session_addr = backend.session_addr();
        backend.stop().await.unwrap();

        assert!(!backend.is_running());
        assert!(router.live().is_empty());
        assert!(backend.node().is_closed());
        assert!(TcpStream::connect(session_addr).await.is_err());

        // Stopping twice is harmless
        backend.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_aborts_start() {
        let router = Arc::new(RecordingRouter::new());
        let config = test_config(1).await.hostname("station.local");

        let result = RtpBackend::start(config, router).await;
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidAddress(_)))
        ));
    }

    #[tokio::test]
    async fn test_port_in_use_aborts_start() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let router = Arc::new(RecordingRouter::new());
        let config = test_config(1)
            .await
            .port(taken.local_addr().unwrap().port());

        let result = RtpBackend::start(config, router).await;
        assert!(matches!(result, Err(Error::BackendStartup(_))));
    }

    #[tokio::test]
    async fn test_broadcast_target_and_library() {
        let (mut backend, _) = start(1).await;

        assert_eq!(
            backend.broadcast_target(),
            SocketAddr::new(
                IpAddr::V4(Ipv4Addr::new(127, 0, 0, 255)),
                backend.config().broadcast_port
            )
        );
        // Our own announcements never show up in the library
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(backend
            .library()
            .browse()
            .await
            .unwrap()
            .iter()
            .all(|track| track.uri != "rtp:127.0.0.1"));

        backend.stop().await.unwrap();
    }
}
