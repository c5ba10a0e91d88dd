//! Subscription client
//!
//! The server never confirms a successful request; it only speaks up to
//! refuse one. The client therefore waits `reply_timeout` after sending and
//! treats silence (or an explicit `OK`) as success.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;

use crate::config::StationConfig;
use crate::error::{Error, Result};
use crate::session::{Request, SUCCESS_SENTINEL};

/// Greeting prefix every server sends
const GREETING_PREFIX: &str = "OK RTP";

/// Client for a remote station's session server
#[derive(Debug, Clone)]
pub struct SubscriptionClient {
    session_port: u16,
    bind_host: String,
    connection_timeout: Duration,
    reply_timeout: Duration,
}

impl SubscriptionClient {
    /// Create a client dialing `session_port` on remote stations and
    /// receiving on `bind_host`
    pub fn new(session_port: u16, bind_host: impl Into<String>) -> Self {
        let defaults = StationConfig::default();
        Self {
            session_port,
            bind_host: bind_host.into(),
            connection_timeout: defaults.connection_timeout,
            reply_timeout: defaults.reply_timeout,
        }
    }

    /// Client settings matching this node's configuration
    pub fn from_config(config: &StationConfig) -> Self {
        Self {
            session_port: config.port,
            bind_host: config.hostname.clone(),
            connection_timeout: config.connection_timeout,
            reply_timeout: config.reply_timeout,
        }
    }

    /// Set the connect/greeting timeout
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the silent-success window
    pub fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Find a free local UDP port.
    ///
    /// The probe socket is closed again so the media receiver can bind it.
    pub async fn allocate_port(&self) -> io::Result<u16> {
        let probe = UdpSocket::bind((self.bind_host.as_str(), 0)).await?;
        let port = probe.local_addr()?.port();
        drop(probe);
        Ok(port)
    }

    /// Subscribe to `peer_host`'s stream; returns the local port it will
    /// arrive on. Never retried.
    pub async fn subscribe(&self, peer_host: &str) -> Result<u16> {
        let result = async {
            let port = self.allocate_port().await?;
            self.round_trip(peer_host, Request::Subscribe(port)).await?;
            Ok::<u16, Error>(port)
        }
        .await;

        match &result {
            Ok(port) => tracing::info!(peer = peer_host, port = port, "Subscribed"),
            Err(e) => tracing::warn!(peer = peer_host, error = %e, "Subscribe failed"),
        }
        result
    }

    /// Stop `peer_host` streaming to local `port`; `true` if the round trip
    /// completed without an error reply
    pub async fn unsubscribe(&self, peer_host: &str, port: u16) -> bool {
        match self.round_trip(peer_host, Request::Unsubscribe(port)).await {
            Ok(()) => {
                tracing::info!(peer = peer_host, port = port, "Unsubscribed");
                true
            }
            Err(e) => {
                tracing::warn!(peer = peer_host, port = port, error = %e, "Unsubscribe failed");
                false
            }
        }
    }

    async fn round_trip(&self, peer_host: &str, request: Request) -> Result<()> {
        let stream = timeout(
            self.connection_timeout,
            TcpStream::connect((peer_host, self.session_port)),
        )
        .await
        .map_err(|_| timed_out("connect"))??;

        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut line = String::new();

        let n = timeout(self.connection_timeout, reader.read_line(&mut line))
            .await
            .map_err(|_| timed_out("greeting"))??;
        if n == 0 {
            return Err(Error::Rejected("connection closed before greeting".into()));
        }
        tracing::debug!(peer = peer_host, reply = line.trim_end(), "Connection reply");
        if !line.starts_with(GREETING_PREFIX) {
            return Err(Error::Rejected(line.trim_end().to_string()));
        }

        write_half
            .write_all(format!("{}\n", request).as_bytes())
            .await?;

        line.clear();
        match timeout(self.reply_timeout, reader.read_line(&mut line)).await {
            // Silence means the request was applied
            Err(_) => Ok(()),
            Ok(Ok(0)) => Err(Error::Rejected("connection closed".into())),
            Ok(Ok(_)) => {
                let reply = line.trim_end();
                tracing::debug!(peer = peer_host, reply = reply, "Request reply");
                if reply == SUCCESS_SENTINEL {
                    Ok(())
                } else {
                    Err(Error::Rejected(reply.to_string()))
                }
            }
            Ok(Err(e)) => Err(e.into()),
        }
    }
}

fn timed_out(stage: &str) -> Error {
    Error::Transport(io::Error::new(
        io::ErrorKind::TimedOut,
        format!("{} timed out", stage),
    ))
}
