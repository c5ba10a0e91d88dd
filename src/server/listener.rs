//! Session listener
//!
//! Handles the TCP accept loop and spawns one session handler per connection.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{Error, Result};
use crate::node::NodeHandle;
use crate::session::SessionHandler;

/// Accepts session connections, at most `max_connections` at a time.
///
/// Live handlers are owned by the serve loop and cancelled when it shuts down.
pub struct SubscriptionServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    node: NodeHandle,
    next_session_id: AtomicU64,
    connection_semaphore: Arc<Semaphore>,
}

impl SubscriptionServer {
    /// Bind the listener.
    ///
    /// Bind failures are fatal to the backend and surface as
    /// [`Error::BackendStartup`].
    pub async fn bind(addr: SocketAddr, max_connections: usize, node: NodeHandle) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::BackendStartup(format!("{}: {}", addr, e)))?;
        let local_addr = listener.local_addr()?;

        tracing::info!(addr = %local_addr, max_connections = max_connections, "RTP server running");

        Ok(Self {
            listener,
            local_addr,
            node,
            next_session_id: AtomicU64::new(1),
            connection_semaphore: Arc::new(Semaphore::new(max_connections)),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Connection slots currently free
    pub fn available_connections(&self) -> usize {
        self.connection_semaphore.available_permits()
    }

    /// Serve until `shutdown` completes, then cancel every live handler
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut handlers = JoinSet::new();

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
            }
            _ = self.accept_loop(&mut handlers) => {}
        }

        let live = handlers.len();
        handlers.shutdown().await;
        tracing::info!(cancelled = live, "RTP server stopped");
    }

    async fn accept_loop(&self, handlers: &mut JoinSet<()>) {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((socket, peer_addr)) => self.handle_connection(socket, peer_addr, handlers),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to accept connection");
                    }
                },
                Some(_) = handlers.join_next(), if !handlers.is_empty() => {}
            }
        }
    }

    fn handle_connection(
        &self,
        socket: TcpStream,
        peer_addr: SocketAddr,
        handlers: &mut JoinSet<()>,
    ) {
        let permit = match self.connection_semaphore.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                return;
            }
        };

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = socket.set_nodelay(true) {
            tracing::debug!(session_id = session_id, error = %e, "Failed to set TCP_NODELAY");
        }

        let node = self.node.clone();
        handlers.spawn(async move {
            let _permit = permit;
            let mut handler = SessionHandler::new(session_id, socket, peer_addr, node);

            if let Err(e) = handler.run().await {
                tracing::debug!(session_id = session_id, error = %e, "Session error");
            }
        });
    }
}
