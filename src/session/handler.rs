//! Per-connection session handler

use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::node::NodeHandle;
use crate::registry::RegistryError;

use super::codec::{encode_line, LineBuffer};
use super::command::{Reply, Request};
use super::state::{SessionPhase, SessionState};

/// Runs the subscribe/unsubscribe protocol on one connection.
///
/// Every registry mutation goes through the node actor. Closing the connection
/// does not unsubscribe anything.
pub struct SessionHandler<S> {
    state: SessionState,
    stream: S,
    node: NodeHandle,
    lines: LineBuffer,
    write_buf: BytesMut,
}

impl<S> SessionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(session_id: u64, stream: S, peer_addr: SocketAddr, node: NodeHandle) -> Self {
        Self {
            state: SessionState::new(session_id, peer_addr),
            stream,
            node,
            lines: LineBuffer::new(),
            write_buf: BytesMut::with_capacity(128),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Run until the peer disconnects or sends undecodable data
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(
            session_id = self.state.id,
            peer = %self.state.peer_addr,
            "New RTP connection"
        );

        let result = self.serve().await;
        self.state.close();

        tracing::debug!(
            session_id = self.state.id,
            lines = self.state.lines_received,
            duration_ms = self.state.duration().as_millis() as u64,
            "Session closed"
        );
        result
    }

    async fn serve(&mut self) -> Result<()> {
        self.send(Reply::Greeting).await?;
        self.state.mark_ready();

        loop {
            loop {
                let line = match self.lines.next_line() {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(
                            session_id = self.state.id,
                            peer = %self.state.peer_addr,
                            error = %e,
                            "Stopping session, data supplied by client was not valid"
                        );
                        return Err(e.into());
                    }
                };

                if let Some(reply) = self.handle_line(&line).await {
                    self.send(reply).await?;
                }
            }

            if self.stream.read_buf(self.lines.buffer_mut()).await? == 0 {
                return Ok(());
            }
        }
    }

    /// Process one request line; returns the reply to send, if any
    pub async fn handle_line(&mut self, line: &str) -> Option<Reply> {
        self.state.on_line();
        tracing::info!(
            session_id = self.state.id,
            peer = %self.state.peer_addr,
            request = line,
            "Request received"
        );

        match Request::parse(line) {
            Some(Request::Subscribe(port)) => self.subscribe(port).await,
            Some(Request::Unsubscribe(port)) => {
                if let Err(e) = self.node.remove(&self.state.host, port).await {
                    tracing::warn!(session_id = self.state.id, error = %e, "Unsubscribe not applied");
                }
                None
            }
            None => Some(Reply::UnrecognizedCommand),
        }
    }

    /// Silent on success; every refused admission gets the limit reply so
    /// the client never mistakes it for success
    async fn subscribe(&mut self, port: u16) -> Option<Reply> {
        match self.node.try_admit(&self.state.host, port).await {
            Ok(()) => None,
            Err(Error::Registry(RegistryError::CapacityReached { .. })) => {
                Some(Reply::SubscriberLimitReached)
            }
            Err(e) => {
                tracing::warn!(
                    session_id = self.state.id,
                    port = port,
                    error = %e,
                    "Subscribe not applied"
                );
                Some(Reply::SubscriberLimitReached)
            }
        }
    }

    async fn send(&mut self, reply: Reply) -> Result<()> {
        let line = reply.to_string();
        tracing::debug!(session_id = self.state.id, response = %line, "Response");

        self.write_buf.clear();
        encode_line(&line, &mut self.write_buf);
        self.stream.write_all(&self.write_buf).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Phase after [`run`](Self::run) returned
    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }
}
