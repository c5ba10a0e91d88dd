//! Session state machine
//!
//! Tracks one session connection from accept to close. Subscription state is
//! not kept here; it lives in the fan-out registry.

use std::net::SocketAddr;
use std::time::Instant;

use crate::net::peer_host;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Connection accepted, greeting not yet sent
    Open,
    /// Greeting sent, processing request lines
    Ready,
    /// Connection ended
    Closed,
}

/// Per-connection session state
#[derive(Debug)]
pub struct SessionState {
    /// Unique session ID
    pub id: u64,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Peer host used as the subscriber host
    pub host: String,

    /// Current phase
    pub phase: SessionPhase,

    /// Connection start time
    pub connected_at: Instant,

    /// Request lines processed
    pub lines_received: u64,
}

impl SessionState {
    pub fn new(id: u64, peer_addr: SocketAddr) -> Self {
        Self {
            id,
            peer_addr,
            host: peer_host(&peer_addr),
            phase: SessionPhase::Open,
            connected_at: Instant::now(),
            lines_received: 0,
        }
    }

    /// Greeting sent
    pub fn mark_ready(&mut self) {
        if self.phase == SessionPhase::Open {
            self.phase = SessionPhase::Ready;
        }
    }

    /// Count a processed line
    pub fn on_line(&mut self) {
        self.lines_received += 1;
    }

    pub fn is_ready(&self) -> bool {
        self.phase == SessionPhase::Ready
    }

    /// Terminal transition, valid from any phase
    pub fn close(&mut self) {
        self.phase = SessionPhase::Closed;
    }

    pub fn duration(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}
