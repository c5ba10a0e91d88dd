//! Media routing collaborator
//!
//! The fan-out registry never touches media itself. It asks a [`BranchRouter`]
//! to add or remove one delivery branch per subscriber while the stream keeps
//! flowing to every other branch.
//!
//! # Architecture
//!
//! ```text
//!        producer (encoded packets)
//!                 │
//!                 ▼
//!        broadcast::Sender<Bytes>
//!                 │
//!     ┌───────────┼───────────┐
//!     ▼           ▼           ▼
//!  branch      branch      branch        one task per BranchId
//!  100@h1      200@h2      300@h3
//!     │           │           │
//!     └──► UdpSocket::send_to ◄┘        unicast to each subscriber
//! ```

pub mod fanout;

#[cfg(test)]
pub(crate) mod recording;

use std::fmt;

use thiserror::Error;

pub use fanout::UdpFanout;

/// Service name used as the sink prefix
pub const SERVICE_NAME: &str = "rtp";

/// Identifier of one delivery branch, derived from `(host, port)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(String);

impl BranchId {
    /// Build the identifier for a subscriber endpoint
    pub fn new(host: &str, port: u16) -> Self {
        Self(format!("{}@{}", port, host))
    }

    /// Identifier as `"<port>@<host>"`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full sink element name, e.g. `rtp:audio:5000@10.0.0.7`
    pub fn sink_name(&self) -> String {
        format!("{}:audio:{}", SERVICE_NAME, self.0)
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure to create a delivery branch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("cannot route to {host}:{port}")]
    Unroutable { host: String, port: u16 },

    #[error("routing graph unavailable: {0}")]
    Unavailable(String),
}

/// Capability to mutate the live delivery graph.
///
/// Both operations must be idempotent and safe to call while other branches
/// are transporting data.
pub trait BranchRouter: Send + Sync {
    /// Start delivering the stream to `host:port` under `id`
    fn add_branch(&self, id: &BranchId, host: &str, port: u16) -> Result<(), RoutingError>;

    /// Stop delivering to the branch named `id`
    fn remove_branch(&self, id: &BranchId);
}
