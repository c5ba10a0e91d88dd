//! Subscriber entries

use std::fmt;

use crate::routing::BranchId;

/// One receiving endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subscriber {
    /// Host as observed by the session transport
    pub host: String,
    /// UDP port the subscriber receives on
    pub port: u16,
}

impl Subscriber {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Routing branch identifier for this subscriber
    pub fn branch_id(&self) -> BranchId {
        BranchId::new(&self.host, self.port)
    }
}

impl fmt::Display for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]:{}", self.host, self.port)
    }
}
