//! Discovered station directory

use std::collections::HashMap;

/// Mapping from peer address to advertised station name.
///
/// Written only by the discovery listener (through the node actor). The
/// directory does not filter the node's own address; callers do.
#[derive(Debug, Default, Clone)]
pub struct ServiceDirectory {
    services: HashMap<String, String>,
}

impl ServiceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `addr`
    pub fn record(&mut self, addr: impl Into<String>, name: impl Into<String>) {
        self.services.insert(addr.into(), name.into());
    }

    /// Snapshot of all entries, in no particular order
    pub fn list(&self) -> Vec<(String, String)> {
        self.services
            .iter()
            .map(|(addr, name)| (addr.clone(), name.clone()))
            .collect()
    }

    /// Station name advertised by `addr`
    pub fn lookup(&self, addr: &str) -> Option<&str> {
        self.services.get(addr).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Forget every entry
    pub fn clear(&mut self) {
        self.services.clear();
    }
}
