//! Test router that records branch mutations

use std::collections::BTreeMap;

use parking_lot::Mutex;

use super::{BranchId, BranchRouter, RoutingError};

#[derive(Default)]
pub(crate) struct RecordingRouter {
    branches: Mutex<BTreeMap<BranchId, (String, u16)>>,
    adds: Mutex<Vec<BranchId>>,
    removes: Mutex<Vec<BranchId>>,
    fail_host: Option<String>,
}

impl RecordingRouter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Router that refuses branches towards `host`
    pub(crate) fn failing_for(host: &str) -> Self {
        Self {
            fail_host: Some(host.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn live(&self) -> Vec<BranchId> {
        self.branches.lock().keys().cloned().collect()
    }

    pub(crate) fn has(&self, id: &str) -> bool {
        self.branches.lock().keys().any(|b| b.as_str() == id)
    }

    pub(crate) fn add_calls(&self) -> usize {
        self.adds.lock().len()
    }

    pub(crate) fn remove_calls(&self) -> usize {
        self.removes.lock().len()
    }
}

impl BranchRouter for RecordingRouter {
    fn add_branch(&self, id: &BranchId, host: &str, port: u16) -> Result<(), RoutingError> {
        if self.fail_host.as_deref() == Some(host) {
            return Err(RoutingError::Unroutable {
                host: host.to_string(),
                port,
            });
        }
        self.adds.lock().push(id.clone());
        self.branches
            .lock()
            .insert(id.clone(), (host.to_string(), port));
        Ok(())
    }

    fn remove_branch(&self, id: &BranchId) {
        self.removes.lock().push(id.clone());
        self.branches.lock().remove(id);
    }
}
