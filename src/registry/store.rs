//! Fan-out registry implementation

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::routing::BranchRouter;

use super::entry::Subscriber;
use super::error::RegistryError;

/// Bounded set of active subscribers
///
/// Not internally synchronized: the node actor is its single owner.
pub struct FanoutRegistry {
    /// Current subscribers
    subscribers: BTreeSet<Subscriber>,

    /// Capacity
    max_subscribers: usize,

    /// Routing graph collaborator
    router: Arc<dyn BranchRouter>,
}

impl FanoutRegistry {
    /// Create an empty registry
    pub fn new(max_subscribers: usize, router: Arc<dyn BranchRouter>) -> Self {
        Self {
            subscribers: BTreeSet::new(),
            max_subscribers,
            router,
        }
    }

    /// Configured capacity
    pub fn max_subscribers(&self) -> usize {
        self.max_subscribers
    }

    /// Number of active subscribers
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Check membership
    pub fn contains(&self, host: &str, port: u16) -> bool {
        self.subscribers.contains(&Subscriber::new(host, port))
    }

    /// Snapshot of the current subscribers
    pub fn subscribers(&self) -> Vec<Subscriber> {
        self.subscribers.iter().cloned().collect()
    }

    /// Admit a subscriber, adding its delivery branch.
    ///
    /// Re-admitting a present subscriber succeeds without touching the router.
    /// On failure neither the set nor the routing graph changes.
    pub fn try_admit(&mut self, host: &str, port: u16) -> Result<(), RegistryError> {
        let subscriber = Subscriber::new(host, port);

        if self.subscribers.contains(&subscriber) {
            tracing::debug!(subscriber = %subscriber, "Subscriber already admitted");
            return Ok(());
        }

        if self.subscribers.len() >= self.max_subscribers {
            tracing::info!(
                subscriber = %subscriber,
                max = self.max_subscribers,
                "Subscriber rejected: limit reached"
            );
            return Err(RegistryError::CapacityReached {
                max: self.max_subscribers,
            });
        }

        self.router
            .add_branch(&subscriber.branch_id(), &subscriber.host, subscriber.port)?;

        tracing::info!(
            subscriber = %subscriber,
            subscribers = self.subscribers.len() + 1,
            "Subscriber admitted"
        );
        self.subscribers.insert(subscriber);

        Ok(())
    }

    /// Admit a subscriber; `false` when it could not be admitted
    pub fn admit(&mut self, host: &str, port: u16) -> bool {
        match self.try_admit(host, port) {
            Ok(()) => true,
            Err(RegistryError::CapacityReached { .. }) => false,
            Err(e) => {
                tracing::warn!(host = host, port = port, error = %e, "Subscriber not admitted");
                false
            }
        }
    }

    /// Remove a subscriber and its delivery branch.
    ///
    /// Returns `false` (and logs) if the subscriber was not present.
    pub fn remove(&mut self, host: &str, port: u16) -> bool {
        let subscriber = Subscriber::new(host, port);

        if !self.subscribers.remove(&subscriber) {
            tracing::warn!(
                subscriber = %subscriber,
                "Subscriber can not be removed - not in subscriber list"
            );
            return false;
        }

        self.router.remove_branch(&subscriber.branch_id());
        tracing::info!(
            subscriber = %subscriber,
            subscribers = self.subscribers.len(),
            "Subscriber removed"
        );
        true
    }

    /// Remove every subscriber and branch. Returns how many were removed.
    pub fn remove_all(&mut self) -> usize {
        let count = self.subscribers.len();

        for subscriber in std::mem::take(&mut self.subscribers) {
            self.router.remove_branch(&subscriber.branch_id());
            tracing::debug!(subscriber = %subscriber, "Subscriber swept");
        }

        if count > 0 {
            tracing::info!(removed = count, "All subscribers removed");
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::recording::RecordingRouter;
    use crate::routing::RoutingError;

    fn registry(max: usize) -> (FanoutRegistry, Arc<RecordingRouter>) {
        let router = Arc::new(RecordingRouter::new());
        (FanoutRegistry::new(max, router.clone()), router)
    }

    #[test]
    fn test_capacity_scenario() {
        let (mut registry, router) = registry(2);

        assert!(registry.admit("h1", 100));
        assert!(registry.admit("h2", 200));
        assert!(!registry.admit("h3", 300));

        assert_eq!(registry.len(), 2);
        assert!(!registry.contains("h3", 300));
        assert!(!router.has("300@h3"));
        assert_eq!(router.live().len(), 2);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let (mut registry, router) = registry(3);

        for port in 1..=20u16 {
            registry.admit(&format!("10.0.0.{}", port % 7), port);
            assert!(registry.len() <= 3);
            assert_eq!(router.live().len(), registry.len());
        }
    }

    #[test]
    fn test_capacity_error_reports_max() {
        let (mut registry, _) = registry(1);
        registry.try_admit("h1", 100).unwrap();

        assert_eq!(
            registry.try_admit("h2", 200),
            Err(RegistryError::CapacityReached { max: 1 })
        );
    }

    #[test]
    fn test_duplicate_admit_single_branch() {
        let (mut registry, router) = registry(4);

        assert!(registry.admit("10.0.0.7", 5000));
        assert!(registry.admit("10.0.0.7", 5000));

        assert_eq!(registry.len(), 1);
        assert_eq!(router.add_calls(), 1);
        assert!(router.has("5000@10.0.0.7"));
    }

    #[test]
    fn test_duplicate_admit_when_full() {
        let (mut registry, router) = registry(1);

        assert!(registry.admit("h1", 100));
        assert!(registry.admit("h1", 100));
        assert_eq!(router.add_calls(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (mut registry, router) = registry(2);
        registry.admit("h1", 100);

        assert!(!registry.remove("h1", 500));
        assert!(!registry.remove("h9", 100));

        assert_eq!(registry.len(), 1);
        assert_eq!(router.remove_calls(), 0);
    }

    #[test]
    fn test_remove_drops_branch() {
        let (mut registry, router) = registry(2);
        registry.admit("h1", 100);
        registry.admit("h2", 200);

        assert!(registry.remove("h1", 100));

        assert_eq!(registry.len(), 1);
        assert!(!router.has("100@h1"));
        assert!(router.has("200@h2"));

        // Freed slot can be reused
        assert!(registry.admit("h3", 300));
    }

    #[test]
    fn test_remove_all() {
        let (mut registry, router) = registry(3);
        registry.admit("h1", 100);
        registry.admit("h2", 200);
        registry.admit("h3", 300);

        assert_eq!(registry.remove_all(), 3);
        assert!(registry.is_empty());
        assert!(router.live().is_empty());
        assert_eq!(registry.remove_all(), 0);
    }

    #[test]
    fn test_routing_failure_is_atomic() {
        let router = Arc::new(RecordingRouter::failing_for("bad"));
        let mut registry = FanoutRegistry::new(2, router.clone());

        assert_eq!(
            registry.try_admit("bad", 100),
            Err(RegistryError::Routing(RoutingError::Unroutable {
                host: "bad".to_string(),
                port: 100
            }))
        );
        assert!(!registry.admit("bad", 100));
        assert!(registry.is_empty());
        assert!(router.live().is_empty());
    }
}
