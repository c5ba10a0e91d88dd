//! Cancellable background event sources

use std::collections::HashMap;

use tokio::task::JoinHandle;

/// Named periodic/IO tasks owned by the backend lifecycle
/// (the advertiser timer and the discovery socket watch).
#[derive(Default)]
pub struct EventSourceSet {
    sources: HashMap<&'static str, JoinHandle<()>>,
}

impl EventSourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `handle` under `name`, aborting any task it replaces
    pub fn register(&mut self, name: &'static str, handle: JoinHandle<()>) {
        if let Some(previous) = self.sources.insert(name, handle) {
            previous.abort();
        }
    }

    /// Cancel one source; returns whether it was registered
    pub fn deregister(&mut self, name: &str) -> bool {
        match self.sources.remove(name) {
            Some(handle) => {
                handle.abort();
                tracing::debug!(source = name, "Event source cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every source
    pub fn deregister_all(&mut self) {
        for (name, handle) in self.sources.drain() {
            handle.abort();
            tracing::debug!(source = name, "Event source cancelled");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Drop for EventSourceSet {
    fn drop(&mut self) {
        self.deregister_all();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn forever() -> JoinHandle<()> {
        tokio::spawn(async {
            loop {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        })
    }

    #[tokio::test]
    async fn test_register_and_deregister() {
        let mut events = EventSourceSet::new();
        events.register("broadcast", forever());
        events.register("service", forever());
        assert_eq!(events.len(), 2);

        assert!(events.deregister("broadcast"));
        assert!(!events.deregister("broadcast"));
        assert!(events.contains("service"));

        events.deregister_all();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_register_replaces_and_aborts() {
        let mut events = EventSourceSet::new();
        let (guard, dropped) = tokio::sync::oneshot::channel::<()>();
        let first = tokio::spawn(async move {
            let _guard = guard;
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });

        events.register("broadcast", first);
        events.register("broadcast", forever());

        assert_eq!(events.len(), 1);
        // The replaced task is dropped, releasing its guard
        assert!(dropped.await.is_err());
    }
}
