//! Node actor
//!
//! All mutable node-local state (the [`ServiceDirectory`] and the
//! [`FanoutRegistry`]) lives inside one tokio task. Session handlers, the
//! discovery listener and the library talk to it through a cloneable
//! [`NodeHandle`], so every mutation is serialized without locks.
//!
//! ```text
//!   SessionHandler ──┐
//!   SessionHandler ──┼──► mpsc<NodeCommand> ──► NodeActor { directory, registry }
//!   DiscoveryListener┘                               │
//!                                                    ▼
//!                                            BranchRouter (routing graph)
//! ```

mod actor;
pub mod events;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::discovery::ServiceDirectory;
use crate::error::{Error, Result};
use crate::registry::{FanoutRegistry, RegistryError, Subscriber};

pub use events::EventSourceSet;

use actor::NodeActor;

/// Command queue depth
const COMMAND_CAPACITY: usize = 256;

pub(crate) enum NodeCommand {
    Admit {
        host: String,
        port: u16,
        reply: oneshot::Sender<std::result::Result<(), RegistryError>>,
    },
    Remove {
        host: String,
        port: u16,
        reply: oneshot::Sender<bool>,
    },
    RemoveAll(oneshot::Sender<usize>),
    Subscribers(oneshot::Sender<Vec<Subscriber>>),
    Record {
        addr: String,
        name: String,
    },
    Peers(oneshot::Sender<Vec<(String, String)>>),
    Lookup {
        addr: String,
        reply: oneshot::Sender<Option<String>>,
    },
    Shutdown(oneshot::Sender<usize>),
}

/// Cheap-to-clone handle onto the node actor
#[derive(Clone)]
pub struct NodeHandle {
    tx: mpsc::Sender<NodeCommand>,
}

impl NodeHandle {
    /// Spawn the actor owning `registry` and `directory`
    pub fn spawn(
        registry: FanoutRegistry,
        directory: ServiceDirectory,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let actor = NodeActor::new(registry, directory);
        let task = tokio::spawn(actor.run(rx));

        (Self { tx }, task)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> NodeCommand,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| Error::NodeClosed)?;
        rx.await.map_err(|_| Error::NodeClosed)
    }

    /// Admit a subscriber; capacity and routing failures surface as
    /// [`Error::Registry`]
    pub async fn try_admit(&self, host: &str, port: u16) -> Result<()> {
        let host = host.to_string();
        self.request(|reply| NodeCommand::Admit { host, port, reply })
            .await?
            .map_err(Error::from)
    }

    /// Admit a subscriber; `false` on any failure
    pub async fn admit(&self, host: &str, port: u16) -> bool {
        self.try_admit(host, port).await.is_ok()
    }

    /// Remove a subscriber; `Ok(false)` if it was not present
    pub async fn remove(&self, host: &str, port: u16) -> Result<bool> {
        let host = host.to_string();
        self.request(|reply| NodeCommand::Remove { host, port, reply })
            .await
    }

    /// Remove every subscriber and its branch
    pub async fn remove_all(&self) -> Result<usize> {
        self.request(NodeCommand::RemoveAll).await
    }

    /// Snapshot of current subscribers
    pub async fn subscribers(&self) -> Result<Vec<Subscriber>> {
        self.request(NodeCommand::Subscribers).await
    }

    /// Number of current subscribers
    pub async fn subscriber_count(&self) -> Result<usize> {
        Ok(self.subscribers().await?.len())
    }

    /// Record a discovered station
    pub async fn record(&self, addr: &str, name: &str) -> Result<()> {
        self.tx
            .send(NodeCommand::Record {
                addr: addr.to_string(),
                name: name.to_string(),
            })
            .await
            .map_err(|_| Error::NodeClosed)
    }

    /// Snapshot of discovered `(addr, name)` pairs
    pub async fn peers(&self) -> Result<Vec<(String, String)>> {
        self.request(NodeCommand::Peers).await
    }

    /// Station name advertised by `addr`
    pub async fn lookup(&self, addr: &str) -> Result<Option<String>> {
        let addr = addr.to_string();
        self.request(|reply| NodeCommand::Lookup { addr, reply })
            .await
    }

    /// Sweep the registry, forget discovered peers, and stop the actor.
    ///
    /// Returns how many subscribers were swept.
    pub async fn shutdown(&self) -> Result<usize> {
        self.request(NodeCommand::Shutdown).await
    }

    /// Whether the actor is still running
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::*;
    use crate::routing::recording::RecordingRouter;

    pub(crate) fn spawn_node(max: usize) -> (NodeHandle, Arc<RecordingRouter>) {
        let router = Arc::new(RecordingRouter::new());
        let registry = FanoutRegistry::new(max, router.clone());
        let (node, _task) = NodeHandle::spawn(registry, ServiceDirectory::new());
        (node, router)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::spawn_node;
    use super::*;

    #[tokio::test]
    async fn test_admit_through_actor() {
        let (node, router) = spawn_node(2);

        assert!(node.admit("h1", 100).await);
        assert!(node.admit("h2", 200).await);
        assert!(!node.admit("h3", 300).await);

        assert_eq!(node.subscriber_count().await.unwrap(), 2);
        assert!(router.has("100@h1"));
        assert!(router.has("200@h2"));
    }

    #[tokio::test]
    async fn test_try_admit_reports_capacity() {
        let (node, _) = spawn_node(1);
        node.try_admit("h1", 100).await.unwrap();

        let err = node.try_admit("h2", 200).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Registry(RegistryError::CapacityReached { max: 1 })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_admits_respect_capacity() {
        let (node, router) = spawn_node(3);

        let mut tasks = Vec::new();
        for port in 1..=16u16 {
            let node = node.clone();
            tasks.push(tokio::spawn(async move { node.admit("10.0.0.2", port).await }));
        }

        let mut admitted = 0;
        for task in tasks {
            if task.await.unwrap() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 3);
        assert_eq!(router.live().len(), 3);
    }

    #[tokio::test]
    async fn test_remove_and_remove_all() {
        let (node, router) = spawn_node(4);
        node.admit("h1", 100).await;
        node.admit("h2", 200).await;

        assert!(!node.remove("h1", 500).await.unwrap());
        assert!(node.remove("h1", 100).await.unwrap());
        assert_eq!(node.remove_all().await.unwrap(), 1);
        assert!(router.live().is_empty());
    }

    #[tokio::test]
    async fn test_directory_through_actor() {
        let (node, _) = spawn_node(1);

        node.record("10.0.0.7", "Kitchen").await.unwrap();
        node.record("10.0.0.9", "Office").await.unwrap();

        assert_eq!(
            node.lookup("10.0.0.7").await.unwrap(),
            Some("Kitchen".to_string())
        );
        assert_eq!(node.lookup("10.0.0.8").await.unwrap(), None);
        assert_eq!(node.peers().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_sweeps_and_closes() {
        let (node, router) = spawn_node(2);
        node.admit("h1", 100).await;
        node.admit("h2", 200).await;

        assert_eq!(node.shutdown().await.unwrap(), 2);
        assert!(router.live().is_empty());

        assert!(matches!(node.peers().await, Err(Error::NodeClosed)));
        assert!(!node.admit("h3", 300).await);
    }
}
