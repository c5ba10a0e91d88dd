use tokio::sync::mpsc;

use crate::discovery::ServiceDirectory;
use crate::registry::FanoutRegistry;

use super::NodeCommand;

/// Owner of all node-local mutable state
pub(super) struct NodeActor {
    registry: FanoutRegistry,
    directory: ServiceDirectory,
}

impl NodeActor {
    pub(super) fn new(registry: FanoutRegistry, directory: ServiceDirectory) -> Self {
        Self {
            registry,
            directory,
        }
    }

    pub(super) async fn run(mut self, mut rx: mpsc::Receiver<NodeCommand>) {
        while let Some(command) = rx.recv().await {
            match command {
                NodeCommand::Admit { host, port, reply } => {
                    let _ = reply.send(self.registry.try_admit(&host, port));
                }
                NodeCommand::Remove { host, port, reply } => {
                    let _ = reply.send(self.registry.remove(&host, port));
                }
                NodeCommand::RemoveAll(reply) => {
                    let _ = reply.send(self.registry.remove_all());
                }
                NodeCommand::Subscribers(reply) => {
                    let _ = reply.send(self.registry.subscribers());
                }
                NodeCommand::Record { addr, name } => {
                    tracing::debug!(addr = %addr, name = %name, "Station recorded");
                    self.directory.record(addr, name);
                }
                NodeCommand::Peers(reply) => {
                    let _ = reply.send(self.directory.list());
                }
                NodeCommand::Lookup { addr, reply } => {
                    let _ = reply.send(self.directory.lookup(&addr).map(str::to_string));
                }
                NodeCommand::Shutdown(reply) => {
                    let swept = self.registry.remove_all();
                    self.directory.clear();
                    tracing::debug!(swept = swept, "Node actor stopping");
                    let _ = reply.send(swept);
                    return;
                }
            }
        }

        // Every handle dropped without an explicit shutdown
        self.registry.remove_all();
        tracing::debug!("Node actor handles dropped, stopping");
    }
}
