//! Node Provisioning
//!
//! Acquiring machines for a host group is a collaborator concern: the core
//! only needs `count` new [`Node`]s for a named group. The inventory
//! provisioner hands out machines from a static list in the configuration.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::cluster::Node;
use crate::config::MachineEntry;
use crate::error::{OrchestratorError, Result};

#[async_trait]
pub trait NodeProvisioner: Send + Sync {
    /// Acquires `count` new nodes for `group`. Either all requested nodes
    /// are returned or the call fails; partial grants are not allowed.
    async fn provision(&self, group: &str, count: usize) -> Result<Vec<Node>>;

    /// Returns nodes to the underlying pool. Default: no-op.
    async fn release(&self, _nodes: &[Node]) -> Result<()> {
        Ok(())
    }
}

/// Hands out machines from a fixed inventory, grouped by host group name.
pub struct InventoryProvisioner {
    free: Mutex<HashMap<String, Vec<MachineEntry>>>,
}

impl InventoryProvisioner {
    pub fn new(inventory: Vec<MachineEntry>) -> Self {
        let mut free: HashMap<String, Vec<MachineEntry>> = HashMap::new();
        for entry in inventory {
            free.entry(entry.group.clone()).or_default().push(entry);
        }
        Self {
            free: Mutex::new(free),
        }
    }
}

#[async_trait]
impl NodeProvisioner for InventoryProvisioner {
    async fn provision(&self, group: &str, count: usize) -> Result<Vec<Node>> {
        let mut free = self.free.lock().await;
        let pool = free.entry(group.to_string()).or_default();
        if pool.len() < count {
            return Err(OrchestratorError::provision(format!(
                "inventory exhausted for group '{group}': requested {count}, {} free",
                pool.len()
            )));
        }

        let nodes: Vec<Node> = pool
            .drain(..count)
            .map(|entry| Node {
                id: Uuid::new_v4(),
                fqdn: Some(entry.fqdn),
                internal_addr: entry.internal_addr,
                external_addr: entry.external_addr,
                group: group.to_string(),
            })
            .collect();

        info!(group, count = nodes.len(), "provisioned nodes from inventory");
        Ok(nodes)
    }

    async fn release(&self, nodes: &[Node]) -> Result<()> {
        let mut free = self.free.lock().await;
        for node in nodes {
            if let Some(fqdn) = &node.fqdn {
                free.entry(node.group.clone()).or_default().push(MachineEntry {
                    group: node.group.clone(),
                    fqdn: fqdn.clone(),
                    internal_addr: node.internal_addr,
                    external_addr: node.external_addr,
                });
            }
        }
        Ok(())
    }
}
