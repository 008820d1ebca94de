//! Host Group Resize Logic
//!
//! A host group is a named, independently resizable pool of worker nodes.
//! Growth produces a delta batch (exactly the nodes added by one resize)
//! around which the pre/post-scale hook sequence runs, provided the cluster
//! is complete.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::{OrchestratorError, Result};
use crate::hosts;
use crate::provision::NodeProvisioner;

use super::coordinator::{ClusterCoordinator, HookPhase};
use super::types::{HostGroupSpec, Node};

pub struct HostGroup {
    spec: HostGroupSpec,
    /// Insertion order = join order
    members: RwLock<Vec<Node>>,
}

impl HostGroup {
    pub fn new(spec: HostGroupSpec) -> Self {
        Self {
            spec,
            members: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &HostGroupSpec {
        &self.spec
    }

    pub async fn members(&self) -> Vec<Node> {
        self.members.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }

    pub async fn meets_minimum(&self) -> bool {
        self.len().await >= self.spec.min_size
    }

    /// Changes the desired membership by `delta` and, for growth, drives
    /// the scale hook sequence scoped to the newly added nodes. Returns the
    /// delta batch (empty for no-op and shrink).
    ///
    /// Growth past the point of a failing hook is not rolled back: the
    /// group stays grown but partially configured, and the error surfaces
    /// to the caller.
    pub async fn resize(
        &self,
        cluster: &Arc<ClusterCoordinator>,
        delta: i64,
    ) -> Result<Vec<Node>> {
        let _sequencer = cluster.sequencer().lock().await;
        self.resize_inner(cluster, delta).await
    }

    /// Resize body, assuming the caller holds the cluster sequencer lock.
    pub(crate) async fn resize_inner(
        &self,
        cluster: &Arc<ClusterCoordinator>,
        delta: i64,
    ) -> Result<Vec<Node>> {
        if delta == 0 {
            return Ok(Vec::new());
        }
        if delta < 0 {
            return self.shrink(cluster, delta.unsigned_abs() as usize).await;
        }

        let batch = self.grow(cluster.provisioner(), delta as usize).await?;
        info!(group = self.name(), added = batch.len(), "host group grown");

        // Every node must resolve every other node before cross-node hooks
        // run, so the bindings cover the full cluster, not just the delta.
        let all_nodes = cluster.all_nodes().await;
        hosts::sync_hosts(cluster.runner(), &all_nodes, cluster.address_source()).await?;

        if !cluster.is_complete().await {
            info!(
                group = self.name(),
                "cluster incomplete, skipping scale hooks for this growth"
            );
            return Ok(batch);
        }

        cluster
            .run_service_hooks(HookPhase::PreHostGroupScale, &batch)
            .await?;
        cluster.register_hosts(self.name(), &batch).await?;
        cluster
            .run_service_hooks(HookPhase::PostHostGroupScale, &batch)
            .await?;

        Ok(batch)
    }

    /// Acquires `count` nodes from the provisioner and joins them as one
    /// batch. Membership never exceeds the configured maximum.
    pub(crate) async fn grow(
        &self,
        provisioner: Arc<dyn NodeProvisioner>,
        count: usize,
    ) -> Result<Vec<Node>> {
        {
            let members = self.members.read().await;
            if members.len() + count > self.spec.max_size {
                return Err(OrchestratorError::provision(format!(
                    "growing '{}' by {count} would exceed max size {}",
                    self.spec.name, self.spec.max_size
                )));
            }
        }

        let batch = provisioner.provision(&self.spec.name, count).await?;
        self.members.write().await.extend(batch.iter().cloned());
        Ok(batch)
    }

    /// Shrink releases the most recently joined members. No hooks are
    /// defined for the shrink path.
    async fn shrink(
        &self,
        cluster: &Arc<ClusterCoordinator>,
        count: usize,
    ) -> Result<Vec<Node>> {
        let removed: Vec<Node> = {
            let mut members = self.members.write().await;
            let keep = members.len().saturating_sub(count);
            members.split_off(keep)
        };
        if !removed.is_empty() {
            warn!(
                group = self.name(),
                removed = removed.len(),
                "shrinking host group; no teardown hooks run"
            );
            cluster.provisioner().release(&removed).await?;
        }
        Ok(Vec::new())
    }

    /// Adopts nodes that already exist outside the resize flow (initial
    /// deployment, state rebuilt from the control server).
    pub(crate) async fn adopt(&self, nodes: Vec<Node>) {
        self.members.write().await.extend(nodes);
    }
}
