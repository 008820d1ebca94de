//! Cluster Coordinator
//!
//! Owns cluster-wide state: the control-server handle, the ordered extra
//! service registry, the host groups, and the completeness predicate. All
//! resize and deploy sequences for one cluster serialize through a single
//! sequencer lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::ClusterConfig;
use crate::control::ControlServer;
use crate::error::{OrchestratorError, Result};
use crate::hosts;
use crate::provision::NodeProvisioner;
use crate::remote::CommandRunner;
use crate::service::{self, ExtraService, ServiceConfig};

use super::host_group::HostGroup;
use super::parallel;
use super::types::{AddressSource, Node};

/// Lifecycle phases around which extra service hooks are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    PreClusterDeploy,
    PostClusterDeploy,
    PreHostGroupScale,
    PostHostGroupScale,
}

impl HookPhase {
    pub fn label(&self) -> &'static str {
        match self {
            HookPhase::PreClusterDeploy => "pre-cluster-deploy",
            HookPhase::PostClusterDeploy => "post-cluster-deploy",
            HookPhase::PreHostGroupScale => "pre-scale",
            HookPhase::PostHostGroupScale => "post-scale",
        }
    }
}

pub struct ClusterCoordinator {
    config: ClusterConfig,
    control: Arc<dyn ControlServer>,
    runner: Arc<dyn CommandRunner>,
    provisioner: Arc<dyn NodeProvisioner>,
    /// Registration order = hook execution order; immutable after build
    services: Vec<Arc<dyn ExtraService>>,
    /// Insertion order preserved for deterministic views
    groups: Vec<Arc<HostGroup>>,
    /// Single-writer invariant: resize/deploy sequences never interleave
    sequencer: Mutex<()>,
    deployed: AtomicBool,
}

/// Assembles a coordinator; extra service registration happens here and is
/// immutable afterward.
pub struct ClusterBuilder {
    config: ClusterConfig,
    control: Arc<dyn ControlServer>,
    runner: Arc<dyn CommandRunner>,
    provisioner: Arc<dyn NodeProvisioner>,
    services: Vec<Arc<dyn ExtraService>>,
}

impl ClusterBuilder {
    pub fn extra_service(mut self, service: Arc<dyn ExtraService>) -> Self {
        info!(service = service.name(), "registering extra service");
        self.services.push(service);
        self
    }

    pub fn build(self) -> Arc<ClusterCoordinator> {
        let groups = self
            .config
            .host_groups
            .iter()
            .map(|spec| Arc::new(HostGroup::new(spec.clone())))
            .collect();

        Arc::new(ClusterCoordinator {
            config: self.config,
            control: self.control,
            runner: self.runner,
            provisioner: self.provisioner,
            services: self.services,
            groups,
            sequencer: Mutex::new(()),
            deployed: AtomicBool::new(false),
        })
    }
}

impl ClusterCoordinator {
    pub fn builder(
        config: ClusterConfig,
        control: Arc<dyn ControlServer>,
        runner: Arc<dyn CommandRunner>,
        provisioner: Arc<dyn NodeProvisioner>,
    ) -> ClusterBuilder {
        ClusterBuilder {
            config,
            control,
            runner,
            provisioner,
            services: Vec::new(),
        }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn address_source(&self) -> AddressSource {
        self.config.address_source
    }

    pub fn runner(&self) -> Arc<dyn CommandRunner> {
        self.runner.clone()
    }

    pub fn control(&self) -> Arc<dyn ControlServer> {
        self.control.clone()
    }

    pub(crate) fn provisioner(&self) -> Arc<dyn NodeProvisioner> {
        self.provisioner.clone()
    }

    pub(crate) fn sequencer(&self) -> &Mutex<()> {
        &self.sequencer
    }

    pub fn extra_services(&self) -> &[Arc<dyn ExtraService>] {
        &self.services
    }

    pub fn host_groups(&self) -> &[Arc<HostGroup>] {
        &self.groups
    }

    pub fn host_group(&self, name: &str) -> Option<Arc<HostGroup>> {
        self.groups.iter().find(|g| g.name() == name).cloned()
    }

    /// True iff every required host group currently meets its minimum
    /// member count. Pure query, no side effects.
    pub async fn is_complete(&self) -> bool {
        for group in &self.groups {
            if !group.meets_minimum().await {
                return false;
            }
        }
        true
    }

    /// Union of all host group memberships, in group then join order.
    pub async fn all_nodes(&self) -> Vec<Node> {
        let mut nodes = Vec::new();
        for group in &self.groups {
            nodes.extend(group.members().await);
        }
        nodes
    }

    /// Members of the designated server group.
    pub async fn server_nodes(&self) -> Vec<Node> {
        match self.host_group(&self.config.server_group) {
            Some(group) => group.members().await,
            None => Vec::new(),
        }
    }

    /// Members of every group except the server group.
    pub async fn agent_nodes(&self) -> Vec<Node> {
        let mut nodes = Vec::new();
        for group in &self.groups {
            if group.name() != self.config.server_group {
                nodes.extend(group.members().await);
            }
        }
        nodes
    }

    /// Every registered plugin's contribution, merged in registration
    /// order; last registered wins on key collision.
    pub fn merged_service_config(&self) -> ServiceConfig {
        service::merge_config(&self.services)
    }

    /// Dispatches one parallel batch containing every registered plugin's
    /// hook for `phase` and blocks until the fan-in barrier resolves.
    /// Plugins within the batch run concurrently; exactly one aggregated
    /// error surfaces if any of them fail.
    pub async fn run_service_hooks(
        self: &Arc<Self>,
        phase: HookPhase,
        delta: &[Node],
    ) -> Result<()> {
        if self.services.is_empty() {
            return Ok(());
        }
        info!(
            phase = phase.label(),
            plugins = self.services.len(),
            nodes = delta.len(),
            "running extra service hooks"
        );

        let cluster = Arc::clone(self);
        let delta: Arc<Vec<Node>> = Arc::new(delta.to_vec());
        parallel::run_batch(phase.label(), self.services.clone(), move |plugin| {
            let cluster = Arc::clone(&cluster);
            let delta = Arc::clone(&delta);
            async move {
                match phase {
                    HookPhase::PreClusterDeploy => plugin.pre_cluster_deploy(&cluster).await?,
                    HookPhase::PostClusterDeploy => plugin.post_cluster_deploy(&cluster).await?,
                    HookPhase::PreHostGroupScale => {
                        plugin.pre_host_group_scale(&cluster, &delta).await?
                    }
                    HookPhase::PostHostGroupScale => {
                        plugin.post_host_group_scale(&cluster, &delta).await?
                    }
                }
                Ok(0)
            }
        })
        .await
        .map(|_| ())
    }

    /// Pushes the FQDNs of newly joined nodes to the control server so they
    /// become addressable members of the named cluster group.
    pub async fn register_hosts(&self, group: &str, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            let fqdn = node.fqdn.as_deref().ok_or_else(|| {
                OrchestratorError::provision(format!(
                    "node {} in group '{group}' has no resolved FQDN",
                    node.id
                ))
            })?;
            self.control
                .add_host_to_cluster(&self.config.cluster_name, fqdn)
                .await?;
        }
        info!(group, hosts = nodes.len(), "registered hosts with control server");
        Ok(())
    }

    /// Convenience entry point for external resize requests.
    pub async fn resize_host_group(
        self: &Arc<Self>,
        name: &str,
        delta: i64,
    ) -> Result<Vec<Node>> {
        let group = self.host_group(name).ok_or_else(|| {
            OrchestratorError::config(format!("unknown host group '{name}'"))
        })?;
        group.resize(self, delta).await
    }

    /// Initial cluster bring-up: provisions every group to its initial
    /// size, then drives preClusterDeploy → blueprint install →
    /// postClusterDeploy. Scale hooks do not run during bring-up; they
    /// belong to later resize events.
    pub async fn deploy(self: &Arc<Self>) -> Result<()> {
        let _sequencer = self.sequencer.lock().await;
        if self.deployed.swap(true, Ordering::SeqCst) {
            return Err(OrchestratorError::config("cluster already deployed"));
        }

        info!(cluster = %self.config.cluster_name, "deploying cluster");
        for group in &self.groups {
            let initial = group.spec().initial_size;
            let current = group.len().await;
            if initial > current {
                group.grow(self.provisioner(), initial - current).await?;
            }
        }

        let all_nodes = self.all_nodes().await;
        hosts::sync_hosts(self.runner(), &all_nodes, self.address_source()).await?;

        self.run_service_hooks(HookPhase::PreClusterDeploy, &[])
            .await?;
        self.install(&all_nodes).await?;
        self.run_service_hooks(HookPhase::PostClusterDeploy, &[])
            .await?;

        info!(cluster = %self.config.cluster_name, nodes = all_nodes.len(), "cluster deployed");
        Ok(())
    }

    /// Creates the cluster on the control server, registers every node and
    /// installs the blueprint with the merged extra-service configuration.
    async fn install(&self, nodes: &[Node]) -> Result<()> {
        let name = &self.config.cluster_name;
        self.control.create_cluster(name).await?;

        let mut fqdns = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node.fqdn.as_deref() {
                Some(fqdn) => {
                    self.control.add_host_to_cluster(name, fqdn).await?;
                    fqdns.push(fqdn.to_string());
                }
                None => {
                    return Err(OrchestratorError::provision(format!(
                        "node {} has no resolved FQDN at install time",
                        node.id
                    )))
                }
            }
        }

        self.control
            .install_with_blueprint(
                name,
                &self.config.blueprint,
                &fqdns,
                &self.config.services,
                &self.merged_service_config(),
            )
            .await
    }

    /// Rebuilds in-memory membership from the control server's registered
    /// host list and the static inventory. Used by short-lived CLI
    /// invocations that scale an already-deployed cluster.
    pub async fn adopt_registered(&self, inventory: &[crate::config::MachineEntry]) -> Result<()> {
        let registered = self.control.registered_host_names().await?;
        if registered.is_empty() {
            return Ok(());
        }
        self.deployed.store(true, Ordering::SeqCst);

        for group in &self.groups {
            let nodes: Vec<Node> = inventory
                .iter()
                .filter(|m| m.group == group.name() && registered.contains(&m.fqdn))
                .map(|m| Node {
                    id: uuid::Uuid::new_v4(),
                    fqdn: Some(m.fqdn.clone()),
                    internal_addr: m.internal_addr,
                    external_addr: m.external_addr,
                    group: m.group.clone(),
                })
                .collect();
            if !nodes.is_empty() {
                group.adopt(nodes).await;
            }
        }

        let adopted = self.all_nodes().await.len();
        if adopted < registered.len() {
            warn!(
                registered = registered.len(),
                adopted,
                "some registered hosts are missing from the inventory"
            );
        }
        Ok(())
    }
}
