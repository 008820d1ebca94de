//! Extra Service Plugins
//!
//! Extra services weave cross-cutting setup (security hardening, directory
//! integration, Kerberos) into the cluster lifecycle without the
//! orchestration core knowing concrete plugin identities. A plugin
//! implements the hooks it needs; the rest default to no-ops. Hooks are
//! dispatched in registration order within one parallel batch per phase.

pub mod kerberos;
pub mod nslcd;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cluster::{ClusterCoordinator, Node};
use crate::error::Result;

pub use kerberos::{Kerberos, KerberosSettings};
pub use nslcd::Nslcd;

/// Configuration fragment pushed to the control server: category name →
/// flat key/value settings.
pub type ServiceConfig = BTreeMap<String, BTreeMap<String, String>>;

#[async_trait]
pub trait ExtraService: Send + Sync {
    /// Stable plugin name, used in logs.
    fn name(&self) -> &str;

    /// Configuration contribution merged into the cluster-wide payload.
    /// Must be deterministic given current settings; generated secrets are
    /// cached so repeated reads are idempotent.
    fn config_fragment(&self) -> ServiceConfig {
        ServiceConfig::new()
    }

    /// Invoked exactly once, before the initial installation.
    async fn pre_cluster_deploy(&self, _cluster: &ClusterCoordinator) -> Result<()> {
        Ok(())
    }

    /// Invoked exactly once, after the initial installation.
    async fn post_cluster_deploy(&self, _cluster: &ClusterCoordinator) -> Result<()> {
        Ok(())
    }

    /// Invoked once per resize-with-growth event, scoped to the nodes newly
    /// added by that resize. Never invoked for shrink or no-op resizes.
    async fn pre_host_group_scale(
        &self,
        _cluster: &ClusterCoordinator,
        _delta: &[Node],
    ) -> Result<()> {
        Ok(())
    }

    /// Counterpart of [`Self::pre_host_group_scale`], after the new hosts
    /// are registered with the control server.
    async fn post_host_group_scale(
        &self,
        _cluster: &ClusterCoordinator,
        _delta: &[Node],
    ) -> Result<()> {
        Ok(())
    }
}

/// Concatenates every plugin's fragment in registration order. Duplicate
/// categories merge key-wise; the last registered plugin wins on key
/// collision.
pub fn merge_config(services: &[Arc<dyn ExtraService>]) -> ServiceConfig {
    let mut merged = ServiceConfig::new();
    for service in services {
        for (category, settings) in service.config_fragment() {
            merged.entry(category).or_default().extend(settings);
        }
    }
    merged
}
