//! Cluster Data Model
//!
//! Core types for cluster orchestration:
//! - Worker node identity and addressing
//! - Host group sizing specifications
//! - Address selection for hosts-file synchronization

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which node address is pushed to the shared hosts-resolution mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressSource {
    /// Addresses on the cluster-internal network.
    #[default]
    Internal,
    /// Publicly routable addresses, falling back to internal ones.
    External,
}

/// A single worker machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier
    pub id: Uuid,
    /// Fully qualified domain name. May be unresolved right after
    /// provisioning; resolution is a precondition for hook execution.
    pub fqdn: Option<String>,
    /// Address on the cluster-internal network
    pub internal_addr: IpAddr,
    /// Publicly routable address, if any
    pub external_addr: Option<IpAddr>,
    /// Name of the owning host group (back-reference, not ownership)
    pub group: String,
}

impl Node {
    pub fn address(&self, source: AddressSource) -> IpAddr {
        match source {
            AddressSource::Internal => self.internal_addr,
            AddressSource::External => self.external_addr.unwrap_or(self.internal_addr),
        }
    }

    /// FQDN when resolved, node id otherwise. For log messages.
    pub fn display_name(&self) -> String {
        self.fqdn
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Sizing and component specification for one host group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostGroupSpec {
    /// Group name, unique within the cluster
    pub name: String,
    /// Hadoop components installed on members of this group
    #[serde(default)]
    pub components: Vec<String>,
    /// Members required before the cluster counts as complete
    #[serde(default)]
    pub min_size: usize,
    /// Hard membership ceiling
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// Members provisioned at initial deployment
    #[serde(default)]
    pub initial_size: usize,
}

fn default_max_size() -> usize {
    64
}
