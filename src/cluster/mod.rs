//! Cluster Orchestration
//!
//! Host-group scaling and extra-service coordination:
//! - Host groups as independently resizable node pools
//! - Delta-batch computation on growth
//! - Pre/post hook sequencing around deployment and scale-out
//! - Parallel fan-out of per-node work with single-error aggregation

mod coordinator;
mod host_group;
pub mod parallel;
mod types;

pub use coordinator::{ClusterBuilder, ClusterCoordinator, HookPhase};
pub use host_group::HostGroup;
pub use types::{AddressSource, HostGroupSpec, Node};
