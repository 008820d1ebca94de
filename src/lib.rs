pub mod cluster;
pub mod config;
pub mod control;
pub mod error;
pub mod hosts;
pub mod logging;
pub mod provision;
pub mod remote;
pub mod service;

// Re-export common types
pub use cluster::{ClusterCoordinator, HostGroup, Node};
pub use config::ClusterConfig;
pub use error::{OrchestratorError, Result};
pub use service::ExtraService;
