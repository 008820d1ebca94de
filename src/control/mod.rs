//! Control Server Interface
//!
//! Operations the orchestration core consumes from the Ambari-style
//! management server. Every call is a fallible remote call; failures
//! surface as transport errors.

mod rest;

use async_trait::async_trait;

use crate::error::Result;
use crate::service::ServiceConfig;

pub use rest::RestControlServer;

#[async_trait]
pub trait ControlServer: Send + Sync {
    async fn create_cluster(&self, cluster: &str) -> Result<()>;

    async fn add_host_to_cluster(&self, cluster: &str, host_fqdn: &str) -> Result<()>;

    async fn add_service_to_cluster(&self, cluster: &str, service: &str) -> Result<()>;

    async fn add_component_to_cluster(
        &self,
        cluster: &str,
        service: &str,
        component: &str,
    ) -> Result<()>;

    async fn create_host_component(
        &self,
        cluster: &str,
        host_fqdn: &str,
        component: &str,
    ) -> Result<()>;

    /// Creates a blueprint covering `hosts` and `services` and installs the
    /// cluster from it, pushing the merged extra-service configuration.
    async fn install_with_blueprint(
        &self,
        cluster: &str,
        blueprint: &str,
        hosts: &[String],
        services: &[String],
        service_config: &ServiceConfig,
    ) -> Result<()>;

    /// FQDNs of all agents currently registered with the server.
    async fn registered_host_names(&self) -> Result<Vec<String>>;
}
