//! Nslcd extra service: installs the LDAP name-service prerequisites on the
//! management servers before the cluster is deployed.

use async_trait::async_trait;
use tracing::info;

use crate::cluster::{parallel, ClusterCoordinator};
use crate::error::{OrchestratorError, Result};
use crate::remote::commands;
use crate::service::ExtraService;

const INSTALL_ERROR_KEY: &str = "nslcd.install";

#[derive(Default)]
pub struct Nslcd;

#[async_trait]
impl ExtraService for Nslcd {
    fn name(&self) -> &str {
        "nslcd"
    }

    async fn pre_cluster_deploy(&self, cluster: &ClusterCoordinator) -> Result<()> {
        info!("installing nslcd requirements on management servers");

        let runner = cluster.runner();
        let script = commands::install_executable("nslcd");
        parallel::run_batch(INSTALL_ERROR_KEY, cluster.server_nodes().await, move |node| {
            let runner = runner.clone();
            let script = script.clone();
            async move {
                let code = runner.execute(&node, &script).await.map_err(|err| {
                    OrchestratorError::service(
                        INSTALL_ERROR_KEY,
                        format!("error installing nslcd on {}: {err}", node.display_name()),
                    )
                })?;
                if code != 0 {
                    return Err(OrchestratorError::service(
                        INSTALL_ERROR_KEY,
                        format!(
                            "nslcd install exited with {code} on {}",
                            node.display_name()
                        ),
                    ));
                }
                Ok(code)
            }
        })
        .await
        .map(|_| ())
    }
}
