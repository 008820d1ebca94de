//! REST client for the Ambari-style management API.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{OrchestratorError, Result};
use crate::service::ServiceConfig;

use super::ControlServer;

pub struct RestControlServer {
    client: reqwest::Client,
    base_url: String,
    user: String,
    password: String,
    stack_version: String,
}

impl RestControlServer {
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        stack_version: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user: user.into(),
            password: password.into(),
            stack_version: stack_version.into(),
        }
    }

    async fn post(&self, path: &str, body: Option<Value>) -> Result<()> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "POST");
        let mut request = self
            .client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .header("X-Requested-By", "ambit");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(OrchestratorError::transport(format!(
                "{path} returned {status}"
            )));
        }
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(OrchestratorError::transport(format!(
                "{path} returned {status}"
            )));
        }
        Ok(response.json().await?)
    }

    fn configurations(service_config: &ServiceConfig) -> Vec<Value> {
        service_config
            .iter()
            .map(|(category, settings)| json!({ category: settings }))
            .collect()
    }
}

#[async_trait]
impl ControlServer for RestControlServer {
    async fn create_cluster(&self, cluster: &str) -> Result<()> {
        self.post(
            &format!("/api/v1/clusters/{cluster}"),
            Some(json!({ "Clusters": { "version": self.stack_version } })),
        )
        .await
    }

    async fn add_host_to_cluster(&self, cluster: &str, host_fqdn: &str) -> Result<()> {
        self.post(&format!("/api/v1/clusters/{cluster}/hosts/{host_fqdn}"), None)
            .await
    }

    async fn add_service_to_cluster(&self, cluster: &str, service: &str) -> Result<()> {
        self.post(
            &format!("/api/v1/clusters/{cluster}/services/{service}"),
            None,
        )
        .await
    }

    async fn add_component_to_cluster(
        &self,
        cluster: &str,
        service: &str,
        component: &str,
    ) -> Result<()> {
        self.post(
            &format!("/api/v1/clusters/{cluster}/services/{service}/components/{component}"),
            None,
        )
        .await
    }

    async fn create_host_component(
        &self,
        cluster: &str,
        host_fqdn: &str,
        component: &str,
    ) -> Result<()> {
        self.post(
            &format!("/api/v1/clusters/{cluster}/hosts/{host_fqdn}/host_components/{component}"),
            None,
        )
        .await
    }

    async fn install_with_blueprint(
        &self,
        cluster: &str,
        blueprint: &str,
        hosts: &[String],
        services: &[String],
        service_config: &ServiceConfig,
    ) -> Result<()> {
        info!(cluster, blueprint, hosts = hosts.len(), "installing from blueprint");

        let components: Vec<Value> = services.iter().map(|s| json!({ "name": s })).collect();
        self.post(
            &format!("/api/v1/blueprints/{blueprint}"),
            Some(json!({
                "configurations": Self::configurations(service_config),
                "host_groups": [{
                    "name": "host-group-1",
                    "components": components,
                    "cardinality": hosts.len().to_string(),
                }],
                "Blueprints": {
                    "blueprint_name": blueprint,
                    "stack_name": "HDP",
                    "stack_version": self.stack_version,
                },
            })),
        )
        .await?;

        let host_entries: Vec<Value> = hosts.iter().map(|h| json!({ "fqdn": h })).collect();
        self.post(
            &format!("/api/v1/clusters/{cluster}"),
            Some(json!({
                "blueprint": blueprint,
                "default_password": "admin",
                "host_groups": [{ "name": "host-group-1", "hosts": host_entries }],
            })),
        )
        .await
    }

    async fn registered_host_names(&self) -> Result<Vec<String>> {
        let body = self.get("/api/v1/hosts").await?;
        let names = body["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item["Hosts"]["host_name"].as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(names)
    }
}
