//! Kerberos extra service: contributes KDC settings to the cluster
//! configuration and prepares ACLs and DNS lookup flags on the machines
//! after the initial installation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cluster::{parallel, ClusterCoordinator, Node};
use crate::error::{OrchestratorError, Result};
use crate::remote::commands;
use crate::service::{ExtraService, ServiceConfig};

const ACL_ERROR_KEY: &str = "kerberos.acl";
const KRB5_ERROR_KEY: &str = "kerberos.krb5";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KerberosSettings {
    #[serde(default = "default_realm")]
    pub realm: String,
    #[serde(default = "default_admin")]
    pub admin: String,
    #[serde(default = "default_domain")]
    pub domain: String,
    /// KDB master password; generated when absent.
    #[serde(default)]
    pub kdb_password: Option<String>,
    /// KDC admin password; generated when absent.
    #[serde(default)]
    pub admin_password: Option<String>,
}

impl Default for KerberosSettings {
    fn default() -> Self {
        Self {
            realm: default_realm(),
            admin: default_admin(),
            domain: default_domain(),
            kdb_password: None,
            admin_password: None,
        }
    }
}

fn default_realm() -> String {
    "HORTONWORKS.COM".to_string()
}

fn default_admin() -> String {
    "admin/admin".to_string()
}

fn default_domain() -> String {
    "hortonworks.com".to_string()
}

pub struct Kerberos {
    settings: KerberosSettings,
    kdb_password: OnceCell<String>,
    admin_password: OnceCell<String>,
}

impl Kerberos {
    pub fn new(settings: KerberosSettings) -> Self {
        Self {
            settings,
            kdb_password: OnceCell::new(),
            admin_password: OnceCell::new(),
        }
    }

    /// Configured password if present, otherwise a password generated on
    /// first read and stable for the lifetime of this plugin instance.
    fn get_or_generate(configured: &Option<String>, cell: &OnceCell<String>) -> String {
        if let Some(password) = configured {
            return password.clone();
        }
        cell.get_or_init(generate_password).clone()
    }
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}

#[async_trait]
impl ExtraService for Kerberos {
    fn name(&self) -> &str {
        "kerberos"
    }

    fn config_fragment(&self) -> ServiceConfig {
        let mut settings = BTreeMap::new();
        settings.insert(
            "kdb.password".to_string(),
            Self::get_or_generate(&self.settings.kdb_password, &self.kdb_password),
        );
        settings.insert(
            "kdc.adminpassword".to_string(),
            Self::get_or_generate(&self.settings.admin_password, &self.admin_password),
        );
        settings.insert("KDC_REALM".to_string(), self.settings.realm.clone());
        settings.insert("kdc.admin".to_string(), self.settings.admin.clone());
        settings.insert("KDC_DOMAIN".to_string(), self.settings.domain.clone());

        let mut fragment = ServiceConfig::new();
        fragment.insert("krb5-config".to_string(), settings);
        fragment
    }

    async fn post_cluster_deploy(&self, cluster: &ClusterCoordinator) -> Result<()> {
        // The KDC admin principal must be in kadm5.acl on every server
        // before agents can authenticate.
        let acl_script = commands::sudo(&format!(
            "echo principal {} >> /var/kerberos/krb5kdc/kadm5.acl",
            self.settings.admin
        ));
        run_on(
            ACL_ERROR_KEY,
            cluster.server_nodes().await,
            cluster,
            acl_script,
            "error configuring kadm5.acl",
        )
        .await?;

        let krb5_script = commands::chain(&[
            commands::sudo(
                "sed -i 's| dns_lookup_realm = false| dns_lookup_realm = true|g' /etc/krb5.conf",
            ),
            commands::sudo(
                "sed -i 's| dns_lookup_kdc = false| dns_lookup_kdc = true|g' /etc/krb5.conf",
            ),
        ]);
        run_on(
            KRB5_ERROR_KEY,
            cluster.agent_nodes().await,
            cluster,
            krb5_script,
            "error configuring krb5.conf",
        )
        .await
    }
}

/// Fans `script` across `nodes`; any failure surfaces as a service error
/// under `error_key`.
async fn run_on(
    error_key: &'static str,
    nodes: Vec<Node>,
    cluster: &ClusterCoordinator,
    script: String,
    error_description: &'static str,
) -> Result<()> {
    let runner = cluster.runner();
    parallel::run_batch(error_key, nodes, move |node| {
        let runner = runner.clone();
        let script = script.clone();
        async move {
            let code = runner.execute(&node, &script).await.map_err(|err| {
                OrchestratorError::service(
                    error_key,
                    format!("{error_description} on {}: {err}", node.display_name()),
                )
            })?;
            if code != 0 {
                return Err(OrchestratorError::service(
                    error_key,
                    format!(
                        "{error_description} on {}: exit code {code}",
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
