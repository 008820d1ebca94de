use std::net::IpAddr;
use std::path::PathBuf;
use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::cluster::{AddressSource, HostGroupSpec};
use crate::error::{OrchestratorError, Result};
use crate::service::KerberosSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(default = "default_cluster_name")]
    pub cluster_name: String,
    #[serde(default = "default_blueprint")]
    pub blueprint: String,
    #[serde(default = "default_stack_version")]
    pub stack_version: String,
    /// Hadoop services installed through the blueprint
    #[serde(default)]
    pub services: Vec<String>,
    /// Name of the host group running management servers
    #[serde(default = "default_server_group")]
    pub server_group: String,
    pub host_groups: Vec<HostGroupSpec>,
    #[serde(default)]
    pub address_source: AddressSource,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub ssh: SshConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub extra_services: ExtraServicesConfig,
    /// Machines the inventory provisioner may hand out
    #[serde(default)]
    pub inventory: Vec<MachineEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    #[serde(default = "default_control_url")]
    pub url: String,
    #[serde(default = "default_control_user")]
    pub user: String,
    #[serde(default = "default_control_password")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    #[serde(default = "default_ssh_user")]
    pub user: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for the rolling JSON log file; console-only when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtraServicesConfig {
    #[serde(default)]
    pub kerberos: Option<KerberosSettings>,
    #[serde(default)]
    pub nslcd: bool,
}

/// One machine available to the inventory provisioner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineEntry {
    pub group: String,
    pub fqdn: String,
    pub internal_addr: IpAddr,
    #[serde(default)]
    pub external_addr: Option<IpAddr>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            url: default_control_url(),
            user: default_control_user(),
            password: default_control_password(),
        }
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            user: default_ssh_user(),
            options: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

fn default_cluster_name() -> String {
    "ambit".to_string()
}

fn default_blueprint() -> String {
    "ambit-blueprint".to_string()
}

fn default_stack_version() -> String {
    "2.2".to_string()
}

fn default_server_group() -> String {
    "servers".to_string()
}

fn default_control_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_control_user() -> String {
    "admin".to_string()
}

fn default_control_password() -> String {
    "admin".to_string()
}

fn default_ssh_user() -> String {
    "root".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ClusterConfig {
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        // Try loading from different locations in order
        let config_paths = [
            PathBuf::from("config.yml"),
            dirs::config_dir()
                .map(|p| p.join("ambit/config.yml"))
                .unwrap_or_default(),
            PathBuf::from("/etc/ambit/config.yml"),
        ];

        for path in &config_paths {
            if path.exists() {
                return Self::load_from_file(path);
            }
        }

        Err(OrchestratorError::config(
            "no config.yml found in ., user config dir, or /etc/ambit",
        ))
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            OrchestratorError::config(format!("failed to read {}: {e}", path.display()))
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            OrchestratorError::config(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.host_groups.is_empty() {
            return Err(OrchestratorError::config("at least one host group required"));
        }
        if !self.host_groups.iter().any(|g| g.name == self.server_group) {
            return Err(OrchestratorError::config(format!(
                "server group '{}' is not defined in host_groups",
                self.server_group
            )));
        }
        for group in &self.host_groups {
            if group.min_size > group.max_size || group.initial_size > group.max_size {
                return Err(OrchestratorError::config(format!(
                    "host group '{}' sizing exceeds max_size {}",
                    group.name, group.max_size
                )));
            }
        }
        Ok(())
    }
}
