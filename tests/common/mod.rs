//! In-process mocks shared by the integration tests: a recording control
//! server, a recording command runner, a deterministic provisioner and a
//! scriptable extra service. All of them append to one shared event log so
//! tests can assert cross-collaborator ordering.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ambit_core::cluster::{ClusterCoordinator, Node};
use ambit_core::config::ClusterConfig;
use ambit_core::control::ControlServer;
use ambit_core::error::{OrchestratorError, Result};
use ambit_core::provision::NodeProvisioner;
use ambit_core::remote::CommandRunner;
use ambit_core::service::{ExtraService, ServiceConfig};

pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn position(log: &EventLog, prefix: &str) -> Option<usize> {
    log.lock().unwrap().iter().position(|e| e.starts_with(prefix))
}

/// Two required groups: servers (min 1) and agents (min 3).
pub fn test_config() -> ClusterConfig {
    serde_yaml::from_str(
        r#"
cluster_name: test-cluster
blueprint: test-blueprint
services: [HDFS, YARN]
host_groups:
  - name: servers
    components: [NAMENODE]
    min_size: 1
    max_size: 2
    initial_size: 1
  - name: agents
    components: [DATANODE]
    min_size: 3
    max_size: 10
    initial_size: 3
"#,
    )
    .expect("test config parses")
}

pub struct RecordingControlServer {
    log: EventLog,
    pub hosts: Mutex<Vec<String>>,
}

impl RecordingControlServer {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            hosts: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, event: String) {
        self.log.lock().unwrap().push(event);
    }

    pub fn registered(&self) -> Vec<String> {
        self.hosts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ControlServer for RecordingControlServer {
    async fn create_cluster(&self, cluster: &str) -> Result<()> {
        self.record(format!("control:create_cluster:{cluster}"));
        Ok(())
    }

    async fn add_host_to_cluster(&self, _cluster: &str, host_fqdn: &str) -> Result<()> {
        self.record(format!("control:add_host:{host_fqdn}"));
        self.hosts.lock().unwrap().push(host_fqdn.to_string());
        Ok(())
    }

    async fn add_service_to_cluster(&self, _cluster: &str, service: &str) -> Result<()> {
        self.record(format!("control:add_service:{service}"));
        Ok(())
    }

    async fn add_component_to_cluster(
        &self,
        _cluster: &str,
        service: &str,
        component: &str,
    ) -> Result<()> {
        self.record(format!("control:add_component:{service}:{component}"));
        Ok(())
    }

    async fn create_host_component(
        &self,
        _cluster: &str,
        host_fqdn: &str,
        component: &str,
    ) -> Result<()> {
        self.record(format!("control:host_component:{host_fqdn}:{component}"));
        Ok(())
    }

    async fn install_with_blueprint(
        &self,
        _cluster: &str,
        blueprint: &str,
        hosts: &[String],
        _services: &[String],
        service_config: &ServiceConfig,
    ) -> Result<()> {
        self.record(format!(
            "control:install:{blueprint}:{}:{}",
            hosts.len(),
            service_config.len()
        ));
        Ok(())
    }

    async fn registered_host_names(&self) -> Result<Vec<String>> {
        Ok(self.registered())
    }
}

/// Records every executed script and always exits 0.
#[derive(Default)]
pub struct RecordingRunner {
    pub scripts: Mutex<Vec<(String, String)>>,
}

impl RecordingRunner {
    pub fn executed(&self) -> Vec<(String, String)> {
        self.scripts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn execute(&self, node: &Node, script: &str) -> Result<i64> {
        self.scripts
            .lock()
            .unwrap()
            .push((node.display_name(), script.to_string()));
        Ok(0)
    }
}

/// Hands out nodes with deterministic FQDNs: `<group>-<n>.test`.
#[derive(Default)]
pub struct TestProvisioner {
    counter: AtomicUsize,
}

#[async_trait]
impl NodeProvisioner for TestProvisioner {
    async fn provision(&self, group: &str, count: usize) -> Result<Vec<Node>> {
        let nodes = (0..count)
            .map(|_| {
                let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
                Node {
                    id: uuid::Uuid::new_v4(),
                    fqdn: Some(format!("{group}-{n}.test")),
                    internal_addr: format!("10.0.0.{n}").parse().unwrap(),
                    external_addr: None,
                    group: group.to_string(),
                }
            })
            .collect();
        Ok(nodes)
    }
}

/// Extra service that records its hook invocations (with the delta batch
/// FQDNs) and can be told to fail one phase with a given error key.
pub struct RecordingService {
    name: String,
    log: EventLog,
    fail_phase: Option<(&'static str, &'static str)>,
}

impl RecordingService {
    pub fn new(name: &str, log: EventLog) -> Self {
        Self {
            name: name.to_string(),
            log,
            fail_phase: None,
        }
    }

    /// Fails the named phase (`pre-deploy`, `post-deploy`, `pre-scale`,
    /// `post-scale`) with a service error carrying `key`.
    pub fn failing(name: &str, log: EventLog, phase: &'static str, key: &'static str) -> Self {
        Self {
            name: name.to_string(),
            log,
            fail_phase: Some((phase, key)),
        }
    }

    fn hook(&self, phase: &str, delta: &[Node]) -> Result<()> {
        let fqdns: Vec<String> = delta.iter().map(|n| n.display_name()).collect();
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{phase}:{}", self.name, fqdns.join(",")));
        if let Some((fail_phase, key)) = self.fail_phase {
            if fail_phase == phase {
                return Err(OrchestratorError::service(key, "injected failure"));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ExtraService for RecordingService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn pre_cluster_deploy(&self, _cluster: &ClusterCoordinator) -> Result<()> {
        self.hook("pre-deploy", &[])
    }

    async fn post_cluster_deploy(&self, _cluster: &ClusterCoordinator) -> Result<()> {
        self.hook("post-deploy", &[])
    }

    async fn pre_host_group_scale(
        &self,
        _cluster: &ClusterCoordinator,
        delta: &[Node],
    ) -> Result<()> {
        self.hook("pre-scale", delta)
    }

    async fn post_host_group_scale(
        &self,
        _cluster: &ClusterCoordinator,
        delta: &[Node],
    ) -> Result<()> {
        self.hook("post-scale", delta)
    }
}

/// Counts hook invocations recorded by `service_name` in the log.
pub fn hook_count(log: &EventLog, service_name: &str) -> usize {
    log.lock()
        .unwrap()
        .iter()
        .filter(|e| e.starts_with(&format!("{service_name}:")))
        .count()
}
