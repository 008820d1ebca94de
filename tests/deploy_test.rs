mod common;

use std::sync::Arc;

use ambit_core::cluster::ClusterCoordinator;
use ambit_core::service::{ExtraService, Kerberos, KerberosSettings};

use common::*;

struct Fixture {
    cluster: Arc<ClusterCoordinator>,
    control: Arc<RecordingControlServer>,
    runner: Arc<RecordingRunner>,
    log: EventLog,
}

fn fixture(log: EventLog, services: Vec<Arc<dyn ExtraService>>) -> Fixture {
    let control = Arc::new(RecordingControlServer::new(log.clone()));
    let runner = Arc::new(RecordingRunner::default());
    let provisioner = Arc::new(TestProvisioner::default());

    let mut builder = ClusterCoordinator::builder(
        test_config(),
        control.clone(),
        runner.clone(),
        provisioner,
    );
    for service in services {
        builder = builder.extra_service(service);
    }
    Fixture {
        cluster: builder.build(),
        control,
        runner,
        log,
    }
}

#[tokio::test]
async fn deploy_provisions_initial_topology_and_installs() {
    let log = new_log();
    let f = fixture(
        log.clone(),
        vec![Arc::new(RecordingService::new("recorder", log))],
    );
    f.cluster.deploy().await.unwrap();

    // servers initial 1, agents initial 3
    assert_eq!(f.cluster.host_group("servers").unwrap().len().await, 1);
    assert_eq!(f.cluster.host_group("agents").unwrap().len().await, 3);
    assert!(f.cluster.is_complete().await);

    // every node was registered with the control server
    assert_eq!(f.control.registered().len(), 4);

    // strict phase ordering: pre hooks, then the install, then post hooks
    let pre = position(&f.log, "recorder:pre-deploy").unwrap();
    let create = position(&f.log, "control:create_cluster").unwrap();
    let install = position(&f.log, "control:install:test-blueprint:4").unwrap();
    let post = position(&f.log, "recorder:post-deploy").unwrap();
    assert!(pre < create && create < install && install < post);
}

#[tokio::test]
async fn deploy_pushes_hosts_files_to_every_node() {
    let f = fixture(new_log(), vec![]);
    f.cluster.deploy().await.unwrap();

    let executed = f.runner.executed();
    // one hosts-file push per node
    let pushes: Vec<_> = executed
        .iter()
        .filter(|(_, script)| script.contains("tee /etc/hosts"))
        .collect();
    assert_eq!(pushes.len(), 4);
    // bindings cover the whole cluster
    assert!(pushes[0].1.contains("servers-1.test"));
    assert!(pushes[0].1.contains("agents-"));
}

#[tokio::test]
async fn deploy_is_rejected_twice() {
    let f = fixture(new_log(), vec![]);
    f.cluster.deploy().await.unwrap();
    let err = f.cluster.deploy().await.unwrap_err();
    assert!(err.to_string().contains("already deployed"));
}

#[tokio::test]
async fn failing_pre_deploy_hook_aborts_install() {
    let log = new_log();
    let failing: Arc<dyn ExtraService> = Arc::new(RecordingService::failing(
        "hardening",
        log.clone(),
        "pre-deploy",
        "hardening.baseline",
    ));
    let f = fixture(log, vec![failing]);

    let err = f.cluster.deploy().await.unwrap_err();
    assert_eq!(err.key(), Some("hardening.baseline"));
    assert!(position(&f.log, "control:create_cluster").is_none());
    assert!(f.control.registered().is_empty());
}

#[tokio::test]
async fn merged_kerberos_config_reaches_the_blueprint() {
    let kerberos: Arc<dyn ExtraService> = Arc::new(Kerberos::new(KerberosSettings {
        realm: "TEST.REALM".to_string(),
        ..KerberosSettings::default()
    }));
    let f = fixture(new_log(), vec![kerberos.clone()]);

    let merged = f.cluster.merged_service_config();
    assert_eq!(merged["krb5-config"]["KDC_REALM"], "TEST.REALM");

    // idempotent secret generation across repeated merges
    let again = f.cluster.merged_service_config();
    assert_eq!(
        merged["krb5-config"]["kdb.password"],
        again["krb5-config"]["kdb.password"]
    );

    // the install call carries the one merged configuration category
    f.cluster.deploy().await.unwrap();
    assert!(position(&f.log, "control:install:test-blueprint:4:1").is_some());
}

#[tokio::test]
async fn kerberos_post_deploy_configures_servers_and_agents() {
    let kerberos: Arc<dyn ExtraService> =
        Arc::new(Kerberos::new(KerberosSettings::default()));
    let f = fixture(new_log(), vec![kerberos]);
    f.cluster.deploy().await.unwrap();

    let executed = f.runner.executed();
    let acl_targets: Vec<_> = executed
        .iter()
        .filter(|(_, script)| script.contains("kadm5.acl"))
        .map(|(node, _)| node.clone())
        .collect();
    assert_eq!(acl_targets, vec!["servers-1.test".to_string()]);

    let krb5_targets: Vec<_> = executed
        .iter()
        .filter(|(_, script)| script.contains("/etc/krb5.conf"))
        .map(|(node, _)| node.clone())
        .collect();
    assert_eq!(krb5_targets.len(), 3);
    assert!(krb5_targets.iter().all(|t| t.starts_with("agents-")));
}
