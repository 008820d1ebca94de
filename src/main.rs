use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use ambit_core::cluster::ClusterCoordinator;
use ambit_core::config::ClusterConfig;
use ambit_core::control::{ControlServer, RestControlServer};
use ambit_core::logging;
use ambit_core::provision::InventoryProvisioner;
use ambit_core::remote::SshCommandRunner;
use ambit_core::service::{ExtraService, Kerberos, Nslcd};

#[derive(Parser)]
#[command(name = "ambit", about = "Elastic Hadoop cluster orchestrator")]
struct Cli {
    /// Path to config.yml (defaults to the standard probe locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision the initial topology and install the cluster
    Deploy,
    /// Grow or shrink a host group by a signed delta
    Scale {
        #[arg(long)]
        group: String,
        #[arg(long, allow_hyphen_values = true)]
        delta: i64,
    },
    /// Show completeness and registered hosts
    Status,
}

fn build_cluster(config: ClusterConfig, registered: &[String]) -> Arc<ClusterCoordinator> {
    let control = Arc::new(RestControlServer::new(
        config.control.url.clone(),
        config.control.user.clone(),
        config.control.password.clone(),
        config.stack_version.clone(),
    ));
    let runner = Arc::new(SshCommandRunner::new(
        config.ssh.user.clone(),
        config.ssh.options.clone(),
    ));

    // Machines already registered with the control server belong to the
    // cluster, not to the free pool.
    let free: Vec<_> = config
        .inventory
        .iter()
        .filter(|m| !registered.contains(&m.fqdn))
        .cloned()
        .collect();
    let provisioner = Arc::new(InventoryProvisioner::new(free));

    let mut builder = ClusterCoordinator::builder(config.clone(), control, runner, provisioner);
    if let Some(settings) = config.extra_services.kerberos.clone() {
        builder = builder.extra_service(Arc::new(Kerberos::new(settings)) as Arc<dyn ExtraService>);
    }
    if config.extra_services.nslcd {
        builder = builder.extra_service(Arc::new(Nslcd) as Arc<dyn ExtraService>);
    }
    builder.build()
}

/// Hosts already registered with the control server; they belong to the
/// cluster, not to the free inventory pool.
async fn registered_hosts(config: &ClusterConfig) -> Vec<String> {
    let control = RestControlServer::new(
        config.control.url.clone(),
        config.control.user.clone(),
        config.control.password.clone(),
        config.stack_version.clone(),
    );
    control.registered_host_names().await.unwrap_or_default()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ClusterConfig::load(cli.config.as_deref())?;
    logging::init(&config.logging);

    match cli.command {
        Commands::Deploy => {
            let cluster = build_cluster(config, &[]);
            cluster.deploy().await?;
            info!("deployment finished");
        }
        Commands::Scale { group, delta } => {
            let inventory = config.inventory.clone();
            let registered = registered_hosts(&config).await;
            let cluster = build_cluster(config, &registered);
            cluster.adopt_registered(&inventory).await?;
            let batch = cluster.resize_host_group(&group, delta).await?;
            info!(group = %group, added = batch.len(), "scale finished");
        }
        Commands::Status => {
            let inventory = config.inventory.clone();
            let registered = registered_hosts(&config).await;
            let cluster = build_cluster(config, &registered);
            cluster.adopt_registered(&inventory).await?;

            println!("cluster:  {}", cluster.config().cluster_name);
            println!("complete: {}", cluster.is_complete().await);
            for group in cluster.host_groups() {
                println!(
                    "  {:<12} {}/{} (min {})",
                    group.name(),
                    group.len().await,
                    group.spec().max_size,
                    group.spec().min_size
                );
            }
            let registered = cluster.control().registered_host_names().await?;
            println!("registered hosts: {}", registered.len());
            for host in registered {
                println!("  {host}");
            }
        }
    }

    Ok(())
}
