//! Hosts-File Synchronization
//!
//! Every node must resolve every other node's name before any hook that
//! performs cross-node operations runs. The synchronizer renders one hosts
//! file from the full current node set and pushes it to every node.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::info;

use crate::cluster::{parallel, AddressSource, Node};
use crate::error::{OrchestratorError, Result};
use crate::remote::{commands, CommandRunner};

/// Renders name→address bindings for every node with a resolved FQDN.
pub fn render_hosts_file(nodes: &[Node], source: AddressSource) -> String {
    let mut out = String::from("127.0.0.1 localhost\n::1 localhost\n");
    for node in nodes {
        if let Some(fqdn) = &node.fqdn {
            let short = fqdn.split('.').next().unwrap_or(fqdn);
            let _ = writeln!(out, "{} {fqdn} {short}", node.address(source));
        }
    }
    out
}

/// Pushes the rendered hosts file to every node, concurrently with
/// join-all semantics.
pub async fn sync_hosts(
    runner: Arc<dyn CommandRunner>,
    nodes: &[Node],
    source: AddressSource,
) -> Result<()> {
    if nodes.is_empty() {
        return Ok(());
    }

    let script = commands::write_file("/etc/hosts", &render_hosts_file(nodes, source));
    info!(nodes = nodes.len(), "synchronizing hosts files");

    parallel::run_batch("sync-hosts", nodes.to_vec(), move |node| {
        let runner = runner.clone();
        let script = script.clone();
        async move {
            let code = runner.execute(&node, &script).await?;
            if code != 0 {
                return Err(OrchestratorError::transport(format!(
                    "hosts file update exited with {code} on {}",
                    node.display_name()
                )));
            }
            Ok(code)
        }
    })
    .await
    .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn node(fqdn: Option<&str>, addr: &str) -> Node {
        Node {
            id: Uuid::new_v4(),
            fqdn: fqdn.map(str::to_string),
            internal_addr: addr.parse().unwrap(),
            external_addr: None,
            group: "agents".to_string(),
        }
    }

    #[test]
    fn renders_binding_per_resolved_node() {
        let nodes = vec![
            node(Some("master.example.com"), "10.0.0.1"),
            node(Some("agent-1.example.com"), "10.0.0.2"),
        ];
        let rendered = render_hosts_file(&nodes, AddressSource::Internal);
        assert!(rendered.starts_with("127.0.0.1 localhost\n"));
        assert!(rendered.contains("10.0.0.1 master.example.com master\n"));
        assert!(rendered.contains("10.0.0.2 agent-1.example.com agent-1\n"));
    }

    #[test]
    fn unresolved_nodes_are_left_out() {
        let nodes = vec![node(None, "10.0.0.3")];
        let rendered = render_hosts_file(&nodes, AddressSource::Internal);
        assert!(!rendered.contains("10.0.0.3"));
    }
}
