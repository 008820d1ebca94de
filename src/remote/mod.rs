//! Remote Command Execution
//!
//! The orchestration core treats remote execution as a substitutable
//! collaborator: a [`CommandRunner`] runs one shell script on one node and
//! reports the exit code. The default implementation shells out to the
//! system `ssh` binary.

pub mod commands;

use async_trait::async_trait;
use tracing::debug;

use crate::cluster::Node;
use crate::error::{OrchestratorError, Result};

/// Executes a shell script on a target node.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `script` on `node`, returning the remote exit code. Transport
    /// failures (unreachable host, broken session) are errors; a nonzero
    /// exit code is not.
    async fn execute(&self, node: &Node, script: &str) -> Result<i64>;
}

/// Command runner backed by the system `ssh` binary.
pub struct SshCommandRunner {
    user: String,
    options: Vec<String>,
}

impl SshCommandRunner {
    pub fn new(user: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            user: user.into(),
            options,
        }
    }

    fn target(&self, node: &Node) -> String {
        let host = node
            .fqdn
            .clone()
            .unwrap_or_else(|| node.internal_addr.to_string());
        format!("{}@{}", self.user, host)
    }
}

#[async_trait]
impl CommandRunner for SshCommandRunner {
    async fn execute(&self, node: &Node, script: &str) -> Result<i64> {
        let target = self.target(node);
        debug!(node = %node.display_name(), "executing remote script");

        let status = tokio::process::Command::new("ssh")
            .args(&self.options)
            .arg(&target)
            .arg(script)
            .status()
            .await
            .map_err(|e| {
                OrchestratorError::transport(format!("ssh to {target} failed: {e}"))
            })?;

        // A missing exit code means the remote process died on a signal.
        Ok(i64::from(status.code().unwrap_or(-1)))
    }
}
