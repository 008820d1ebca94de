//! Parallel Task Batches
//!
//! Fan-out/fan-in execution of one operation across a set of targets:
//! - One concurrent unit of work per target, no ordering between targets
//! - Join-all semantics: every unit finishes before the batch resolves
//! - N outcomes reduced to a single result for the caller

use std::future::Future;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::{OrchestratorError, Result};

/// Runs `op` against every item concurrently and waits for all of them.
///
/// An empty target set succeeds immediately with no work. On success the
/// per-item result codes are returned in dispatch order; this layer does not
/// interpret them. If any unit failed, exactly one error surfaces: the first
/// service error among the failures, or a synthesized service error wrapping
/// the first raw failure under the task label.
pub async fn run_batch<T, F, Fut>(label: &str, items: Vec<T>, op: F) -> Result<Vec<i64>>
where
    T: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<i64>> + Send + 'static,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    debug!(task = label, units = items.len(), "dispatching parallel batch");
    let handles: Vec<_> = items.into_iter().map(|item| tokio::spawn(op(item))).collect();

    let mut codes = Vec::with_capacity(handles.len());
    let mut failures = Vec::new();
    for outcome in join_all(handles).await {
        match outcome {
            Ok(Ok(code)) => codes.push(code),
            Ok(Err(err)) => failures.push(err),
            Err(err) => failures.push(OrchestratorError::transport(format!(
                "unit of '{label}' aborted: {err}"
            ))),
        }
    }

    match reduce_failures(label, &failures) {
        None => Ok(codes),
        Some(err) => {
            warn!(task = label, failed = failures.len(), error = %err, "parallel batch failed");
            Err(err)
        }
    }
}

/// First service error wins; otherwise the first raw failure is wrapped
/// into a service error carrying the task label.
fn reduce_failures(label: &str, failures: &[OrchestratorError]) -> Option<OrchestratorError> {
    let first = failures.first()?;
    if let Some(service) = failures
        .iter()
        .find(|e| matches!(e, OrchestratorError::Service { .. }))
    {
        return Some(service.clone());
    }
    Some(OrchestratorError::service(label, first.to_string()))
}
