use super::registry::{AdapterInput, ToolAdapter, ToolOutput};
use crate::errors::AdapterError;
use crate::evidence::EvidenceStore;
use crate::model::{ToolOutcome, ToolStatus};
use crate::resolver::CoordinateResolver;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Everything an adapter task needs; cloned into each spawned task.
#[derive(Clone)]
pub(crate) struct TaskContext {
    pub(crate) input: AdapterInput,
    pub(crate) resolver: Arc<CoordinateResolver>,
    pub(crate) store: EvidenceStore,
}

/// Runs one adapter under its timeout and turns every failure mode into a
/// [`ToolOutcome`]. Findings of a successful run are resolved and appended to
/// the store before returning; a failed run contributes nothing.
pub(crate) async fn run_adapter(
    adapter: Arc<dyn ToolAdapter>,
    ctx: TaskContext,
    limit: Duration,
) -> ToolOutcome {
    let kind = adapter.kind();
    let name = adapter.name().to_string();
    let started = Instant::now();

    let fut = AssertUnwindSafe(adapter.execute(&ctx.input)).catch_unwind();
    let result: Result<ToolOutput, (ToolStatus, AdapterError)> =
        match tokio::time::timeout(limit, fut).await {
            Err(_) => Err((
                ToolStatus::TimedOut,
                AdapterError::Timeout {
                    tool: name.clone(),
                    elapsed: limit,
                },
            )),
            Ok(Err(panic)) => Err((
                ToolStatus::Failed,
                AdapterError::from_panic(&name, panic.as_ref()),
            )),
            Ok(Ok(Err(e))) => Err((ToolStatus::Failed, AdapterError::from_anyhow(&name, &e))),
            Ok(Ok(Ok(output))) => Ok(output),
        };
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok(output) => {
            let mut session = ctx.resolver.session(kind, &name);
            let mut added = 0usize;
            for finding in &output.findings {
                if ctx.store.add(session.resolve(finding)) {
                    added += 1;
                }
            }
            debug!(tool = %name, findings = output.findings.len(), added, duration_ms, "adapter finished");
            ToolOutcome {
                tool_name: name,
                kind,
                status: ToolStatus::Ok,
                payload: output.payload,
                findings: output.findings,
                error: None,
                duration_ms,
            }
        }
        Err((status, err)) => {
            warn!(tool = %name, status = status.as_str(), error = %err, "adapter contributed no evidence");
            let mut outcome = ToolOutcome::failed(kind, name, status, err.to_string());
            outcome.duration_ms = duration_ms;
            outcome
        }
    }
}
