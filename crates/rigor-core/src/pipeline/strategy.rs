//! Phase executors. Both produce the same outcomes for the same adapters;
//! they differ only in whether adapters of a phase overlap in time.

use super::execute::{run_adapter, TaskContext};
use super::registry::ToolAdapter;
use crate::config::PipelineConfig;
use crate::model::{ToolOutcome, ToolStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Concurrent,
    Sequential,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Concurrent => "concurrent",
            Strategy::Sequential => "sequential",
        }
    }

    pub(crate) fn executor(&self) -> &'static dyn PhaseExecutor {
        match self {
            Strategy::Concurrent => &ConcurrentExecutor,
            Strategy::Sequential => &SequentialExecutor,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs every adapter of one phase and returns once all of them finished.
/// Outcomes are returned in [`crate::model::ToolKind`] order.
#[async_trait]
pub(crate) trait PhaseExecutor: Send + Sync {
    async fn run_phase(
        &self,
        adapters: Vec<Arc<dyn ToolAdapter>>,
        ctx: &TaskContext,
        config: &PipelineConfig,
    ) -> Vec<ToolOutcome>;
}

pub(crate) struct ConcurrentExecutor;

#[async_trait]
impl PhaseExecutor for ConcurrentExecutor {
    async fn run_phase(
        &self,
        adapters: Vec<Arc<dyn ToolAdapter>>,
        ctx: &TaskContext,
        config: &PipelineConfig,
    ) -> Vec<ToolOutcome> {
        let mut join_set = JoinSet::new();
        for adapter in &adapters {
            let limit = config.timeout_for(adapter.kind());
            join_set.spawn(run_adapter(adapter.clone(), ctx.clone(), limit));
        }

        let mut outcomes = Vec::with_capacity(adapters.len());
        let mut join_errors = Vec::new();
        while let Some(res) = join_set.join_next().await {
            match res {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => join_errors.push(e.to_string()),
            }
        }

        // A task that never reported back still gets an outcome row.
        if !join_errors.is_empty() {
            let seen: BTreeSet<_> = outcomes.iter().map(|o| o.kind).collect();
            for adapter in adapters.iter().filter(|a| !seen.contains(&a.kind())) {
                let reason = join_errors.pop().unwrap_or_else(|| "task lost".to_string());
                outcomes.push(ToolOutcome::failed(
                    adapter.kind(),
                    adapter.name(),
                    ToolStatus::Failed,
                    format!("join error: {}", reason),
                ));
            }
        }

        // Completion order must not leak into the result.
        outcomes.sort_by_key(|o| o.kind);
        outcomes
    }
}

pub(crate) struct SequentialExecutor;

#[async_trait]
impl PhaseExecutor for SequentialExecutor {
    async fn run_phase(
        &self,
        adapters: Vec<Arc<dyn ToolAdapter>>,
        ctx: &TaskContext,
        config: &PipelineConfig,
    ) -> Vec<ToolOutcome> {
        let mut adapters = adapters;
        adapters.sort_by_key(|a| a.kind());
        let mut outcomes = Vec::with_capacity(adapters.len());
        for adapter in adapters {
            let limit = config.timeout_for(adapter.kind());
            outcomes.push(run_adapter(adapter, ctx.clone(), limit).await);
        }
        outcomes
    }
}
