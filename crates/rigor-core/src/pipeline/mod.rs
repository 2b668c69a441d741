//! Phase-ordered orchestration of tool adapters.
//!
//! A request fingerprints the document, consults the score cache, then runs
//! the registered adapters phase by phase. Every adapter of a phase sees the
//! joined outcomes of all earlier phases. Adapter failures and timeouts are
//! recorded per tool and never abort the run; the report is `Degraded`
//! instead of `Complete`.

mod execute;
mod registry;
mod strategy;

pub use crate::model::{Phase, ToolKind};
pub use registry::{AdapterInput, AdapterRegistry, DuplicateAdapter, ToolAdapter, ToolOutput};
pub use strategy::Strategy;

use crate::cache::ScoreCache;
use crate::config::{ExecutionMode, PipelineConfig};
use crate::errors::PipelineFatal;
use crate::evidence::EvidenceStore;
use crate::fingerprint::content_hash;
use crate::model::{DocumentInput, EvidenceItem, FinalScore, ToolOutcome};
use crate::resolver::{CoordinateResolver, ResolverSettings};
use crate::scoring::{BaseScores, WeightedScorer};
use execute::TaskContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{info, warn};

/// Read-mostly state shared by every request: built once, passed in
/// explicitly.
#[derive(Clone)]
pub struct PipelineContext {
    pub config: PipelineConfig,
    pub registry: AdapterRegistry,
    pub cache: Option<Arc<dyn ScoreCache>>,
}

impl PipelineContext {
    pub fn new(config: PipelineConfig, registry: AdapterRegistry) -> Self {
        Self {
            config,
            registry,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ScoreCache>) -> Self {
        self.cache = Some(cache);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportStatus {
    /// Every adapter succeeded.
    Complete,
    /// Scored, but at least one adapter failed or timed out.
    Degraded,
    /// Served from the score cache; no adapter ran.
    Cached,
    /// Unusable input; no adapter ran and there is no score.
    Partial { reason: PipelineFatal },
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Complete => "complete",
            ReportStatus::Degraded => "degraded",
            ReportStatus::Cached => "cached",
            ReportStatus::Partial { .. } => "partial",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub status: ReportStatus,
    pub content_hash: String,
    pub cache_version: u32,
    pub strategy: Strategy,
    pub outcomes: BTreeMap<ToolKind, ToolOutcome>,
    pub evidence: Vec<EvidenceItem>,
    pub score: Option<FinalScore>,
}

impl PipelineReport {
    pub fn failed_tools(&self) -> Vec<ToolKind> {
        self.outcomes
            .values()
            .filter(|o| !o.status.is_ok())
            .map(|o| o.kind)
            .collect()
    }
}

pub struct Orchestrator {
    ctx: PipelineContext,
}

impl Orchestrator {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    fn forced_strategy(&self) -> Option<Strategy> {
        match self.ctx.config.execution {
            ExecutionMode::Auto => None,
            ExecutionMode::Concurrent => Some(Strategy::Concurrent),
            ExecutionMode::Sequential => Some(Strategy::Sequential),
        }
    }

    /// Async entry point. On a tokio runtime, adapters fan out onto it unless
    /// it is a current-thread runtime, where they run one after another.
    /// Polled from any other executor, the request runs on a dedicated thread
    /// with its own multi-thread runtime, since adapter timeouts need tokio.
    pub async fn analyze(
        &self,
        document: DocumentInput,
        base: Option<BaseScores>,
    ) -> PipelineReport {
        let flavor = match Handle::try_current() {
            Ok(handle) => handle.runtime_flavor(),
            Err(_) => return self.run_detached(document, base).await,
        };
        let strategy = self.forced_strategy().unwrap_or(match flavor {
            RuntimeFlavor::CurrentThread => Strategy::Sequential,
            _ => Strategy::Concurrent,
        });
        self.run(strategy, document, base).await
    }

    async fn run_detached(
        &self,
        document: DocumentInput,
        base: Option<BaseScores>,
    ) -> PipelineReport {
        let strategy = self.forced_strategy().unwrap_or(Strategy::Concurrent);
        let hash = content_hash(
            &document.full_text(),
            &self.ctx.registry.signature(),
            base.as_ref(),
        )
        .hex;
        let orchestrator = Orchestrator::new(self.ctx.clone());
        let (tx, rx) = futures::channel::oneshot::channel();

        let spawned = std::thread::Builder::new()
            .name("rigor-pipeline".into())
            .spawn(move || {
                match tokio::runtime::Builder::new_multi_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => {
                        let _ = tx.send(rt.block_on(orchestrator.run(strategy, document, base)));
                    }
                    Err(e) => warn!(error = %e, "failed to build pipeline runtime"),
                }
            });
        if let Err(e) = spawned {
            warn!(error = %e, "failed to spawn pipeline thread");
        }

        match rx.await {
            Ok(report) => report,
            Err(_) => self.halted(hash, strategy, PipelineFatal::RuntimeUnavailable),
        }
    }

    fn halted(
        &self,
        content_hash: String,
        strategy: Strategy,
        reason: PipelineFatal,
    ) -> PipelineReport {
        PipelineReport {
            status: ReportStatus::Partial { reason },
            content_hash,
            cache_version: self.ctx.config.cache_version,
            strategy,
            outcomes: BTreeMap::new(),
            evidence: Vec::new(),
            score: None,
        }
    }

    /// Entry point for synchronous callers. Without an active runtime a
    /// multi-thread runtime is built and adapters run concurrently. Inside an
    /// active runtime, blocking on it would panic, so the request runs
    /// sequentially on a helper thread with its own current-thread runtime.
    pub fn analyze_blocking(
        &self,
        document: DocumentInput,
        base: Option<BaseScores>,
    ) -> anyhow::Result<PipelineReport> {
        if Handle::try_current().is_err() {
            let strategy = self.forced_strategy().unwrap_or(Strategy::Concurrent);
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            return Ok(rt.block_on(self.run(strategy, document, base)));
        }

        let strategy = self.forced_strategy().unwrap_or(Strategy::Sequential);
        std::thread::scope(|s| {
            s.spawn(move || -> anyhow::Result<PipelineReport> {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()?;
                Ok(rt.block_on(self.run(strategy, document, base)))
            })
            .join()
            .map_err(|_| anyhow::anyhow!("pipeline helper thread panicked"))?
        })
    }

    /// Runs one request with an already chosen strategy.
    pub async fn run(
        &self,
        strategy: Strategy,
        document: DocumentInput,
        base: Option<BaseScores>,
    ) -> PipelineReport {
        let cfg = &self.ctx.config;
        let text = document.full_text();
        let fingerprint = content_hash(&text, &self.ctx.registry.signature(), base.as_ref());
        let hash = fingerprint.hex;
        let version = cfg.cache_version;

        if text.trim().is_empty() {
            warn!(content_hash = %hash, "document has no extractable text");
            return self.halted(hash, strategy, PipelineFatal::EmptyDocument);
        }

        if let Some(cache) = &self.ctx.cache {
            match cache.get(&hash, version) {
                Ok(Some(score)) => {
                    info!(content_hash = %hash, cache_version = version, "score cache hit");
                    return PipelineReport {
                        status: ReportStatus::Cached,
                        content_hash: hash,
                        cache_version: version,
                        strategy,
                        outcomes: BTreeMap::new(),
                        evidence: Vec::new(),
                        score: Some(score),
                    };
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "score cache read failed; continuing uncached"),
            }
        }

        let document = Arc::new(document);
        let resolver = Arc::new(CoordinateResolver::new(
            &document,
            ResolverSettings::from(cfg),
        ));
        let store = EvidenceStore::new();
        let executor = strategy.executor();
        let mut outcomes: BTreeMap<ToolKind, ToolOutcome> = BTreeMap::new();

        info!(
            content_hash = %hash,
            strategy = strategy.as_str(),
            adapters = self.ctx.registry.len(),
            "pipeline started"
        );

        for phase in Phase::ALL {
            let adapters = self.ctx.registry.phase(phase);
            if adapters.is_empty() {
                continue;
            }
            let task_ctx = TaskContext {
                input: AdapterInput {
                    document: document.clone(),
                    prior: Arc::new(outcomes.clone()),
                },
                resolver: resolver.clone(),
                store: store.clone(),
            };
            let results = executor.run_phase(adapters, &task_ctx, cfg).await;
            let failed = results.iter().filter(|o| !o.status.is_ok()).count();
            info!(
                phase = phase.number(),
                tools = results.len(),
                failed,
                evidence = store.len(),
                "phase finished"
            );
            for outcome in results {
                outcomes.insert(outcome.kind, outcome);
            }
        }

        let base = base.unwrap_or_else(|| base_from_outcomes(&outcomes));
        let score = WeightedScorer::new(hash.clone(), version).score(&store, Some(&base));
        let degraded = outcomes.values().any(|o| !o.status.is_ok());
        let status = if degraded {
            ReportStatus::Degraded
        } else {
            ReportStatus::Complete
        };

        // Only clean runs are cached: a failed adapter is a transient fault,
        // not a property of the document.
        if !degraded {
            if let Some(cache) = &self.ctx.cache {
                if let Err(e) = cache.put(&hash, version, &score) {
                    warn!(error = %e, "score cache write failed");
                }
            }
        }

        info!(
            content_hash = %hash,
            status = status.as_str(),
            score = score.value,
            evidence = score.evidence_count,
            "pipeline finished"
        );

        PipelineReport {
            status,
            content_hash: hash,
            cache_version: version,
            strategy,
            outcomes,
            evidence: store.all(),
            score: Some(score),
        }
    }
}

/// The methodology tool may report its own starting score as `base_score`
/// (or `score`) in its payload.
fn base_from_outcomes(outcomes: &BTreeMap<ToolKind, ToolOutcome>) -> BaseScores {
    let methodology = outcomes
        .get(&ToolKind::Methodology)
        .filter(|o| o.status.is_ok())
        .and_then(|o| {
            o.payload
                .pointer("/base_score")
                .or_else(|| o.payload.pointer("/score"))
        })
        .and_then(serde_json::Value::as_f64);
    BaseScores {
        methodology,
        ..BaseScores::default()
    }
}
