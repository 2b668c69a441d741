use crate::cli::args::ScoreArgs;
use crate::exit_codes;
use anyhow::Context;
use rigor_core::adapters::Recording;
use rigor_core::report::{format_summary, report_json, write_json};
use rigor_core::{
    load_config, DocumentInput, Orchestrator, PipelineConfig, PipelineContext, SqliteScoreCache,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

fn read_document(path: &Path) -> anyhow::Result<DocumentInput> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read document {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid document {}", path.display()))
}

pub(crate) fn open_cache(path: &Path) -> anyhow::Result<SqliteScoreCache> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    SqliteScoreCache::open(path)
        .with_context(|| format!("failed to open score cache {}", path.display()))
}

pub(crate) fn pipeline_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => Ok(PipelineConfig::default()),
    }
}

pub async fn run(args: ScoreArgs) -> anyhow::Result<i32> {
    let mut cfg = pipeline_config(args.config.as_deref())?;
    if let Some(mode) = args.execution {
        cfg.execution = mode.into();
    }

    let document = read_document(&args.document)?;
    let registry = Recording::load(&args.recording)?.registry()?;
    info!(adapters = registry.len(), "loaded recording");

    let mut ctx = PipelineContext::new(cfg, registry);
    match (&args.cache_db, args.no_cache) {
        (Some(db), false) => match open_cache(db) {
            Ok(cache) => ctx = ctx.with_cache(Arc::new(cache)),
            Err(e) => warn!(
                error = %format!("{e:#}"),
                "score cache unavailable; continuing uncached"
            ),
        },
        (Some(_), true) => info!("cache disabled by --no-cache"),
        (None, _) => {}
    }

    let report = Orchestrator::new(ctx).analyze(document, None).await;

    if let Some(out) = &args.out {
        write_json(&report, out)?;
        info!(path = %out.display(), "wrote report");
    }
    if args.json {
        println!("{}", report_json(&report)?);
    } else {
        print!("{}", format_summary(&report));
    }

    Ok(exit_codes::for_status(&report.status))
}
