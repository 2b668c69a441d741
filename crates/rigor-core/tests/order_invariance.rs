//! Same inputs must give the same evidence and score regardless of the
//! execution strategy and of the order in which adapters finish.

mod common;

use common::{approx, document, recording, EXPECTED_SCORE};
use rigor_core::model::{LocationStrategy, PageStrategy};
use rigor_core::{
    Orchestrator, PipelineConfig, PipelineContext, PipelineReport, ReportStatus, Strategy,
};

async fn run(strategy: Strategy, delays: [u64; 5]) -> PipelineReport {
    let registry = recording(delays).registry().unwrap();
    let orch = Orchestrator::new(PipelineContext::new(PipelineConfig::default(), registry));
    orch.run(strategy, document(), None).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_and_sequential_agree() {
    let c = run(Strategy::Concurrent, [0; 5]).await;
    let s = run(Strategy::Sequential, [0; 5]).await;

    assert_eq!(c.status, ReportStatus::Complete);
    assert_eq!(s.status, ReportStatus::Complete);
    assert_eq!(c.evidence, s.evidence);
    assert_eq!(c.score, s.score);
    assert_eq!(c.content_hash, s.content_hash);
    assert!(approx(c.score.unwrap().value, EXPECTED_SCORE));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn completion_order_does_not_leak() {
    let baseline = run(Strategy::Concurrent, [0; 5]).await;
    for delays in [[40, 0, 20, 0, 0], [0, 40, 0, 10, 0], [20, 10, 40, 0, 5]] {
        let r = run(Strategy::Concurrent, delays).await;
        assert_eq!(r.evidence, baseline.evidence, "delays {:?}", delays);
        assert_eq!(r.score, baseline.score, "delays {:?}", delays);
        let kinds: Vec<_> = r.outcomes.keys().copied().collect();
        let base_kinds: Vec<_> = baseline.outcomes.keys().copied().collect();
        assert_eq!(kinds, base_kinds);
    }
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let a = run(Strategy::Sequential, [0; 5]).await;
    let b = run(Strategy::Sequential, [0; 5]).await;
    assert_eq!(a.evidence, b.evidence);
    assert_eq!(a.score, b.score);
    let ids: Vec<_> = a.evidence.iter().map(|e| e.id.clone()).collect();
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());
}

#[tokio::test]
async fn evidence_is_located_on_the_right_pages() {
    let r = run(Strategy::Sequential, [0; 5]).await;
    let by_snippet = |s: &str| {
        r.evidence
            .iter()
            .find(|e| e.text_snippet == s)
            .unwrap_or_else(|| panic!("missing evidence for {s}"))
    };

    let blinding = by_snippet("Blinding was not reported");
    assert_eq!(blinding.page_number, 2);
    assert_eq!(blinding.page_strategy, PageStrategy::Overlap);
    assert_eq!(blinding.location_strategy, LocationStrategy::Exact);
    assert_eq!(blinding.bounding_box, document().pages[1].blocks[1].bbox);

    let code = by_snippet("Code and data are not publicly available");
    assert_eq!(code.page_number, 3);

    let gap = by_snippet("comparison cohort missing entirely");
    assert_eq!(gap.page_number, 1);
    assert_eq!(gap.page_strategy, PageStrategy::Fallback);
    assert_eq!(gap.location_strategy, LocationStrategy::Estimate);
    assert!(gap.bounding_box.is_normalized());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn auto_mode_picks_concurrent_on_multi_thread_runtime() {
    let registry = recording([0; 5]).registry().unwrap();
    let orch = Orchestrator::new(PipelineContext::new(PipelineConfig::default(), registry));
    let r = orch.analyze(document(), None).await;
    assert_eq!(r.strategy, Strategy::Concurrent);
}

#[tokio::test]
async fn auto_mode_picks_sequential_on_current_thread_runtime() {
    let registry = recording([0; 5]).registry().unwrap();
    let orch = Orchestrator::new(PipelineContext::new(PipelineConfig::default(), registry));
    let r = orch.analyze(document(), None).await;
    assert_eq!(r.strategy, Strategy::Sequential);
    assert!(approx(r.score.unwrap().value, EXPECTED_SCORE));
}

#[test]
fn blocking_entry_matches_async_result() {
    let registry = recording([5, 0, 0, 0, 0]).registry().unwrap();
    let orch = Orchestrator::new(PipelineContext::new(PipelineConfig::default(), registry));
    let r = orch.analyze_blocking(document(), None).unwrap();
    assert_eq!(r.strategy, Strategy::Concurrent);
    assert!(approx(r.score.unwrap().value, EXPECTED_SCORE));
}
