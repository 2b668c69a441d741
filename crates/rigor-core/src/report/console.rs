use crate::pipeline::{PipelineReport, ReportStatus};
use std::fmt::Write;

/// Human-readable summary: status, final score, component breakdown and
/// per-tool status.
pub fn format_summary(report: &PipelineReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "status={} strategy={} content_hash={}",
        report.status.as_str(),
        report.strategy,
        short_hash(&report.content_hash)
    );

    if let ReportStatus::Partial { reason } = &report.status {
        let _ = writeln!(out, "no score: {}", reason);
    }

    if let Some(score) = &report.score {
        let _ = writeln!(
            out,
            "score={:.1} evidence={} cache_version={}",
            score.value, score.evidence_count, score.cache_version
        );
        for (c, w) in score.components.iter().zip(&score.weighted_contributions) {
            let _ = writeln!(
                out,
                "  {:<16} {:>5.1} x {:.1} = {:>5.1}  (base {:.1}, adj {:+.1}, n={})",
                c.name, c.value, w.weight, w.contribution, c.base_value, c.adjustment, c.evidence_count
            );
        }
    }

    for outcome in report.outcomes.values() {
        match &outcome.error {
            Some(err) => {
                let _ = writeln!(
                    out,
                    "  [{}] {} ({}ms): {}",
                    outcome.status.as_str(),
                    outcome.kind,
                    outcome.duration_ms,
                    err
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    "  [{}] {} ({}ms) findings={}",
                    outcome.status.as_str(),
                    outcome.kind,
                    outcome.duration_ms,
                    outcome.findings.len()
                );
            }
        }
    }
    out
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ToolKind, ToolOutcome, ToolStatus};
    use crate::pipeline::Strategy;
    use crate::scoring::WeightedScorer;
    use crate::EvidenceStore;
    use std::collections::BTreeMap;

    #[test]
    fn summary_lists_components_and_failed_tools() {
        let mut outcomes = BTreeMap::new();
        outcomes.insert(
            ToolKind::CitationAnalysis,
            ToolOutcome::failed(
                ToolKind::CitationAnalysis,
                "citations",
                ToolStatus::TimedOut,
                "adapter 'citations' timed out after 1s",
            ),
        );
        let report = PipelineReport {
            status: ReportStatus::Degraded,
            content_hash: "0123456789abcdef".into(),
            cache_version: 1,
            strategy: Strategy::Sequential,
            outcomes,
            evidence: Vec::new(),
            score: Some(WeightedScorer::new("0123456789abcdef", 1).score(&EvidenceStore::new(), None)),
        };
        let s = format_summary(&report);
        assert!(s.starts_with("status=degraded strategy=sequential content_hash=0123456789ab\n"));
        assert!(s.contains("score=60.0"));
        assert!(s.contains("methodology"));
        assert!(s.contains("[timed_out] citation_analysis"));
    }
}
