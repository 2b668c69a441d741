use crate::pipeline::PipelineReport;
use std::path::Path;

pub fn report_json(report: &PipelineReport) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn write_json(report: &PipelineReport, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out, report_json(report)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PipelineFatal;
    use crate::pipeline::{PipelineReport, ReportStatus, Strategy};
    use std::collections::BTreeMap;

    #[test]
    fn written_report_reads_back() {
        let report = PipelineReport {
            status: ReportStatus::Partial {
                reason: PipelineFatal::EmptyDocument,
            },
            content_hash: "abc".into(),
            cache_version: 1,
            strategy: Strategy::Concurrent,
            outcomes: BTreeMap::new(),
            evidence: Vec::new(),
            score: None,
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/report.json");
        write_json(&report, &path).unwrap();
        let back: PipelineReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, report);
    }
}
