//! Replay adapters: serve a tool's output from a recorded JSON fixture.
//!
//! Live tools sit behind text-generation services and are nondeterministic;
//! a recording captures one run of each tool (payload, findings, and
//! optionally a failure or latency) so the pipeline can be exercised end to
//! end and reproducibly.

mod findings;

pub use findings::parse_findings_best_effort;

use crate::model::{Category, RawFinding, ToolKind};
use crate::pipeline::{AdapterInput, AdapterRegistry, DuplicateAdapter, ToolAdapter, ToolOutput};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Category assumed for findings that do not name one.
pub fn default_category(kind: ToolKind) -> Category {
    match kind {
        ToolKind::Methodology => Category::Methodology,
        ToolKind::BiasDetection => Category::Bias,
        ToolKind::Reproducibility => Category::Reproducibility,
        _ => Category::Other,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordedTool {
    pub name: Option<String>,
    pub version: Option<String>,
    pub payload: serde_json::Value,
    /// Raw finding entries; when absent, `payload.findings` is used.
    pub findings: Option<serde_json::Value>,
    /// Recorded failure message. The adapter returns it as an error.
    pub fail: Option<String>,
    pub delay_ms: Option<u64>,
}

/// One recorded run of every tool, keyed by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    #[serde(default)]
    pub tools: BTreeMap<ToolKind, RecordedTool>,
}

impl Recording {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read recording {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid recording {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn registry(&self) -> Result<AdapterRegistry, DuplicateAdapter> {
        let mut registry = AdapterRegistry::new();
        for (kind, tool) in &self.tools {
            registry.register(Arc::new(RecordedAdapter::new(*kind, tool)))?;
        }
        Ok(registry)
    }
}

pub struct RecordedAdapter {
    kind: ToolKind,
    name: String,
    version: String,
    payload: serde_json::Value,
    findings: Vec<RawFinding>,
    fail: Option<String>,
    delay: Option<Duration>,
}

impl RecordedAdapter {
    pub fn new(kind: ToolKind, tool: &RecordedTool) -> Self {
        let raw_findings = tool
            .findings
            .as_ref()
            .or_else(|| tool.payload.get("findings"))
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        Self {
            kind,
            name: tool
                .name
                .clone()
                .unwrap_or_else(|| kind.as_str().to_string()),
            version: tool.version.clone().unwrap_or_else(|| "1".to_string()),
            payload: tool.payload.clone(),
            findings: parse_findings_best_effort(&raw_findings, default_category(kind)),
            fail: tool.fail.clone(),
            delay: tool.delay_ms.map(Duration::from_millis),
        }
    }

    pub fn findings(&self) -> &[RawFinding] {
        &self.findings
    }
}

#[async_trait]
impl ToolAdapter for RecordedAdapter {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    async fn execute(&self, _input: &AdapterInput) -> anyhow::Result<ToolOutput> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(msg) = &self.fail {
            anyhow::bail!("{}", msg);
        }
        Ok(ToolOutput {
            payload: self.payload.clone(),
            findings: self.findings.clone(),
        })
    }
}
