use crate::model::{DocumentInput, Phase, RawFinding, ToolKind, ToolOutcome};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// What an adapter sees: the document and the joined outcomes of every
/// earlier phase (empty for phase 1).
#[derive(Debug, Clone)]
pub struct AdapterInput {
    pub document: Arc<DocumentInput>,
    pub prior: Arc<BTreeMap<ToolKind, ToolOutcome>>,
}

impl AdapterInput {
    pub fn prior_outcome(&self, kind: ToolKind) -> Option<&ToolOutcome> {
        self.prior.get(&kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    pub payload: serde_json::Value,
    pub findings: Vec<RawFinding>,
}

#[async_trait]
pub trait ToolAdapter: Send + Sync {
    fn kind(&self) -> ToolKind;

    fn name(&self) -> &str;

    /// Part of the content fingerprint: bump when the tool's output changes
    /// meaning.
    fn version(&self) -> &str {
        "1"
    }

    async fn execute(&self, input: &AdapterInput) -> anyhow::Result<ToolOutput>;
}

#[derive(Debug, thiserror::Error)]
#[error("adapter for {kind} already registered as '{existing}'")]
pub struct DuplicateAdapter {
    pub kind: ToolKind,
    pub existing: String,
}

/// Fixed lookup table from tool kind to adapter, built once at startup.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<ToolKind, Arc<dyn ToolAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn ToolAdapter>) -> Result<(), DuplicateAdapter> {
        let kind = adapter.kind();
        if let Some(existing) = self.adapters.get(&kind) {
            return Err(DuplicateAdapter {
                kind,
                existing: existing.name().to_string(),
            });
        }
        self.adapters.insert(kind, adapter);
        Ok(())
    }

    pub fn with(mut self, adapter: Arc<dyn ToolAdapter>) -> Result<Self, DuplicateAdapter> {
        self.register(adapter)?;
        Ok(self)
    }

    pub fn get(&self, kind: ToolKind) -> Option<&Arc<dyn ToolAdapter>> {
        self.adapters.get(&kind)
    }

    /// Adapters of one phase, in [`ToolKind::ALL`] order.
    pub fn phase(&self, phase: Phase) -> Vec<Arc<dyn ToolAdapter>> {
        self.adapters
            .iter()
            .filter(|(k, _)| k.phase() == phase)
            .map(|(_, a)| a.clone())
            .collect()
    }

    pub fn kinds(&self) -> Vec<ToolKind> {
        self.adapters.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// `kind:name@version` per adapter, sorted.
    pub fn signature(&self) -> Vec<String> {
        let mut sig: Vec<String> = self
            .adapters
            .iter()
            .map(|(k, a)| format!("{}:{}@{}", k, a.name(), a.version()))
            .collect();
        sig.sort();
        sig
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.signature())
            .finish()
    }
}
