pub mod adapters;
pub mod cache;
pub mod config;
pub mod errors;
pub mod evidence;
pub mod fingerprint;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod scoring;

pub use cache::{MemoryScoreCache, ScoreCache, SqliteScoreCache, CACHE_VERSION};
pub use config::{load_config, ExecutionMode, PipelineConfig};
pub use evidence::EvidenceStore;
pub use model::{
    BoundingBox, Category, DocumentInput, EvidenceItem, FinalScore, PageText, RawFinding,
    Severity, TextBlock, ToolOutcome, ToolStatus,
};
pub use pipeline::{
    AdapterInput, AdapterRegistry, Orchestrator, PipelineContext, PipelineReport, ReportStatus,
    Strategy, ToolAdapter, ToolKind, ToolOutput,
};
pub use resolver::CoordinateResolver;
pub use scoring::{BaseScores, WeightedScorer, Weights};
