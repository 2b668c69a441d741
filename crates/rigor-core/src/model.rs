//! Data model shared by the resolver, evidence store, scorer and cache.
//!
//! Everything here is plain data: serializable, comparable, and free of
//! behavior beyond normalization on construction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum stored snippet length (characters, not bytes).
pub const MAX_SNIPPET_CHARS: usize = 500;

/// Scoring category an evidence item contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Methodology,
    Bias,
    Reproducibility,
    #[serde(alias = "statistics", alias = "statistical")]
    Other,
}

impl Category {
    /// Fixed order used for components, weights and reports.
    pub const ALL: [Category; 4] = [
        Category::Methodology,
        Category::Bias,
        Category::Reproducibility,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Methodology => "methodology",
            Category::Bias => "bias",
            Category::Reproducibility => "reproducibility",
            Category::Other => "other",
        }
    }

    /// Lenient parse used for loosely-shaped tool payloads.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "methodology" | "method" => Some(Category::Methodology),
            "bias" => Some(Category::Bias),
            "reproducibility" => Some(Category::Reproducibility),
            "other" | "statistics" | "statistical" => Some(Category::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Unknown labels fall back to `Medium`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "minor" => Severity::Low,
            "high" | "major" | "critical" => Severity::High,
            _ => Severity::Medium,
        }
    }
}

/// Normalized page rectangle; every coordinate lies in `[0,1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Builds a box clamped into the unit square. Width and height are also
    /// trimmed so the box never extends past the page edge.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        let x = unit(x);
        let y = unit(y);
        Self {
            x,
            y,
            width: unit(width).min(1.0 - x),
            height: unit(height).min(1.0 - y),
        }
    }

    pub fn clamped(self) -> Self {
        Self::new(self.x, self.y, self.width, self.height)
    }

    pub fn is_normalized(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
            && self.x + self.width <= 1.0 + f64::EPSILON
            && self.y + self.height <= 1.0 + f64::EPSILON
    }
}

fn unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// How the page number of an evidence item was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStrategy {
    Explicit,
    Overlap,
    Fallback,
}

/// How the bounding box of an evidence item was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationStrategy {
    Exact,
    Fuzzy,
    Phrase,
    Estimate,
}

impl LocationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationStrategy::Exact => "exact",
            LocationStrategy::Fuzzy => "fuzzy",
            LocationStrategy::Phrase => "phrase",
            LocationStrategy::Estimate => "estimate",
        }
    }
}

/// A finding as reported by a tool adapter, before location resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFinding {
    pub category: Category,
    pub text_snippet: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub score_impact: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_page: Option<u32>,
}

fn default_confidence() -> f64 {
    0.5
}

/// A located, immutable piece of evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub id: String,
    pub category: Category,
    pub text_snippet: String,
    pub rationale: String,
    pub confidence: f64,
    pub severity: Severity,
    pub page_number: u32,
    pub bounding_box: BoundingBox,
    pub score_impact: f64,
    pub source_tool: String,
    /// Index of the finding within its source tool's output.
    pub ordinal: u32,
    pub page_strategy: PageStrategy,
    pub location_strategy: LocationStrategy,
}

/// Truncates to [`MAX_SNIPPET_CHARS`] on a char boundary.
pub fn truncate_snippet(s: &str) -> String {
    match s.char_indices().nth(MAX_SNIPPET_CHARS) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// The closed set of analysis stages the pipeline knows how to schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Summary,
    BiasDetection,
    StatisticalValidation,
    ResearchGaps,
    CitationAnalysis,
    Methodology,
    Reproducibility,
    Aggregator,
}

impl ToolKind {
    /// Documented execution order. The sequential strategy runs adapters in
    /// exactly this order; declaration order also drives `Ord`.
    pub const ALL: [ToolKind; 8] = [
        ToolKind::Summary,
        ToolKind::BiasDetection,
        ToolKind::StatisticalValidation,
        ToolKind::ResearchGaps,
        ToolKind::CitationAnalysis,
        ToolKind::Methodology,
        ToolKind::Reproducibility,
        ToolKind::Aggregator,
    ];

    pub fn phase(&self) -> Phase {
        match self {
            ToolKind::Reproducibility => Phase::Dependent,
            ToolKind::Aggregator => Phase::Final,
            _ => Phase::Independent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::Summary => "summary",
            ToolKind::BiasDetection => "bias_detection",
            ToolKind::StatisticalValidation => "statistical_validation",
            ToolKind::ResearchGaps => "research_gaps",
            ToolKind::CitationAnalysis => "citation_analysis",
            ToolKind::Methodology => "methodology",
            ToolKind::Reproducibility => "reproducibility",
            ToolKind::Aggregator => "aggregator",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s.trim())
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dependency phase. Each phase observes the joined output of all earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Independent,
    Dependent,
    Final,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Independent, Phase::Dependent, Phase::Final];

    pub fn number(&self) -> u8 {
        match self {
            Phase::Independent => 1,
            Phase::Dependent => 2,
            Phase::Final => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Ok,
    Failed,
    TimedOut,
}

impl ToolStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, ToolStatus::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolStatus::Ok => "ok",
            ToolStatus::Failed => "failed",
            ToolStatus::TimedOut => "timed_out",
        }
    }
}

/// Result of running one adapter, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub tool_name: String,
    pub kind: ToolKind,
    pub status: ToolStatus,
    pub payload: serde_json::Value,
    pub findings: Vec<RawFinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl ToolOutcome {
    pub fn failed(
        kind: ToolKind,
        tool_name: impl Into<String>,
        status: ToolStatus,
        error: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            kind,
            status,
            payload: serde_json::Value::Null,
            findings: Vec::new(),
            error: Some(error.into()),
            duration_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub name: String,
    pub category: Category,
    /// Clamped to `[0,100]`.
    pub value: f64,
    pub evidence_count: usize,
    pub base_value: f64,
    /// Signed sum of impacts before clamping.
    pub adjustment: f64,
}

/// Fixed component weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub methodology: f64,
    pub bias: f64,
    pub reproducibility: f64,
    pub other: f64,
}

impl Weights {
    pub const STANDARD: Weights = Weights {
        methodology: 0.6,
        bias: 0.2,
        reproducibility: 0.1,
        other: 0.1,
    };

    pub fn for_category(&self, c: Category) -> f64 {
        match c {
            Category::Methodology => self.methodology,
            Category::Bias => self.bias,
            Category::Reproducibility => self.reproducibility,
            Category::Other => self.other,
        }
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedContribution {
    pub category: Category,
    pub weight: f64,
    /// `component value * weight`.
    pub contribution: f64,
}

/// Auditable scoring result: never just the single number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalScore {
    pub value: f64,
    pub components: Vec<ComponentScore>,
    pub weighted_contributions: Vec<WeightedContribution>,
    pub weights: Weights,
    pub evidence_count: usize,
    pub content_hash: String,
    pub cache_version: u32,
}

impl FinalScore {
    pub fn component(&self, c: Category) -> Option<&ComponentScore> {
        self.components.iter().find(|s| s.category == c)
    }
}

/// One text block of a page with its stored coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based page number.
    pub number: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub blocks: Vec<TextBlock>,
}

/// Document text plus its page-indexed coordinate structure, as produced by
/// the external document parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInput {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub pages: Vec<PageText>,
}

impl DocumentInput {
    /// The document text, falling back to the concatenated page text when the
    /// top-level text is blank.
    pub fn full_text(&self) -> String {
        if !self.text.trim().is_empty() {
            return self.text.clone();
        }
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn page(&self, number: u32) -> Option<&PageText> {
        self.pages.iter().find(|p| p.number == number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_is_clamped_into_unit_square() {
        let b = BoundingBox::new(-0.2, 0.9, 1.5, 0.5);
        assert_eq!(b.x, 0.0);
        assert_eq!(b.y, 0.9);
        assert_eq!(b.width, 1.0);
        assert!((b.height - 0.1).abs() < 1e-12);
        assert!(b.is_normalized());

        let nan = BoundingBox::new(f64::NAN, 0.1, 0.1, f64::NAN);
        assert_eq!(nan.x, 0.0);
        assert_eq!(nan.height, 0.0);
    }

    #[test]
    fn snippet_truncation_respects_char_boundaries() {
        let long = "é".repeat(MAX_SNIPPET_CHARS + 20);
        let t = truncate_snippet(&long);
        assert_eq!(t.chars().count(), MAX_SNIPPET_CHARS);
        assert_eq!(truncate_snippet("short"), "short");
    }

    #[test]
    fn category_accepts_statistics_alias() {
        let c: Category = serde_json::from_str("\"statistics\"").unwrap();
        assert_eq!(c, Category::Other);
        assert_eq!(Category::parse(" Bias "), Some(Category::Bias));
        assert_eq!(Category::parse("nope"), None);
    }

    #[test]
    fn tool_kinds_map_to_dependency_phases() {
        assert_eq!(ToolKind::Methodology.phase(), Phase::Independent);
        assert_eq!(ToolKind::Reproducibility.phase(), Phase::Dependent);
        assert_eq!(ToolKind::Aggregator.phase(), Phase::Final);
        assert_eq!(ToolKind::parse("citation_analysis"), Some(ToolKind::CitationAnalysis));
    }

    #[test]
    fn full_text_falls_back_to_pages() {
        let doc = DocumentInput {
            text: "   ".into(),
            pages: vec![
                PageText {
                    number: 1,
                    text: "first".into(),
                    blocks: vec![],
                },
                PageText {
                    number: 2,
                    text: "second".into(),
                    blocks: vec![],
                },
            ],
        };
        assert_eq!(doc.full_text(), "first\nsecond");
    }
}
