//! Coordinate resolution: maps a finding's free-text snippet to a page number
//! and a normalized bounding box.
//!
//! Resolution never fails. Page selection trusts an explicit page, then picks
//! the page with the best significant-word overlap above the configured
//! threshold, and otherwise falls back to page 1. The bounding box is taken
//! from the first rung of exact → fuzzy → phrase matching that succeeds on the
//! chosen page, with a deterministic estimate as the last rung.

mod locate;
pub(crate) mod text;

use crate::config::PipelineConfig;
use crate::model::{
    truncate_snippet, DocumentInput, EvidenceItem, LocationStrategy, PageStrategy, RawFinding,
    ToolKind,
};
use locate::{IndexedBlock, Located, SnippetForms};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

/// Namespace for evidence ids (UUIDv5), so ids are stable across runs.
const EVIDENCE_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6c3f_1d2a_94b7_4e0f_8a51_2f7d_c0e4_91b3);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverSettings {
    pub page_overlap_threshold: f64,
    pub fuzzy_match_threshold: f64,
    pub phrase_min_words: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for ResolverSettings {
    fn from(cfg: &PipelineConfig) -> Self {
        Self {
            page_overlap_threshold: cfg.page_overlap_threshold,
            fuzzy_match_threshold: cfg.fuzzy_match_threshold,
            phrase_min_words: cfg.phrase_min_words,
        }
    }
}

struct IndexedPage {
    number: u32,
    words: HashSet<String>,
    blocks: Vec<IndexedBlock>,
}

/// Page index prepared once per document; shared read-only by all adapter
/// tasks of a run.
pub struct CoordinateResolver {
    settings: ResolverSettings,
    pages: Vec<IndexedPage>,
}

impl CoordinateResolver {
    pub fn new(document: &DocumentInput, settings: ResolverSettings) -> Self {
        let mut pages: Vec<IndexedPage> = document
            .pages
            .iter()
            .map(|p| {
                let mut page_text = text::normalize(&p.text);
                if page_text.is_empty() {
                    page_text = text::normalize(
                        &p.blocks
                            .iter()
                            .map(|b| b.text.as_str())
                            .collect::<Vec<_>>()
                            .join(" "),
                    );
                }
                IndexedPage {
                    number: p.number.max(1),
                    words: text::word_set(&page_text),
                    blocks: p
                        .blocks
                        .iter()
                        .map(|b| IndexedBlock::new(&b.text, b.bbox))
                        .collect(),
                }
            })
            .collect();
        pages.sort_by_key(|p| p.number);
        Self { settings, pages }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Resolves the page for a snippet: explicit page, best overlap at or
    /// above the threshold, or page 1. Among pages tied on overlap, one with
    /// an exact block hit wins; remaining ties go to the lower page number.
    ///
    /// The snippet is truncated the same way evidence snippets are, so page
    /// and box resolution always see the same text.
    pub fn resolve_page(&self, snippet: &str, explicit_page: Option<u32>) -> (u32, PageStrategy) {
        if let Some(page) = explicit_page {
            return (page.max(1), PageStrategy::Explicit);
        }
        let snippet = truncate_snippet(snippet);
        let normalized = text::normalize(&snippet);
        let significant = text::significant_words(&normalized);
        let forms = SnippetForms {
            raw: &snippet,
            normalized: &normalized,
            significant: &significant,
        };
        let words = text::word_set(&normalized);

        let mut best: Option<(f64, bool, u32)> = None;
        for page in &self.pages {
            let ratio = text::overlap_ratio(&words, &page.words);
            if ratio < self.settings.page_overlap_threshold {
                continue;
            }
            let better = match best {
                None => true,
                Some((r, _, _)) if ratio > r => true,
                Some((r, hit, _)) if ratio == r && !hit => {
                    locate::exact(&forms, &page.blocks).is_some()
                }
                _ => false,
            };
            if better {
                let hit = locate::exact(&forms, &page.blocks).is_some();
                best = Some((ratio, hit, page.number));
            }
        }
        match best {
            Some((_, _, number)) => (number, PageStrategy::Overlap),
            None => (1, PageStrategy::Fallback),
        }
    }

    fn blocks_of(&self, page: u32) -> &[IndexedBlock] {
        self.pages
            .iter()
            .find(|p| p.number == page)
            .map(|p| p.blocks.as_slice())
            .unwrap_or(&[])
    }

    fn locate(&self, snippet: &str, page: u32, slot: u32) -> Located {
        let normalized = text::normalize(snippet);
        let significant = text::significant_words(&normalized);
        let forms = SnippetForms {
            raw: snippet,
            normalized: &normalized,
            significant: &significant,
        };
        let blocks = self.blocks_of(page);

        locate::exact(&forms, blocks)
            .or_else(|| locate::fuzzy(&forms, blocks, self.settings.fuzzy_match_threshold))
            .or_else(|| locate::phrase(&forms, blocks, self.settings.phrase_min_words))
            .unwrap_or_else(|| locate::estimate(snippet.chars().count(), slot))
    }

    /// Resolves one finding into an evidence item.
    ///
    /// `kind` and `source_tool` identify the producing adapter; adapter names
    /// are free-form, so the kind keeps ids of same-named tools apart.
    /// `ordinal` is the finding's index within its tool's output and `slot`
    /// its index among the same tool's items on the resolved page (used only
    /// by the estimate rung). Prefer [`ResolutionSession`] which tracks both.
    pub fn resolve(
        &self,
        finding: &RawFinding,
        kind: ToolKind,
        source_tool: &str,
        ordinal: u32,
        slot: u32,
    ) -> EvidenceItem {
        let (page_number, page_strategy) =
            self.resolve_page(&finding.text_snippet, finding.explicit_page);
        self.build(finding, kind, source_tool, ordinal, page_number, page_strategy, slot)
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        finding: &RawFinding,
        kind: ToolKind,
        source_tool: &str,
        ordinal: u32,
        page_number: u32,
        page_strategy: PageStrategy,
        slot: u32,
    ) -> EvidenceItem {
        let snippet = truncate_snippet(&finding.text_snippet);
        let located = self.locate(&snippet, page_number, slot);

        if located.strategy == LocationStrategy::Estimate {
            debug!(
                tool = source_tool,
                ordinal,
                page = page_number,
                degraded = true,
                "evidence location estimated"
            );
        } else {
            debug!(
                tool = source_tool,
                ordinal,
                page = page_number,
                strategy = located.strategy.as_str(),
                "evidence location resolved"
            );
        }

        EvidenceItem {
            id: evidence_id(kind, source_tool, ordinal, finding),
            category: finding.category,
            text_snippet: snippet,
            rationale: finding.rationale.clone(),
            confidence: if finding.confidence.is_nan() {
                0.0
            } else {
                finding.confidence.clamp(0.0, 1.0)
            },
            severity: finding.severity,
            page_number,
            bounding_box: located.bbox,
            score_impact: finding.score_impact,
            source_tool: source_tool.to_string(),
            ordinal,
            page_strategy,
            location_strategy: located.strategy,
        }
    }

    pub fn session<'a>(&'a self, kind: ToolKind, source_tool: &'a str) -> ResolutionSession<'a> {
        ResolutionSession {
            resolver: self,
            kind,
            source_tool,
            next_ordinal: 0,
            page_slots: HashMap::new(),
        }
    }
}

/// Resolves one tool's findings in order, assigning ordinals and per-page
/// slots so estimated boxes stack deterministically.
pub struct ResolutionSession<'a> {
    resolver: &'a CoordinateResolver,
    kind: ToolKind,
    source_tool: &'a str,
    next_ordinal: u32,
    page_slots: HashMap<u32, u32>,
}

impl ResolutionSession<'_> {
    pub fn resolve(&mut self, finding: &RawFinding) -> EvidenceItem {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;

        let (page, page_strategy) = self
            .resolver
            .resolve_page(&finding.text_snippet, finding.explicit_page);
        let slot = self.page_slots.entry(page).or_insert(0);
        let item = self.resolver.build(
            finding,
            self.kind,
            self.source_tool,
            ordinal,
            page,
            page_strategy,
            *slot,
        );
        *slot += 1;
        item
    }
}

fn evidence_id(kind: ToolKind, source_tool: &str, ordinal: u32, finding: &RawFinding) -> String {
    let name = format!(
        "{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}",
        kind.as_str(),
        source_tool,
        ordinal,
        finding.category,
        finding.text_snippet
    );
    Uuid::new_v5(&EVIDENCE_ID_NAMESPACE, name.as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, Category, PageText, Severity, TextBlock};

    fn doc() -> DocumentInput {
        DocumentInput {
            text: String::new(),
            pages: vec![
                PageText {
                    number: 1,
                    text: "Abstract. We study sleep quality in shift workers.".into(),
                    blocks: vec![TextBlock {
                        text: "Abstract. We study sleep quality in shift workers.".into(),
                        bbox: BoundingBox::new(0.1, 0.1, 0.8, 0.05),
                    }],
                },
                PageText {
                    number: 2,
                    text: "Methods. Twelve participants were recruited from a single clinic. \
                           Blinding was not reported."
                        .into(),
                    blocks: vec![
                        TextBlock {
                            text: "Methods. Twelve participants were recruited from a single clinic."
                                .into(),
                            bbox: BoundingBox::new(0.1, 0.2, 0.8, 0.06),
                        },
                        TextBlock {
                            text: "Blinding was not reported.".into(),
                            bbox: BoundingBox::new(0.1, 0.3, 0.5, 0.03),
                        },
                    ],
                },
            ],
        }
    }

    fn finding(snippet: &str, explicit_page: Option<u32>) -> RawFinding {
        RawFinding {
            category: Category::Methodology,
            text_snippet: snippet.into(),
            rationale: "small sample".into(),
            confidence: 0.8,
            severity: Severity::High,
            score_impact: -5.0,
            explicit_page,
        }
    }

    #[test]
    fn explicit_page_is_trusted_unconditionally() {
        let r = CoordinateResolver::new(&doc(), ResolverSettings::default());
        let f = finding("sleep quality in shift workers", Some(2));
        let item = r.resolve(&f, ToolKind::Methodology, "m", 0, 0);
        assert_eq!(item.page_number, 2);
        assert_eq!(item.page_strategy, PageStrategy::Explicit);
        // The snippet is not on page 2, so the box is estimated there.
        assert_eq!(item.location_strategy, LocationStrategy::Estimate);

        let zero = r.resolve(&finding("anything", Some(0)), ToolKind::Methodology, "m", 1, 0);
        assert_eq!(zero.page_number, 1);
    }

    #[test]
    fn overlap_selects_matching_page() {
        let r = CoordinateResolver::new(&doc(), ResolverSettings::default());
        let (page, strategy) = r.resolve_page("twelve participants recruited", None);
        assert_eq!(page, 2);
        assert_eq!(strategy, PageStrategy::Overlap);
    }

    #[test]
    fn low_overlap_falls_back_to_page_one() {
        let r = CoordinateResolver::new(&doc(), ResolverSettings::default());
        // 2 of 5 significant words on page 2: below 0.5 everywhere.
        let (page, strategy) = r.resolve_page("blinding absent from protocol entirely", None);
        assert_eq!(page, 1);
        assert_eq!(strategy, PageStrategy::Fallback);
    }

    #[test]
    fn exact_substring_round_trips_block_bbox() {
        let d = doc();
        let r = CoordinateResolver::new(&d, ResolverSettings::default());
        let f = finding("Blinding was not reported", None);
        let item = r.resolve(&f, ToolKind::Methodology, "m", 0, 0);
        assert_eq!(item.page_number, 2);
        assert_eq!(item.location_strategy, LocationStrategy::Exact);
        assert_eq!(item.bounding_box, d.pages[1].blocks[1].bbox);
    }

    #[test]
    fn ids_are_stable_and_distinct() {
        let r = CoordinateResolver::new(&doc(), ResolverSettings::default());
        let f = finding("Blinding was not reported", None);
        let a = r.resolve(&f, ToolKind::Methodology, "m", 0, 0);
        let b = r.resolve(&f, ToolKind::Methodology, "m", 0, 0);
        let c = r.resolve(&f, ToolKind::Methodology, "m", 1, 0);
        let d = r.resolve(&f, ToolKind::Methodology, "other", 0, 0);
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_ne!(a.id, d.id);

        // Same adapter name under two kinds must not collide.
        let e = r.resolve(&f, ToolKind::Summary, "m", 0, 0);
        assert_ne!(a.id, e.id);
    }

    #[test]
    fn session_stacks_estimates_per_page() {
        let r = CoordinateResolver::new(&doc(), ResolverSettings::default());
        let mut s = r.session(ToolKind::ResearchGaps, "gaps");
        let first = s.resolve(&finding("no trace of this text", None));
        let second = s.resolve(&finding("nor of this other text", None));
        assert_eq!((first.ordinal, second.ordinal), (0, 1));
        assert_eq!(first.location_strategy, LocationStrategy::Estimate);
        assert!(second.bounding_box.y > first.bounding_box.y);
    }

    #[test]
    fn overlap_tie_prefers_page_with_exact_block() {
        let d = DocumentInput {
            text: String::new(),
            pages: vec![
                PageText {
                    number: 1,
                    text: "Blinding reported was not".into(),
                    blocks: vec![TextBlock {
                        text: "Blinding reported was not".into(),
                        bbox: BoundingBox::new(0.1, 0.5, 0.4, 0.03),
                    }],
                },
                PageText {
                    number: 2,
                    text: "Blinding was not reported".into(),
                    blocks: vec![TextBlock {
                        text: "Blinding was not reported".into(),
                        bbox: BoundingBox::new(0.2, 0.6, 0.5, 0.04),
                    }],
                },
            ],
        };
        let r = CoordinateResolver::new(&d, ResolverSettings::default());
        let item = r.resolve(
            &finding("Blinding was not reported", None),
            ToolKind::Methodology,
            "m",
            0,
            0,
        );
        assert_eq!(item.page_number, 2);
        assert_eq!(item.page_strategy, PageStrategy::Overlap);
        assert_eq!(item.location_strategy, LocationStrategy::Exact);
        assert_eq!(item.bounding_box, d.pages[1].blocks[0].bbox);

        // Without an exact hit anywhere, the tie still goes to the lower page.
        let (page, _) = r.resolve_page("not reported blinding", None);
        assert_eq!(page, 1);
    }

    #[test]
    fn page_resolution_uses_truncated_snippet() {
        // The page-2 words only appear past the truncation point.
        let long = format!("{} twelve participants recruited", "zzz ".repeat(200));
        let (page, strategy) = CoordinateResolver::new(&doc(), ResolverSettings::default())
            .resolve_page(&long, None);
        assert_eq!(page, 1);
        assert_eq!(strategy, PageStrategy::Fallback);
    }

    #[test]
    fn empty_index_still_resolves() {
        let r = CoordinateResolver::new(&DocumentInput::default(), ResolverSettings::default());
        let mut f = finding("", None);
        f.confidence = 7.0;
        let item = r.resolve(&f, ToolKind::Methodology, "m", 0, 0);
        assert_eq!(item.page_number, 1);
        assert_eq!(item.confidence, 1.0);
        assert!(item.bounding_box.is_normalized());
    }
}
