//! Weighted component scoring.
//!
//! Each category starts from a baseline, accumulates the signed impacts of its
//! evidence in canonical store order, and is clamped to `[0,100]` before it
//! enters the weighted sum. The final value is clamped again.

use crate::evidence::EvidenceStore;
use crate::model::{Category, ComponentScore, FinalScore, WeightedContribution};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub use crate::model::Weights;

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;
pub const BIAS_BASELINE: f64 = 100.0;
pub const DEFAULT_BASELINE: f64 = 50.0;

/// Externally computed starting values (e.g. from the methodology tool).
/// Bias always starts at [`BIAS_BASELINE`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseScores {
    pub methodology: Option<f64>,
    pub reproducibility: Option<f64>,
    pub other: Option<f64>,
}

impl BaseScores {
    pub fn baseline(&self, category: Category) -> f64 {
        let supplied = match category {
            Category::Bias => None,
            Category::Methodology => self.methodology,
            Category::Reproducibility => self.reproducibility,
            Category::Other => self.other,
        };
        match (category, supplied) {
            (Category::Bias, _) => BIAS_BASELINE,
            (_, Some(v)) if v.is_finite() => clamp_score(v),
            _ => DEFAULT_BASELINE,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.methodology.is_none() && self.reproducibility.is_none() && self.other.is_none()
    }
}

pub fn clamp_score(v: f64) -> f64 {
    v.clamp(SCORE_MIN, SCORE_MAX)
}

/// `final = 0.6·M + 0.2·B + 0.1·R + 0.1·O` over already-clamped components.
pub fn combine(weights: &Weights, m: f64, b: f64, r: f64, o: f64) -> f64 {
    clamp_score(
        weights.methodology * m
            + weights.bias * b
            + weights.reproducibility * r
            + weights.other * o,
    )
}

/// Scores the evidence of one document. Holds the provenance stamped onto the
/// result so cached and fresh scores are indistinguishable.
#[derive(Debug, Clone)]
pub struct WeightedScorer {
    weights: Weights,
    content_hash: String,
    cache_version: u32,
}

impl WeightedScorer {
    pub fn new(content_hash: impl Into<String>, cache_version: u32) -> Self {
        Self {
            weights: Weights::STANDARD,
            content_hash: content_hash.into(),
            cache_version,
        }
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn score(&self, store: &EvidenceStore, base: Option<&BaseScores>) -> FinalScore {
        let base = base.copied().unwrap_or_default();
        let evidence = store.all();

        let components: Vec<ComponentScore> = Category::ALL
            .iter()
            .map(|&category| {
                let base_value = base.baseline(category);
                let mut adjustment = 0.0;
                let mut evidence_count = 0;
                for item in evidence.iter().filter(|i| i.category == category) {
                    evidence_count += 1;
                    if !item.score_impact.is_finite() {
                        warn!(
                            id = %item.id,
                            tool = %item.source_tool,
                            "ignoring non-finite score impact"
                        );
                        continue;
                    }
                    adjustment += item.score_impact;
                }
                ComponentScore {
                    name: category.as_str().to_string(),
                    category,
                    value: clamp_score(base_value + adjustment),
                    evidence_count,
                    base_value,
                    adjustment,
                }
            })
            .collect();

        let value_of = |c: Category| {
            components
                .iter()
                .find(|s| s.category == c)
                .map_or(0.0, |s| s.value)
        };

        let weighted_contributions = Category::ALL
            .iter()
            .map(|&category| {
                let weight = self.weights.for_category(category);
                WeightedContribution {
                    category,
                    weight,
                    contribution: value_of(category) * weight,
                }
            })
            .collect();

        let value = combine(
            &self.weights,
            value_of(Category::Methodology),
            value_of(Category::Bias),
            value_of(Category::Reproducibility),
            value_of(Category::Other),
        );

        FinalScore {
            value,
            components,
            weighted_contributions,
            weights: self.weights,
            evidence_count: evidence.len(),
            content_hash: self.content_hash.clone(),
            cache_version: self.cache_version,
        }
    }
}
