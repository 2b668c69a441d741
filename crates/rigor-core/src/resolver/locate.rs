//! Bounding-box cascade: exact, fuzzy, phrase, then a deterministic estimate.

use super::text::{padded, significant_words};
use crate::model::{BoundingBox, LocationStrategy, MAX_SNIPPET_CHARS};

pub(crate) struct IndexedBlock {
    pub(crate) raw: String,
    /// Normalized text wrapped in spaces for whole-word `contains`.
    pub(crate) padded: String,
    pub(crate) normalized: String,
    /// Significant words joined by single spaces, wrapped in spaces.
    pub(crate) significant: String,
    pub(crate) bbox: BoundingBox,
}

impl IndexedBlock {
    pub(crate) fn new(raw: &str, bbox: BoundingBox) -> Self {
        let normalized = super::text::normalize(raw);
        let significant = padded(&significant_words(&normalized).join(" "));
        Self {
            raw: raw.to_string(),
            padded: padded(&normalized),
            normalized,
            significant,
            bbox: bbox.clamped(),
        }
    }
}

pub(crate) struct Located {
    pub(crate) bbox: BoundingBox,
    pub(crate) strategy: LocationStrategy,
}

pub(crate) struct SnippetForms<'a> {
    pub(crate) raw: &'a str,
    pub(crate) normalized: &'a str,
    pub(crate) significant: &'a [&'a str],
}

pub(crate) fn exact(snippet: &SnippetForms<'_>, blocks: &[IndexedBlock]) -> Option<Located> {
    let raw = snippet.raw.trim();
    if raw.is_empty() {
        return None;
    }
    let needle = padded(snippet.normalized);
    blocks
        .iter()
        .find(|b| b.raw.contains(raw) || (!snippet.normalized.is_empty() && b.padded.contains(&needle)))
        .map(|b| Located {
            bbox: b.bbox,
            strategy: LocationStrategy::Exact,
        })
}

pub(crate) fn fuzzy(
    snippet: &SnippetForms<'_>,
    blocks: &[IndexedBlock],
    threshold: f64,
) -> Option<Located> {
    let needle = snippet.normalized;
    if needle.is_empty() {
        return None;
    }
    let needle_len = needle.chars().count();
    let mut best: Option<(f64, &IndexedBlock)> = None;
    for block in blocks {
        let block_len = block.normalized.chars().count();
        let (short, long) = if needle_len < block_len {
            (needle_len, block_len)
        } else {
            (block_len, needle_len)
        };
        // Edit distance is at least the length difference, so this bounds the ratio.
        if long == 0 || (short as f64 / long as f64) < threshold {
            continue;
        }
        let sim = strsim::normalized_levenshtein(needle, &block.normalized);
        if sim >= threshold && best.map_or(true, |(s, _)| sim > s) {
            best = Some((sim, block));
        }
    }
    best.map(|(_, b)| Located {
        bbox: b.bbox,
        strategy: LocationStrategy::Fuzzy,
    })
}

/// Longest contiguous run of significant snippet words found in a block.
pub(crate) fn phrase(
    snippet: &SnippetForms<'_>,
    blocks: &[IndexedBlock],
    min_words: usize,
) -> Option<Located> {
    let words = snippet.significant;
    if min_words == 0 || words.len() < min_words {
        return None;
    }
    for len in (min_words..=words.len()).rev() {
        for window in words.windows(len) {
            let needle = padded(&window.join(" "));
            if let Some(b) = blocks.iter().find(|b| b.significant.contains(&needle)) {
                return Some(Located {
                    bbox: b.bbox,
                    strategy: LocationStrategy::Phrase,
                });
            }
        }
    }
    None
}

pub(crate) const ESTIMATE_LEFT_MARGIN: f64 = 0.10;
pub(crate) const ESTIMATE_TOP_MARGIN: f64 = 0.10;
pub(crate) const ESTIMATE_WIDTH: f64 = 0.80;
pub(crate) const ESTIMATE_ROW_STEP: f64 = 0.10;
pub(crate) const ESTIMATE_ROWS: u32 = 8;
pub(crate) const ESTIMATE_MIN_HEIGHT: f64 = 0.02;
pub(crate) const ESTIMATE_MAX_EXTRA_HEIGHT: f64 = 0.08;

/// Synthetic box: rows stack down the page by `slot`, wrapping after
/// [`ESTIMATE_ROWS`]; height grows with snippet length.
pub(crate) fn estimate(snippet_chars: usize, slot: u32) -> Located {
    let row = f64::from(slot % ESTIMATE_ROWS);
    let len = snippet_chars.min(MAX_SNIPPET_CHARS) as f64 / MAX_SNIPPET_CHARS as f64;
    Located {
        bbox: BoundingBox::new(
            ESTIMATE_LEFT_MARGIN,
            ESTIMATE_TOP_MARGIN + row * ESTIMATE_ROW_STEP,
            ESTIMATE_WIDTH,
            ESTIMATE_MIN_HEIGHT + ESTIMATE_MAX_EXTRA_HEIGHT * len,
        ),
        strategy: LocationStrategy::Estimate,
    }
}
