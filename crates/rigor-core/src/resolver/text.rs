//! Text normalization shared by page and block matching.

use std::collections::HashSet;

/// Words shorter than this (in chars) are ignored for overlap and phrases.
pub(crate) const SIGNIFICANT_WORD_MIN_CHARS: usize = 3;

/// Case-folds, strips punctuation at word edges and collapses whitespace.
pub(crate) fn normalize(s: &str) -> String {
    s.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Significant words of an already-normalized string, in order.
pub(crate) fn significant_words(normalized: &str) -> Vec<&str> {
    normalized
        .split(' ')
        .filter(|w| w.chars().count() >= SIGNIFICANT_WORD_MIN_CHARS)
        .collect()
}

pub(crate) fn word_set(normalized: &str) -> HashSet<String> {
    significant_words(normalized)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Share of the snippet's distinct significant words present in `page_words`.
pub(crate) fn overlap_ratio(snippet_words: &HashSet<String>, page_words: &HashSet<String>) -> f64 {
    if snippet_words.is_empty() {
        return 0.0;
    }
    let hits = snippet_words
        .iter()
        .filter(|w| page_words.contains(*w))
        .count();
    hits as f64 / snippet_words.len() as f64
}

/// Wraps with single spaces so `contains` only matches whole words.
pub(crate) fn padded(s: &str) -> String {
    format!(" {} ", s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_and_punctuation() {
        assert_eq!(
            normalize("  The SAMPLE size,\n(n = 12) was small. "),
            "the sample size n 12 was small"
        );
        assert_eq!(normalize("--- ..."), "");
    }

    #[test]
    fn significant_words_drop_short_tokens() {
        let n = normalize("We ran it on a big set of 40 mice");
        assert_eq!(significant_words(&n), vec!["ran", "big", "set", "mice"]);
    }

    #[test]
    fn overlap_ratio_counts_distinct_snippet_words() {
        let snippet = word_set(&normalize("small sample small cohort"));
        let page = word_set(&normalize("a small cohort of patients"));
        // distinct snippet words: small, sample, cohort -> 2 of 3 present
        assert!((overlap_ratio(&snippet, &page) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(overlap_ratio(&HashSet::new(), &page), 0.0);
    }
}
