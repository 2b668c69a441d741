#![allow(dead_code)]

use rigor_core::adapters::Recording;
use rigor_core::{BoundingBox, DocumentInput, PageText, TextBlock};
use serde_json::json;

fn page(number: u32, blocks: &[(&str, f64)]) -> PageText {
    PageText {
        number,
        text: blocks
            .iter()
            .map(|(t, _)| *t)
            .collect::<Vec<_>>()
            .join(" "),
        blocks: blocks
            .iter()
            .map(|(t, y)| TextBlock {
                text: (*t).to_string(),
                bbox: BoundingBox::new(0.1, *y, 0.8, 0.05),
            })
            .collect(),
    }
}

pub fn document() -> DocumentInput {
    DocumentInput {
        text: String::new(),
        pages: vec![
            page(
                1,
                &[("Abstract. We examine sleep quality among night shift nurses.", 0.1)],
            ),
            page(
                2,
                &[
                    ("Methods. Twelve participants were recruited from a single clinic.", 0.2),
                    ("Blinding was not reported.", 0.4),
                ],
            ),
            page(3, &[("Results. Code and data are not publicly available.", 0.3)]),
        ],
    }
}

/// Recorded run of five tools. `delays` are per-tool replay latencies in
/// milliseconds, in the order methodology, bias, gaps, reproducibility,
/// aggregator.
pub fn recording(delays: [u64; 5]) -> Recording {
    let raw = json!({
        "tools": {
            "methodology": {
                "payload": {"base_score": 80},
                "findings": [
                    {"category": "methodology", "text_snippet": "Twelve participants were recruited", "score_impact": -10.0},
                    {"category": "methodology", "text_snippet": "Blinding was not reported", "score_impact": -5.0}
                ],
                "delay_ms": delays[0]
            },
            "bias_detection": {
                "findings": [{"quote": "single clinic", "impact": -15}],
                "delay_ms": delays[1]
            },
            "research_gaps": {
                "findings": [
                    {"category": "other", "text_snippet": "no follow-up period described anywhere", "score_impact": 0.0},
                    {"category": "other", "text_snippet": "comparison cohort missing entirely", "score_impact": 0.0}
                ],
                "delay_ms": delays[2]
            },
            "reproducibility": {
                "findings": [
                    {"category": "reproducibility", "text_snippet": "Code and data are not publicly available", "score_impact": -20.0}
                ],
                "delay_ms": delays[3]
            },
            "aggregator": {"payload": {"done": true}, "delay_ms": delays[4]}
        }
    });
    serde_json::from_value(raw).unwrap()
}

/// Final score of [`recording`] over [`document`]:
/// M = 80-15 = 65, B = 100-15 = 85, R = 50-20 = 30, O = 50.
pub const EXPECTED_SCORE: f64 = 0.6 * 65.0 + 0.2 * 85.0 + 0.1 * 30.0 + 0.1 * 50.0;

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
