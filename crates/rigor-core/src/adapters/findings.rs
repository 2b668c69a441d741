use crate::model::{Category, RawFinding, Severity};
use serde_json::Value;

fn first<'a>(obj: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k).filter(|v| !v.is_null()))
}

fn parse_best_effort_entry(v: &Value, default_category: Category) -> Option<RawFinding> {
    if let Ok(finding) = serde_json::from_value::<RawFinding>(v.clone()) {
        return Some(finding);
    }
    let obj = v.as_object()?;
    let text_snippet = first(obj, &["text_snippet", "quote", "text", "snippet"])
        .and_then(Value::as_str)
        .map(ToString::to_string)?;

    let category = first(obj, &["category", "type"])
        .and_then(Value::as_str)
        .and_then(Category::parse)
        .unwrap_or(default_category);
    let rationale = first(obj, &["rationale", "reason", "explanation"])
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let confidence = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.5);
    let severity = obj
        .get("severity")
        .and_then(Value::as_str)
        .map(Severity::parse_lenient)
        .unwrap_or_default();
    let score_impact = first(obj, &["score_impact", "impact"])
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let explicit_page = first(obj, &["explicit_page", "page", "page_number"])
        .and_then(Value::as_u64)
        .and_then(|p| u32::try_from(p).ok());

    Some(RawFinding {
        category,
        text_snippet,
        rationale,
        confidence,
        severity,
        score_impact,
        explicit_page,
    })
}

/// Canonical parse first, then lenient mapping of legacy entry shapes.
/// Entries without any snippet text are dropped.
pub fn parse_findings_best_effort(val: &Value, default_category: Category) -> Vec<RawFinding> {
    if let Ok(findings) = serde_json::from_value::<Vec<RawFinding>>(val.clone()) {
        return findings;
    }
    val.as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|entry| parse_best_effort_entry(entry, default_category))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_records_parse_directly() {
        let v = json!([{
            "category": "bias",
            "text_snippet": "only male participants",
            "rationale": "sampling bias",
            "confidence": 0.9,
            "severity": "high",
            "score_impact": -10.0,
            "explicit_page": 3
        }]);
        let f = parse_findings_best_effort(&v, Category::Other);
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].category, Category::Bias);
        assert_eq!(f[0].explicit_page, Some(3));
        assert_eq!(f[0].severity, Severity::High);
    }

    #[test]
    fn legacy_shapes_are_mapped_and_unparsable_entries_skipped() {
        let v = json!([
            {"quote": "no control group", "page": 2, "impact": -5, "severity": "critical"},
            {"rationale": "missing snippet"},
            {"text": "code not shared", "category": "unknown-label", "reason": "no repo"},
            "not an object"
        ]);
        let f = parse_findings_best_effort(&v, Category::Methodology);
        assert_eq!(f.len(), 2);
        assert_eq!(f[0].text_snippet, "no control group");
        assert_eq!(f[0].explicit_page, Some(2));
        assert_eq!(f[0].score_impact, -5.0);
        assert_eq!(f[0].severity, Severity::High);
        assert_eq!(f[0].category, Category::Methodology);
        assert_eq!(f[1].rationale, "no repo");
        assert_eq!(f[1].confidence, 0.5);
    }

    #[test]
    fn non_array_yields_nothing() {
        assert!(parse_findings_best_effort(&json!({"quote": "x"}), Category::Other).is_empty());
        assert!(parse_findings_best_effort(&Value::Null, Category::Other).is_empty());
    }
}
