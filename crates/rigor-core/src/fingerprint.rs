use crate::scoring::BaseScores;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct Fingerprint {
    pub hex: String,
    pub components: Vec<String>,
}

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

/// Collapses all whitespace runs to a single space and trims the ends.
pub fn normalize_document_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Computes the content hash used as the score cache key.
///
/// Covers the normalized document text and the adapter signature
/// (`kind:name@version` per registered adapter), so enabling, disabling or
/// upgrading a tool produces a different key. Caller-supplied base scores
/// change the result too and are folded in when present. The cache version is
/// not part of the hash; it is the second half of the cache key.
pub fn content_hash(
    document_text: &str,
    adapter_signature: &[String],
    base: Option<&BaseScores>,
) -> Fingerprint {
    let mut parts = Vec::new();

    parts.push(format!(
        "text_sha256={}",
        sha256_hex(&normalize_document_text(document_text))
    ));

    let mut sig = adapter_signature.to_vec();
    sig.sort();
    parts.push(format!("adapters={}", sig.join(",")));

    if let Some(b) = base {
        parts.push(format!(
            "base=methodology:{},reproducibility:{},other:{}",
            base_part(b.methodology),
            base_part(b.reproducibility),
            base_part(b.other)
        ));
    }

    let raw = parts.join("\n");
    let hex = sha256_hex(&raw);

    Fingerprint {
        hex,
        components: parts,
    }
}

fn base_part(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| v.to_string())
}
