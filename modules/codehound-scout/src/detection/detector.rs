//! Promo code detection over free text.
//!
//! Pure function of its input and the pattern library: no I/O, no state
//! carried between calls. An empty result is the common case, not an error.

use std::collections::HashMap;

use tracing::debug;

use codehound_common::patterns::{
    has_promo_keyword, is_false_positive, ATTRIBUTE_BONUS, BARE_CONFIDENCE, CODE_MARKERS,
    CONTEXT_RADIUS, KEYWORD_CONFIDENCE,
};
use codehound_common::DetectedCode;

use super::attributes::Attributes;

/// Scan `text` for promo codes. At most one entry per code (case-insensitive),
/// the highest-confidence one; ties keep the first encountered.
pub fn detect_codes(text: &str) -> Vec<DetectedCode> {
    let base_confidence = if has_promo_keyword(&text.to_lowercase()) {
        KEYWORD_CONFIDENCE
    } else {
        BARE_CONFIDENCE
    };

    let mut candidates = Vec::new();
    for marker in CODE_MARKERS {
        let mut at = 0;
        while let Some(caps) = marker.regex.captures_at(text, at) {
            let (Some(whole), Some(token)) = (caps.get(0), caps.get(1)) else {
                break;
            };
            let code = token.as_str().trim();
            if is_false_positive(code) {
                debug!(marker = marker.label, token = code, "Rejected code candidate");
                // The rejected token may itself open a marker ("code CODE: X").
                at = token.start();
                continue;
            }
            at = whole.end();

            let context = context_window(text, whole.start(), whole.end(), CONTEXT_RADIUS);
            let attributes = Attributes::infer(context, code);
            let confidence = score(base_confidence, &attributes);

            debug!(marker = marker.label, code, confidence, "Code candidate");
            candidates.push(DetectedCode {
                code: code.to_string(),
                brand: attributes.brand,
                product: attributes.product,
                discount: attributes.discount,
                extracted_text: context.to_string(),
                expires_at: attributes.expires_at,
                confidence,
            });
        }
    }

    dedup_by_code(candidates)
}

/// Base confidence plus a fixed bonus per inferred attribute, capped at 1.0
/// and rounded to two decimals.
fn score(base: f64, attributes: &Attributes) -> f64 {
    let raw = (base + ATTRIBUTE_BONUS * attributes.scoring_hits() as f64).min(1.0);
    (raw * 100.0).round() / 100.0
}

/// The slice of `text` extending `radius` characters on each side of the
/// match `[start, end)`. Byte offsets in, never splits a UTF-8 sequence.
fn context_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let from = if radius == 0 {
        start
    } else {
        text[..start]
            .char_indices()
            .rev()
            .nth(radius - 1)
            .map(|(i, _)| i)
            .unwrap_or(0)
    };
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    &text[from..to]
}

fn dedup_by_code(candidates: Vec<DetectedCode>) -> Vec<DetectedCode> {
    let mut unique: Vec<DetectedCode> = Vec::with_capacity(candidates.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        let key = candidate.normalized_code();
        match index.get(&key) {
            Some(&i) => {
                if candidate.confidence > unique[i].confidence {
                    unique[i] = candidate;
                }
            }
            None => {
                index.insert(key, unique.len());
                unique.push(candidate);
            }
        }
    }

    unique
}
