//! Tolerant extraction of `{confidence, analysis}` from model replies.
//!
//! Models are asked for pure JSON but often wrap it in prose or code fences,
//! truncate it, or emit near-JSON. Extraction runs an ordered chain of pure
//! strategies and stops at the first one that yields both fields. No strategy
//! invents a confidence from text that does not carry a `confidence` label.

use crate::types::StructuredResult;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// A single extraction strategy: total, side-effect free.
pub type Strategy = fn(&str) -> Option<StructuredResult>;

/// Strategies in the order they are attempted.
pub const STRATEGIES: [(&str, Strategy); 3] = [
    ("whole_json", parse_whole_json),
    ("embedded_object", parse_embedded_object),
    ("labelled_fields", parse_labelled_fields),
];

static FLAT_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^{}]*\}").unwrap());

static CONFIDENCE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""confidence"\s*:\s*"?(-?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)"#).unwrap()
});

static ANALYSIS_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""analysis"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap());

/// Run the strategy chain over a raw reply.
///
/// Returns `None` when the reply is unstructured; the caller decides how to
/// degrade.
pub fn extract(raw_text: &str) -> Option<StructuredResult> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let result = strategy(raw_text);
        if result.is_some() {
            tracing::debug!("Reply parsed with {name} strategy");
        }
        result
    })
}

/// Strategy 1: the whole trimmed reply is a JSON object.
pub fn parse_whole_json(text: &str) -> Option<StructuredResult> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => from_object(&map),
        _ => None,
    }
}

/// Strategy 2: a flat `{...}` inside the reply mentions both keys and parses.
pub fn parse_embedded_object(text: &str) -> Option<StructuredResult> {
    FLAT_OBJECT
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|candidate| {
            candidate.contains("\"confidence\"") && candidate.contains("\"analysis\"")
        })
        .find_map(|candidate| match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => from_object(&map),
            _ => None,
        })
}

/// Strategy 3: independent `"confidence": <number>` and `"analysis": "<string>"` labels.
pub fn parse_labelled_fields(text: &str) -> Option<StructuredResult> {
    let confidence = CONFIDENCE_FIELD
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|c| c.is_finite())?;

    let raw_analysis = ANALYSIS_FIELD.captures(text).and_then(|caps| caps.get(1))?;
    let analysis = unescape_json_string(raw_analysis.as_str());

    Some(StructuredResult {
        confidence,
        analysis,
    })
}

/// Pull both fields out of a parsed object.
///
/// Confidence may be a number or a numeric string; analysis must be a string.
fn from_object(map: &Map<String, Value>) -> Option<StructuredResult> {
    let confidence = match map.get("confidence")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|c| c.is_finite())?;

    let analysis = map.get("analysis")?.as_str()?.to_string();

    Some(StructuredResult {
        confidence,
        analysis,
    })
}

/// Decode JSON escapes in a captured string body, keeping it verbatim on failure.
fn unescape_json_string(body: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{body}\"")).unwrap_or_else(|_| body.to_string())
}
