//! Recovery of a JSON payload from free-form model output.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?i:json)\s*(.*?)\s*```").unwrap());

static ANY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:[\w+-]+[ \t]*\r?\n)?\s*(.*?)\s*```").unwrap());

static BRACE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Pull the most likely JSON document out of a model response.
///
/// First match wins: a ```json fence, any fence, the span from the first
/// `{` to the last `}`, then the trimmed input. Never fails.
pub fn clean_json_response(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if let Some(inner) = JSON_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        return inner.as_str().trim().to_string();
    }

    if let Some(inner) = ANY_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        return inner.as_str().trim().to_string();
    }

    if let Some(span) = BRACE_SPAN.find(trimmed) {
        return span.as_str().to_string();
    }

    trimmed.to_string()
}

/// Decode the greedy `{ ... }` span of `text`, if it is valid JSON.
pub fn extract_trailing_json_object(text: &str) -> Option<Value> {
    let span = BRACE_SPAN.find(text)?;
    serde_json::from_str(span.as_str()).ok()
}
