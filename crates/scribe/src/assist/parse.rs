//! Lenient parsing of model-produced suggestion arrays
//!
//! The model is instructed to return a flat JSON array, but its output is
//! not trusted: code fences are stripped, unparseable output degrades to
//! an empty list (logged, never an error), and each element is coerced
//! field by field into a well-formed `Suggestion`.

use serde_json::Value;
use tracing::warn;

use crate::assist::types::{Suggestion, SuggestionKind};

/// Parse raw model output into suggestions.
/// Returns an empty vec on total parse failure (graceful degradation).
pub fn parse_suggestions(raw: &str) -> Vec<Suggestion> {
    let cleaned = strip_code_fences(raw);

    let value: Value = match serde_json::from_str(cleaned.trim()) {
        Ok(v) => v,
        Err(e) => {
            warn!("Analyze output was not valid JSON, returning no suggestions: {e}");
            return Vec::new();
        }
    };

    let items = match value.as_array() {
        Some(items) => items,
        None => {
            warn!("Analyze output was not a JSON array, returning no suggestions");
            return Vec::new();
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| coerce_suggestion(item, i))
        .collect()
}

/// Remove markdown code-fence markers the model sometimes wraps its
/// output in despite instructions.
fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "")
}

/// Coerce one parsed element at 0-based position `index` into a
/// `Suggestion`, defaulting every missing or invalid field.
fn coerce_suggestion(item: &Value, index: usize) -> Suggestion {
    let id = match item.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => (index + 1).to_string(),
    };

    let kind = item
        .get("type")
        .and_then(Value::as_str)
        .and_then(SuggestionKind::from_raw)
        .unwrap_or(SuggestionKind::Improvement);

    Suggestion {
        id,
        kind,
        title: string_field(item, "title"),
        description: string_field(item, "description"),
        original: string_field(item, "original"),
        suggested: string_field(item, "suggested"),
    }
}

fn string_field(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
