//! Model response parsing
//!
//! Replies are expected to be a single JSON object, usually wrapped in
//! markdown fences and sometimes prefixed with a `json` label or buried in
//! prose. Strip the wrapping, recover the object, split out `reasoning`.

use crate::llm::Suggestion;
use anyhow::Result;
use serde_json::Value;

/// Strip surrounding markdown fences and an optional leading `json` label.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let clean = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let clean = clean.strip_suffix("```").unwrap_or(clean).trim();
    // A bare label can survive fence stripping ("json\n{...}").
    match clean.strip_prefix("json") {
        Some(rest) if rest.trim_start().starts_with('{') => rest.trim_start(),
        _ => clean,
    }
}

/// Recover the outermost JSON object from surrounding prose.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start <= end).then(|| &text[start..=end])
}

/// Parse a model reply into a suggestion.
///
/// The `reasoning` key is pulled out as free text; every other key is kept
/// as-is for the patcher to route and convert.
pub fn parse_suggestion(response: &str) -> Result<Suggestion> {
    let clean = strip_fences(response);
    let json_str = extract_json_object(clean)
        .ok_or_else(|| anyhow::anyhow!("no JSON object found in response"))?;

    let parsed: serde_json::Map<String, Value> = serde_json::from_str(json_str)?;

    let mut suggestion = Suggestion::default();
    for (key, value) in parsed {
        if key == "reasoning" {
            suggestion.reasoning = value.as_str().map(|s| s.to_string());
        } else {
            suggestion.attributes.insert(key, value);
        }
    }
    Ok(suggestion)
}
