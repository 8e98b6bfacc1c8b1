//! Structured payload extraction from model output.
//!
//! Language models rarely return bare JSON even when told to: the object
//! usually arrives inside a markdown fence, or wrapped in explanatory
//! prose. The extractor tries the fence first and falls back to the
//! widest `{...}` span in the raw text.

use crate::error::ExtractError;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// How much of a failed candidate to keep in the error for diagnostics.
const SNIPPET_MAX_CHARS: usize = 200;

/// Matches a fenced code block (optional language tag) whose body is a
/// brace-delimited object. Non-greedy so trailing prose after the fence
/// is not swallowed.
fn fenced_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:[a-zA-Z0-9_-]+)?\s*(\{.*?\})\s*```").expect("fence regex is valid")
    })
}

/// Locates and parses a JSON object embedded in `text`.
///
/// Search order:
/// 1. A fenced code block (triple backtick, optional language tag)
///    containing a `{...}` body — the body is parsed.
/// 2. The raw text from the first `{` to the *last* `}`.
///
/// If neither search matches, fails with [`ExtractError::NoJsonContent`].
/// If a candidate is found but is not valid JSON, fails with
/// [`ExtractError::MalformedJson`] — a malformed fenced block does not
/// fall through to the raw-span search.
///
/// Pure and idempotent: the same input always yields the same output or
/// the same failure kind.
pub fn extract_json_payload(text: &str) -> Result<Value, ExtractError> {
    let candidate = match fenced_block_re().captures(text) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or_default(),
        None => brace_span(text).ok_or(ExtractError::NoJsonContent)?,
    };

    let candidate = candidate.trim();
    serde_json::from_str(candidate).map_err(|source| ExtractError::MalformedJson {
        snippet: truncate(candidate),
        source,
    })
}

/// The span from the first `{` to the last `}`, if both exist in order.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn truncate(s: &str) -> String {
    if s.chars().count() <= SNIPPET_MAX_CHARS {
        s.to_string()
    } else {
        let cut: String = s.chars().take(SNIPPET_MAX_CHARS).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_fenced_json_with_language_tag() {
        let text = "Sure! ```json\n{\"completed_tasks\": [], \"new_tasks\": []}\n```";
        let value = extract_json_payload(text).expect("should extract");
        assert_eq!(value, json!({"completed_tasks": [], "new_tasks": []}));
    }

    #[test]
    fn extracts_fenced_json_without_language_tag() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json_payload(text).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn extracts_exact_embedded_object_from_fence() {
        let inner = json!({
            "completed_tasks": ["login page"],
            "new_tasks": [{"title": "write tests", "description": "unit tests for login"}]
        });
        let text = format!("Here you go:\n```json\n{inner}\n```\nLet me know!");
        assert_eq!(extract_json_payload(&text).unwrap(), inner);
    }

    #[test]
    fn falls_back_to_brace_span_in_prose() {
        let text = "The result is {\"completed_tasks\": [\"a\"], \"new_tasks\": []} as requested.";
        let value = extract_json_payload(text).unwrap();
        assert_eq!(value["completed_tasks"][0], "a");
    }

    #[test]
    fn brace_span_is_greedy_to_last_brace() {
        // Nested objects: the span must cover the whole outer object.
        let text = "prefix {\"outer\": {\"inner\": 1}} suffix";
        let value = extract_json_payload(text).unwrap();
        assert_eq!(value["outer"]["inner"], 1);
    }

    #[test]
    fn no_braces_at_all_is_no_json_content() {
        let err = extract_json_payload("I could not find any tasks, sorry.").unwrap_err();
        assert!(matches!(err, ExtractError::NoJsonContent));
    }

    #[test]
    fn invalid_span_is_malformed_json() {
        let err = extract_json_payload("look: {not json at all}").unwrap_err();
        match err {
            ExtractError::MalformedJson { snippet, .. } => {
                assert!(snippet.contains("not json"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_fenced_block_does_not_fall_through() {
        // The raw-span fallback would find the same bad text; the fence
        // match must win and report it as malformed.
        let err = extract_json_payload("```json\n{broken\"}\n```").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedJson { .. }));
    }

    #[test]
    fn same_input_same_failure_kind() {
        let text = "no structure here";
        for _ in 0..3 {
            assert!(matches!(
                extract_json_payload(text).unwrap_err(),
                ExtractError::NoJsonContent
            ));
        }
    }

    #[test]
    fn long_bad_candidate_is_truncated_in_error() {
        let text = format!("{{\"key\": {}x}}", "9".repeat(500));
        match extract_json_payload(&text).unwrap_err() {
            ExtractError::MalformedJson { snippet, .. } => {
                assert!(snippet.chars().count() <= SNIPPET_MAX_CHARS + 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
