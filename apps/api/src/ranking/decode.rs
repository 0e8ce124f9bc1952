//! Lenient decoding of completion output into a JSON object.
//!
//! Completion providers rarely return clean JSON: replies arrive wrapped in
//! code fences, prefixed with prose, or followed by trailing junk. Decoding
//! is an ordered chain of strategies — each a pure function from text to an
//! optional JSON object — tried in sequence, first success wins.

use serde_json::Value;

type Strategy = fn(&str) -> Option<Value>;

/// Strategies in order of strictness. Later entries tolerate more noise.
const STRATEGIES: &[Strategy] = &[
    parse_direct,
    parse_fenced,
    parse_outer_braces,
    parse_brace_blocks,
];

/// Runs the strategy chain. Returns the first JSON *object* any strategy
/// produces, or `None` if the text is unsalvageable.
pub fn decode_object(text: &str) -> Option<Value> {
    STRATEGIES.iter().find_map(|strategy| strategy(text))
}

fn parse_object(candidate: &str) -> Option<Value> {
    serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(Value::is_object)
}

/// Strategy 1: the whole reply is the object.
fn parse_direct(text: &str) -> Option<Value> {
    parse_object(text.trim())
}

/// Strategy 2: the object is wrapped in ```json ... ``` or ``` ... ``` fences.
fn parse_fenced(text: &str) -> Option<Value> {
    parse_object(strip_json_fences(text))
}

/// Strategy 3: take everything from the first `{` to the last `}` inclusive.
fn parse_outer_braces(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start < end {
        parse_object(&text[start..=end])
    } else {
        None
    }
}

/// Strategy 4: scan for balanced top-level `{...}` blocks and try each in
/// order. Brace counting ignores braces inside string literals; a block that
/// fails to parse is skipped and the scan continues.
fn parse_brace_blocks(text: &str) -> Option<Value> {
    let mut depth = 0usize;
    let mut start = None;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        if let Some(value) = parse_object(&text[s..=i]) {
                            return Some(value);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// Strips ```json ... ``` or ``` ... ``` code fences from completion output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_clean_json() {
        let value = decode_object(r#"{"final_score": 0.9}"#).unwrap();
        assert_eq!(value["final_score"], 0.9);
    }

    #[test]
    fn test_decodes_fenced_json() {
        let value = decode_object("```json\n{\"final_score\": 0.5}\n```").unwrap();
        assert_eq!(value["final_score"], 0.5);
    }

    #[test]
    fn test_decodes_json_with_surrounding_prose() {
        let text = "here is your result: {\"final_score\": 0.7} trailing junk";
        let value = decode_object(text).unwrap();
        assert_eq!(value["final_score"], 0.7);
    }

    #[test]
    fn test_skips_invalid_blocks_and_takes_first_parsable() {
        let text = "{not json at all} and then {\"final_score\": 0.3}";
        let value = decode_object(text).unwrap();
        assert_eq!(value["final_score"], 0.3);
    }

    #[test]
    fn test_handles_nested_braces() {
        let text = "reply: {\"tech_skills_scores\": {\"rust\": 0.8}, \"final_score\": 0.8}";
        let value = decode_object(text).unwrap();
        assert_eq!(value["tech_skills_scores"]["rust"], 0.8);
    }

    #[test]
    fn test_rejects_non_object_json() {
        assert!(decode_object("[1, 2, 3]").is_none());
        assert!(decode_object("0.7").is_none());
    }

    #[test]
    fn test_returns_none_when_nothing_parses() {
        assert!(decode_object("the model declined to answer").is_none());
        assert!(decode_object("{broken {everywhere}").is_none());
    }
}
