//! Recovers the JSON object from a model reply that may be wrapped in prose or code fences.

use serde_json::{Map, Value};

use crate::error::ExtractionError;

pub type JsonObject = Map<String, Value>;

/// Returns the first JSON object found in `raw`.
///
/// Tried in order: the whole text, each fenced code block, a string-aware balanced
/// scan over each top-level `{...}` group, and finally the span from the first `{` to the last `}`.
pub fn extract_json_object(raw: &str) -> Result<JsonObject, ExtractionError> {
    let text = raw.trim();

    if let Some(object) = parse_object(text) {
        return Ok(object);
    }

    for block in fenced_blocks(text) {
        if let Some(object) = parse_object(block) {
            return Ok(object);
        }
    }

    // Only top-level groups: a `{` inside a scanned group, or after one that never
    // closes, is nested and never taken on its own.
    let mut scanned_to = 0;
    for (start, _) in text.match_indices('{') {
        if start < scanned_to {
            continue;
        }
        let Some(end) = balanced_end(&text[start..]) else {
            break;
        };
        if let Some(object) = parse_object(&text[start..start + end]) {
            return Ok(object);
        }
        scanned_to = start + end;
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Some(object) = parse_object(&text[start..=end]) {
                return Ok(object);
            }
        }
    }

    Err(ExtractionError::NoJsonObject)
}

fn parse_object(candidate: &str) -> Option<JsonObject> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// Bodies of ``` fenced blocks, with any language tag on the opening line dropped.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("```") {
        let after_open = &rest[open + 3..];
        let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
        let Some(close) = after_open[body_start..].find("```") else {
            blocks.push(&after_open[body_start..]);
            break;
        };
        blocks.push(&after_open[body_start..body_start + close]);
        rest = &after_open[body_start + close + 3..];
    }

    blocks
}

/// Byte length of the balanced `{...}` group at the start of `text`, ignoring braces
/// inside string literals.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_object() {
        let object = extract_json_object(r#"  {"food": "rice", "quantityGrams": 150}  "#).unwrap();
        assert_eq!(Value::Object(object), json!({"food": "rice", "quantityGrams": 150}));
    }

    #[test]
    fn test_fenced_object_after_prose() {
        let raw = "Sure! ```json\n{\"food\":\"rice\",\"quantityGrams\":150}\n```";
        let object = extract_json_object(raw).unwrap();
        assert_eq!(object["food"], "rice");
        assert_eq!(object["quantityGrams"], 150);
    }

    #[test]
    fn test_object_surrounded_by_prose_with_stray_braces() {
        let embedded = json!({
            "plan": [{"day": "x", "meals": {"breakfast": "eggs {scrambled}", "snacks": ["nuts"]}}]
        });
        let raw = format!(
            "Here is your plan: {} Hope it helps :) enjoy }} and bye",
            serde_json::to_string(&embedded).unwrap()
        );

        let object = extract_json_object(&raw).unwrap();
        assert_eq!(Value::Object(object), embedded);
    }

    #[test]
    fn test_skips_brace_groups_that_are_not_json() {
        let raw = r#"Using {placeholder} syntax, the answer is {"food": "soup", "quantityGrams": 300}."#;
        let object = extract_json_object(raw).unwrap();
        assert_eq!(object["food"], "soup");
    }

    #[test]
    fn test_unterminated_fence() {
        let raw = "```json\n{\"food\": \"bread\", \"quantityGrams\": 80}";
        let object = extract_json_object(raw).unwrap();
        assert_eq!(object["food"], "bread");
    }

    #[test]
    fn test_no_object_is_an_error() {
        for raw in [
            "",
            "I cannot identify any food in this picture.",
            "[1, 2, 3]",
            "\"just a string\"",
            "{ not json at all",
            "}{",
            "{\"unterminated\": \"value}",
        ] {
            assert_eq!(extract_json_object(raw), Err(ExtractionError::NoJsonObject), "input: {}", raw);
        }
    }

    #[test]
    fn test_multibyte_text_around_object() {
        let raw = "Análise concluída ✅ {\"food\": \"feijão\", \"quantityGrams\": 120} — bom apetite";
        let object = extract_json_object(raw).unwrap();
        assert_eq!(object["food"], "feijão");
    }

    #[test]
    fn test_truncated_reply_does_not_yield_nested_object() {
        let raw = r#"{"plan": [{"day": "Monday", "meals": {"breakfast": "Ovos", "lunch": "Arroz"}}, {"day": "Tuesday", "meals": {"#;
        assert_eq!(extract_json_object(raw), Err(ExtractionError::NoJsonObject));
    }
}
