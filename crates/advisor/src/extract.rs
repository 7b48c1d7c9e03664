//! Pulling a JSON object out of free-form model output.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::LlmError;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n?(.*?)```").unwrap());

/// Parse model output as JSON.
///
/// Tried in order: the whole text, the first fenced code block (with or
/// without a `json` tag), and the first balanced `{...}` object in the text.
pub fn extract_json(text: &str) -> Result<Value, LlmError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(LlmError::InvalidResponse("empty model output".into()));
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    for caps in FENCE_RE.captures_iter(trimmed) {
        if let Some(body) = caps.get(1)
            && let Ok(value) = serde_json::from_str::<Value>(body.as_str().trim())
        {
            return Ok(value);
        }
    }

    if let Some(object) = first_balanced_object(trimmed)
        && let Ok(value) = serde_json::from_str::<Value>(object)
    {
        return Ok(value);
    }

    Err(LlmError::InvalidResponse(format!(
        "no JSON object found in model output ({} chars)",
        trimmed.len()
    )))
}

/// First `{...}` span whose braces balance, ignoring braces inside strings.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
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
    fn direct_json() {
        let v = extract_json(r#"  {"summary": "ok", "tips": []} "#).unwrap();
        assert_eq!(v, json!({"summary": "ok", "tips": []}));
    }

    #[test]
    fn json_fence() {
        let text = "Here is your plan:\n```json\n{\"gap\": 1200.5}\n```\nGood luck!";
        assert_eq!(extract_json(text).unwrap(), json!({"gap": 1200.5}));
    }

    #[test]
    fn bare_fence() {
        let text = "```\n{\"reply\": \"hi\"}\n```";
        assert_eq!(extract_json(text).unwrap(), json!({"reply": "hi"}));
    }

    #[test]
    fn prose_around_object() {
        let text = r#"Sure! {"tips": ["save {more}"], "nested": {"a": 1}} Hope that helps."#;
        assert_eq!(
            extract_json(text).unwrap(),
            json!({"tips": ["save {more}"], "nested": {"a": 1}})
        );
    }

    #[test]
    fn escaped_quotes_inside_strings() {
        let text = r#"result: {"summary": "say \"hi\" }"} trailing"#;
        assert_eq!(
            extract_json(text).unwrap(),
            json!({"summary": "say \"hi\" }"})
        );
    }

    #[test]
    fn failure_is_a_parse_error() {
        assert!(matches!(
            extract_json("I cannot help with that."),
            Err(LlmError::InvalidResponse(_))
        ));
        assert!(extract_json("").is_err());
        assert!(extract_json("{ unbalanced").is_err());
    }
}
