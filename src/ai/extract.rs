//! Best-effort extraction of the JSON object a model was instructed to
//! return. Models wrap JSON in prose or markdown fences often enough that
//! strict parsing of the whole reply is a losing game.

use serde_json::Value;

/// Parses the span from the first `{` through the last `}` in the reply.
/// `None` when no such span exists or it is not valid JSON.
pub fn extract_json(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Model output is untrusted text; a field only counts when it is present
/// with the expected type.
pub fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

pub fn string_list_field(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub fn int_field(value: &Value, key: &str) -> Option<i64> {
    value.get(key).and_then(|v| v.as_i64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_json_inside_prose() {
        let parsed = extract_json("prefix {\"summary\": \"ok\"} suffix").unwrap();
        assert_eq!(parsed["summary"], "ok");
    }

    #[test]
    fn finds_json_inside_markdown_fences() {
        let text = "Sure! Here is the analysis:\n```json\n{\"summary\": \"ok\"}\n```";
        let parsed = extract_json(text).unwrap();
        assert_eq!(parsed["summary"], "ok");
    }

    #[test]
    fn no_braces_means_none() {
        assert!(extract_json("plain prose with no json at all").is_none());
    }

    #[test]
    fn invalid_span_means_none() {
        assert!(extract_json("oops { this is not json }").is_none());
        assert!(extract_json("} backwards {").is_none());
    }

    #[test]
    fn wrong_types_are_ignored() {
        let value = serde_json::json!({
            "summary": 42,
            "key_topics": "not a list",
            "total_videos": "also wrong",
        });
        assert_eq!(string_field(&value, "summary"), None);
        assert!(string_list_field(&value, "key_topics").is_empty());
        assert_eq!(int_field(&value, "total_videos"), None);
    }

    #[test]
    fn list_entries_keep_only_strings() {
        let value = serde_json::json!({"key_topics": ["a", 1, "b", null]});
        assert_eq!(string_list_field(&value, "key_topics"), vec!["a", "b"]);
    }
}
