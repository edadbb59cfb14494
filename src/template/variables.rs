//! `[KEY]` variable tokens

use regex::{NoExpand, RegexBuilder};

/// Variable mapping, iterated in insertion order
pub type Variables = serde_json::Map<String, serde_json::Value>;

/// Substitute every `[KEY]` token (case-insensitive on KEY) with its value.
///
/// Entries are applied in mapping order. Keys are normalized with [`normalize_key`]
/// and entries whose key normalizes to nothing are skipped. Tokens without a
/// matching entry stay as literal text.
pub fn resolve_variables(text: &str, variables: &Variables) -> String {
    if variables.is_empty() {
        return text.to_string();
    }

    let mut result = text.to_string();

    for (raw_key, value) in variables {
        let key = normalize_key(raw_key);
        if key.is_empty() {
            continue;
        }

        let pattern = format!(r"\[{}\]", regex::escape(key));
        let matcher = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(matcher) => matcher,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Skipping variable with unusable key");
                continue;
            }
        };

        let replacement = stringify_value(value);
        result = matcher
            .replace_all(&result, NoExpand(replacement.as_str()))
            .into_owned();
    }

    result
}

/// Trim a key, strip stray brackets around it and trim again: `" [name] "` -> `"name"`.
pub fn normalize_key(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
}

/// Render a variable value as the text inserted into the template.
pub fn stringify_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        // Arrays and objects keep their JSON representation
        _ => value.to_string(),
    }
}
