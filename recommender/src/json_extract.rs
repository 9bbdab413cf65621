//! Pulls the JSON payload out of free-form model output.
//!
//! Models wrap JSON in markdown fences and surround it with prose that may
//! itself contain braces. Fenced bodies are searched first, then the whole
//! text; within each region every `{` is tried until a balanced block parses.
//! Invalid JSON (comments, trailing commas) is not repaired.

use serde::de::{DeserializeOwned, IgnoredAny};

/// Returns the first well-formed JSON object in `text`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    object_blocks(text).find(|block| serde_json::from_str::<IgnoredAny>(block).is_ok())
}

/// Extracts the first well-formed JSON object and deserializes it.
///
/// # Errors
/// A human-readable reason when no object is found, when no balanced block
/// parses (the first block's syntax error is reported), or when the object
/// does not have the expected shape.
pub fn parse_json_object<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    let Some(block) = extract_json_object(text) else {
        return Err(object_blocks(text)
            .next()
            .and_then(|first| serde_json::from_str::<IgnoredAny>(first).err())
            .map(|e| format!("invalid JSON: {e}"))
            .unwrap_or_else(|| "no JSON object found".to_string()));
    };
    serde_json::from_str(block).map_err(|e| format!("invalid JSON: {e}"))
}

/// Balanced `{...}` blocks, fenced regions first, in order of their opening brace.
fn object_blocks(text: &str) -> impl Iterator<Item = &str> {
    let text = text.trim_start_matches('\u{feff}');
    fenced_bodies(text)
        .into_iter()
        .chain(std::iter::once(text))
        .flat_map(|region| {
            region
                .match_indices('{')
                .filter_map(move |(start, _)| {
                    balanced_end(&region[start..]).map(|end| &region[start..start + end])
                })
        })
}

/// Bodies of closed markdown fences; the info string (`json`) is skipped.
fn fenced_bodies(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        let Some(newline) = after.find('\n') else {
            break;
        };
        let body = &after[newline + 1..];
        let Some(close) = body.find("```") else {
            break;
        };
        out.push(&body[..close]);
        rest = &body[close + 3..];
    }
    out
}

/// Byte length of the balanced block at the start of `s`, if it closes.
fn balanced_end(s: &str) -> Option<usize> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
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
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(c) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i + c.len_utf8());
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
    use serde_json::Value;

    #[test]
    fn strips_fences_and_trailing_prose() {
        let text = "Here you go:\n```json\n{\"solutions\": [{\"score\": 90}]}\n```\nLet me know!";
        assert_eq!(
            extract_json_object(text),
            Some("{\"solutions\": [{\"score\": 90}]}")
        );
    }

    #[test]
    fn fenced_payload_wins_over_braces_in_prose() {
        let text = "I compared {deployments, services} and chose:\n```json\n{\"solutions\": [{\"score\": 90}]}\n```";
        let v: Value = parse_json_object(text).unwrap();
        assert_eq!(v["solutions"][0]["score"], 90);
    }

    #[test]
    fn unclosed_brace_in_prose_is_skipped() {
        let text = "Note: the set {a, b is partial.\n{\"solutions\": [{\"score\": 70}]}";
        let v: Value = parse_json_object(text).unwrap();
        assert_eq!(v["solutions"][0]["score"], 70);
    }

    #[test]
    fn balanced_prose_block_is_skipped() {
        let text = "Options {a} and {b} considered. {\"n\": 2}";
        assert_eq!(extract_json_object(text), Some("{\"n\": 2}"));
    }

    #[test]
    fn braces_inside_strings_do_not_close() {
        let text = r#"{"description": "use {braces} and \"quotes\" }", "n": 1} trailing }"#;
        let v: Value = parse_json_object(text).unwrap();
        assert_eq!(v["n"], 1);
        assert_eq!(v["description"], "use {braces} and \"quotes\" }");
    }

    #[test]
    fn unbalanced_or_missing_yields_none() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("{\"a\": [1, 2}"), None);
        assert_eq!(extract_json_object("{\"a\": 1"), None);
    }

    #[test]
    fn comments_are_not_repaired() {
        let text = "{\n  // the best option\n  \"score\": 80\n}";
        let err = parse_json_object::<Value>(text).unwrap_err();
        assert!(err.starts_with("invalid JSON"));
    }

    #[test]
    fn missing_object_reason() {
        let err = parse_json_object::<Value>("I could not find anything").unwrap_err();
        assert_eq!(err, "no JSON object found");
    }
}
