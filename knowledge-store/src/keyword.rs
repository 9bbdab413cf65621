//! Keyword extraction and lexical scoring for the keyword leg of hybrid search.
//!
//! A document matches a keyword when the lower-cased keyword occurs in its
//! `searchText` or in any of its `triggers`. Score = matched / total.

use serde_json::Value;

use crate::record::Payload;

/// Payload key holding the text that was embedded.
pub const SEARCH_TEXT_KEY: &str = "searchText";
/// Payload key holding short trigger phrases (patterns, policies).
pub const TRIGGERS_KEY: &str = "triggers";

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "for", "from", "has", "have",
    "how", "i", "in", "is", "it", "its", "me", "my", "need", "of", "on", "or", "our", "please",
    "should", "so", "that", "the", "this", "to", "us", "want", "we", "what", "with", "would",
    "you", "your",
];

/// Splits free text into lower-cased, de-duplicated keywords (≥ 2 chars, no
/// stop-words), preserving first-occurrence order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    normalize_keywords(
        text.split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '.'))
            .map(|t| t.trim_matches(|c| c == '-' || c == '.')),
    )
}

/// Normalizes an explicit keyword list with the same rules as
/// [`extract_keywords`].
pub fn normalize_keywords<'a, I>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out: Vec<String> = Vec::new();
    for k in keywords {
        let k = k.trim().to_lowercase();
        if k.chars().count() < 2 || STOP_WORDS.contains(&k.as_str()) {
            continue;
        }
        if !out.contains(&k) {
            out.push(k);
        }
    }
    out
}

/// Lower-cased searchable haystack of a payload.
fn haystack(payload: &Payload) -> String {
    let mut s = payload
        .get(SEARCH_TEXT_KEY)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase();
    if let Some(Value::Array(triggers)) = payload.get(TRIGGERS_KEY) {
        for t in triggers.iter().filter_map(Value::as_str) {
            s.push(' ');
            s.push_str(&t.to_lowercase());
        }
    }
    s
}

/// Fraction of `keywords` (already normalized) found in the payload.
pub fn score_payload(payload: &Payload, keywords: &[String]) -> f32 {
    if keywords.is_empty() {
        return 0.0;
    }
    let hay = haystack(payload);
    if hay.is_empty() {
        return 0.0;
    }
    let matched = keywords.iter().filter(|k| hay.contains(k.as_str())).count();
    matched as f32 / keywords.len() as f32
}
