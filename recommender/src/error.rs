//! Error type for the recommendation pipeline.

use ai_llm_service::AiLlmError;
use knowledge_store::KnowledgeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecommendError>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RecommendError {
    /// Misconfiguration detected before any work was done.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("intent must not be empty")]
    EmptyIntent,

    /// Capability search returned nothing to build a solution from.
    #[error("no capabilities found for intent: {0}")]
    NoCapabilities(String),

    #[error("knowledge store error: {0}")]
    Knowledge(#[from] KnowledgeError),

    #[error("LLM request failed: {0}")]
    Llm(#[from] AiLlmError),

    /// The model's solution text could not be read as the expected JSON.
    #[error(
        "Failed to parse AI solution response: {reason}. Raw response: {excerpt}. Available resources: {}",
        .candidates.join(", ")
    )]
    SolutionParse {
        reason: String,
        excerpt: String,
        candidates: Vec<String>,
    },

    /// A solution resource reached schema lookup without its lookup key.
    #[error("resource `{kind}` in solution has no resourceName")]
    MissingResourceName { kind: String },

    /// Every schema lookup of a solution failed.
    #[error("failed to fetch schemas for {failed} resource(s): {details}")]
    SchemaFetch { failed: usize, details: String },

    /// Question set text could not be parsed.
    #[error("failed to parse AI question response: {0}")]
    QuestionParse(String),

    #[error("cluster discovery error: {0}")]
    Cluster(String),
}

/// Up to `max` chars of a model response for error messages.
pub fn excerpt(raw: &str, max: usize) -> String {
    let flat = raw.trim();
    if flat.chars().count() <= max {
        return flat.to_string();
    }
    let mut out: String = flat.chars().take(max).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_lists_candidates() {
        let err = RecommendError::SolutionParse {
            reason: "no JSON object found".into(),
            excerpt: excerpt("Sorry, I cannot help with that request today", 10),
            candidates: vec!["deployments.apps".into(), "services".into()],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to parse AI solution response"));
        assert!(msg.contains("Sorry, I c…"));
        assert!(msg.ends_with("deployments.apps, services"));
    }

    #[test]
    fn excerpt_keeps_short_text() {
        assert_eq!(excerpt("  {\"a\":1}  ", 50), "{\"a\":1}");
    }
}
