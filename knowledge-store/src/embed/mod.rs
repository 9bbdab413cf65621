use futures::future::BoxFuture;
use serde::Serialize;

use crate::errors::Result;

/// Availability snapshot reported by an embedding provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddingStatus {
    pub available: bool,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Provider interface for embedding generation.
///
/// Transient provider failures surface as `Ok(None)`; only caller mistakes
/// (empty text) are errors.
pub trait EmbeddingProvider: Send + Sync {
    fn is_available(&self) -> bool;

    /// Vector length produced by this provider.
    fn dimensions(&self) -> usize;

    /// # Errors
    /// [`crate::KnowledgeError::EmptyText`] for empty or whitespace input.
    fn generate_embedding<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Option<Vec<f32>>>>;

    /// Embeds the non-empty entries of `texts`, preserving their relative
    /// order. `Ok(None)` on transient failure.
    fn generate_embeddings<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Option<Vec<Vec<f32>>>>>;

    fn status(&self) -> EmbeddingStatus;
}

/// Drops empty/whitespace entries, keeping survivors in order.
pub fn non_empty_texts(texts: &[String]) -> Vec<String> {
    texts
        .iter()
        .filter(|t| !t.trim().is_empty())
        .cloned()
        .collect()
}

pub mod llm_embedder;
pub mod noop_embedder;
