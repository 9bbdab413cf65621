use futures::future::BoxFuture;

use crate::config::DEFAULT_EMBEDDING_DIM;
use crate::embed::{EmbeddingProvider, EmbeddingStatus};
use crate::errors::{KnowledgeError, Result};

/// Always-unavailable provider used when no embedding profile is configured.
#[derive(Clone, Debug)]
pub struct NoopEmbedder {
    reason: String,
}

impl NoopEmbedder {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for NoopEmbedder {
    fn default() -> Self {
        Self::new("no embedding provider configured (set EMBEDDING_KIND or OPENAI_API_KEY)")
    }
}

impl EmbeddingProvider for NoopEmbedder {
    fn is_available(&self) -> bool {
        false
    }

    fn dimensions(&self) -> usize {
        DEFAULT_EMBEDDING_DIM
    }

    fn generate_embedding<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Option<Vec<f32>>>> {
        Box::pin(async move {
            if text.trim().is_empty() {
                return Err(KnowledgeError::EmptyText);
            }
            Ok(None)
        })
    }

    fn generate_embeddings<'a>(
        &'a self,
        _texts: &'a [String],
    ) -> BoxFuture<'a, Result<Option<Vec<Vec<f32>>>>> {
        Box::pin(async { Ok(None) })
    }

    fn status(&self) -> EmbeddingStatus {
        EmbeddingStatus {
            available: false,
            provider: "none".into(),
            model: None,
            reason: Some(self.reason.clone()),
        }
    }
}
