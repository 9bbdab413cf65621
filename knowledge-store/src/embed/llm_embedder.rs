//! Embedding provider backed by the shared `ai-llm-service` embedding profile
//! (OpenAI or Ollama).

use std::sync::Arc;

use ai_llm_service::service_profiles::LlmServiceProfiles;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::embed::{EmbeddingProvider, EmbeddingStatus, non_empty_texts};
use crate::errors::{KnowledgeError, Result};

/// Embedder that delegates to [`LlmServiceProfiles::embed`].
///
/// Vectors whose length differs from `dim` are discarded (treated as a
/// transient failure) so a misconfigured model never poisons a collection.
#[derive(Clone)]
pub struct LlmEmbedder {
    svc: Arc<LlmServiceProfiles>,
    dim: usize,
}

impl LlmEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>, dim: usize) -> Self {
        Self { svc, dim }
    }

    fn check_dim(&self, v: &[f32]) -> Option<KnowledgeError> {
        (v.len() != self.dim).then(|| KnowledgeError::VectorSizeMismatch {
            got: v.len(),
            want: self.dim,
        })
    }
}

impl EmbeddingProvider for LlmEmbedder {
    fn is_available(&self) -> bool {
        self.svc.has_embedding()
    }

    fn dimensions(&self) -> usize {
        self.dim
    }

    fn generate_embedding<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Option<Vec<f32>>>> {
        Box::pin(async move {
            if text.trim().is_empty() {
                return Err(KnowledgeError::EmptyText);
            }
            if !self.is_available() {
                return Ok(None);
            }

            match self.svc.embed(text).await {
                Ok(v) => {
                    if let Some(e) = self.check_dim(&v) {
                        warn!(error = %e, "discarding embedding with unexpected size");
                        return Ok(None);
                    }
                    debug!(dim = v.len(), text_len = text.len(), "embedding generated");
                    Ok(Some(v))
                }
                Err(e) => {
                    warn!(error = %e, "embedding request failed");
                    Ok(None)
                }
            }
        })
    }

    fn generate_embeddings<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Option<Vec<Vec<f32>>>>> {
        Box::pin(async move {
            let inputs = non_empty_texts(texts);
            if inputs.is_empty() {
                return Ok(Some(Vec::new()));
            }
            if !self.is_available() {
                return Ok(None);
            }

            match self.svc.embed_batch(&inputs).await {
                Ok(vs) => {
                    if let Some(e) = vs.iter().find_map(|v| self.check_dim(v)) {
                        warn!(error = %e, "discarding batch with unexpected embedding size");
                        return Ok(None);
                    }
                    debug!(count = vs.len(), "batch embeddings generated");
                    Ok(Some(vs))
                }
                Err(e) => {
                    warn!(error = %e, count = inputs.len(), "batch embedding request failed");
                    Ok(None)
                }
            }
        })
    }

    fn status(&self) -> EmbeddingStatus {
        let (_, _, embedding) = self.svc.profiles();
        match embedding {
            Some(cfg) => EmbeddingStatus {
                available: true,
                provider: cfg.provider.to_string(),
                model: Some(cfg.model.clone()),
                reason: None,
            },
            None => EmbeddingStatus {
                available: false,
                provider: "none".into(),
                model: None,
                reason: Some("no embedding profile configured".into()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_profile_is_unavailable_and_yields_none() {
        let svc = Arc::new(LlmServiceProfiles::new(None, None, None, Some(1)).unwrap());
        let e = LlmEmbedder::new(svc, 8);
        assert!(!e.is_available());
        assert_eq!(e.generate_embedding("hello").await.unwrap(), None);
        assert!(matches!(
            e.generate_embedding("  ").await,
            Err(KnowledgeError::EmptyText)
        ));
        let status = e.status();
        assert!(!status.available);
        assert!(status.reason.is_some());
    }
}
