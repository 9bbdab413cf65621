//! Unified error types for the crate.

use thiserror::Error;

/// Result alias used across `knowledge-store`.
pub type Result<T> = std::result::Result<T, KnowledgeError>;

/// Top-level error for vector DB, embedding and entity store operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// The vector DB client could not be built; every operation fails with this.
    #[error("vector DB client not initialized")]
    NotInitialized,

    /// Writes and searches need an embedding provider.
    #[error("embedding service not available")]
    EmbeddingUnavailable,

    /// Empty or whitespace-only text passed to the embedder.
    #[error("cannot embed empty text")]
    EmptyText,

    /// Provider was available but returned no vector for a write.
    #[error("embedding generation failed: {0}")]
    EmbeddingFailed(String),

    /// Query embedding or vector search failed during `search_data`.
    #[error("semantic search failed: {0}")]
    SemanticSearchFailed(String),

    /// Vector length does not match the collection dimensionality.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// JSON (de)serialization of payloads.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Upsert without a vector into a collection with one unnamed vector.
    #[error("vector required for unnamed-vector collection (document {id})")]
    MissingVector { id: String },

    /// Stored payload does not have the expected shape.
    #[error("invalid payload for document {id}: {reason}")]
    InvalidPayload { id: String, reason: String },

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),
}

impl KnowledgeError {
    pub(crate) fn qdrant(op: &str, e: impl std::fmt::Display) -> Self {
        KnowledgeError::Qdrant(format!("{op}: {e}"))
    }
}
