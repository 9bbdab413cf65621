//! Knowledge stores for the recommender.
//!
//! - [`QdrantVectorDb`] - Qdrant-backed [`VectorDb`] (one collection each)
//! - [`EntityStore`] - typed store with hybrid semantic + keyword search
//! - [`CapabilityStore`], [`PatternStore`], [`PolicyStore`] - the three
//!   entity instances
//! - [`EmbeddingProvider`] - [`LlmEmbedder`] over `ai-llm-service`, or
//!   [`NoopEmbedder`] when no embedding profile is configured

pub mod config;
pub mod embed;
pub mod entities;
pub mod entity;
pub mod errors;
pub mod hybrid;
pub mod keyword;
pub mod qdrant_facade;
pub mod record;
pub mod store;
pub mod vector_db;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

use std::sync::Arc;

pub use config::{KnowledgeConfig, VectorDbConfig};
pub use embed::llm_embedder::LlmEmbedder;
pub use embed::noop_embedder::NoopEmbedder;
pub use embed::{EmbeddingProvider, EmbeddingStatus};
pub use entities::{
    Capability, CapabilityStore, Complexity, DeployedPolicyReference, Pattern, PatternStore,
    PolicyIntent, PolicyStore,
};
pub use entity::Entity;
pub use errors::{KnowledgeError, Result};
pub use qdrant_facade::QdrantVectorDb;
pub use record::{CollectionInfo, MatchType, SearchOptions, SearchResult, VectorDocument};
pub use store::{EntityHit, EntityStore};
pub use vector_db::VectorDb;

/// The three stores sharing one embedder.
#[derive(Clone)]
pub struct KnowledgeStores {
    pub capabilities: CapabilityStore,
    pub patterns: PatternStore,
    pub policies: PolicyStore,
}

impl KnowledgeStores {
    /// Builds Qdrant-backed stores for the configured collections.
    ///
    /// # Errors
    /// [`KnowledgeError::Config`] when a collection config is invalid.
    pub fn connect(cfg: &KnowledgeConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let db = |name: &str| -> Result<Arc<dyn VectorDb>> {
            Ok(Arc::new(QdrantVectorDb::new(cfg.vector_db(name))?))
        };
        Ok(Self {
            capabilities: EntityStore::new(db(&cfg.capabilities_collection)?, embedder.clone()),
            patterns: EntityStore::new(db(&cfg.patterns_collection)?, embedder.clone()),
            policies: EntityStore::new(db(&cfg.policies_collection)?, embedder),
        })
    }
}
