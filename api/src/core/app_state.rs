use std::path::PathBuf;
use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use knowledge_store::{
    EmbeddingProvider, Entity, EntityStore, KnowledgeConfig, KnowledgeStores, LlmEmbedder,
    NoopEmbedder,
};
use recommender::{KubectlDiscovery, RecommenderConfig, ResourceRecommender};
use tracing::{info, warn};

use crate::error_handler::AppError;

/// Shared state for all HTTP handlers.
pub struct AppState {
    pub recommender: ResourceRecommender,
    pub stores: KnowledgeStores,
    pub llm: Arc<LlmServiceProfiles>,
}

impl AppState {
    /// Builds every service from environment configuration.
    ///
    /// Collections are initialized here. A pattern or policy collection
    /// that cannot be initialized is left out of the recommender; a failing
    /// capability collection is only logged, since searches against it
    /// report their own errors.
    pub async fn from_env() -> Result<Self, AppError> {
        let llm = Arc::new(
            LlmServiceProfiles::from_env(Some(5)).map_err(|e| AppError::Config(e.to_string()))?,
        );
        let knowledge = KnowledgeConfig::from_env().map_err(|e| AppError::Config(e.to_string()))?;
        let recommender_cfg =
            RecommenderConfig::from_env().map_err(|e| AppError::Config(e.to_string()))?;

        let embedder: Arc<dyn EmbeddingProvider> = if llm.has_embedding() {
            Arc::new(LlmEmbedder::new(llm.clone(), knowledge.embedding_dim))
        } else {
            Arc::new(NoopEmbedder::new(
                "no embedding provider configured (set EMBEDDING_KIND or OPENAI_API_KEY)",
            ))
        };
        let stores = KnowledgeStores::connect(&knowledge, embedder)
            .map_err(|e| AppError::Config(e.to_string()))?;

        if let Err(e) = stores.capabilities.initialize().await {
            warn!(
                collection = %stores.capabilities.collection_name(),
                error = %e,
                "capability collection could not be initialized"
            );
        }
        let patterns = initialized(&stores.patterns).await;
        let policies = initialized(&stores.policies).await;

        let discovery = KubectlDiscovery::new(std::env::var_os("KUBECONFIG").map(PathBuf::from));
        let recommender = ResourceRecommender::new(
            llm.clone(),
            stores.capabilities.clone(),
            Arc::new(discovery),
            recommender_cfg,
        )
        .with_pattern_store(patterns)
        .with_policy_store(policies);

        info!(
            llm = llm.is_initialized(),
            embeddings = llm.has_embedding(),
            "application state ready"
        );
        Ok(Self {
            recommender,
            stores,
            llm,
        })
    }
}

async fn initialized<E: Entity>(store: &EntityStore<E>) -> Option<EntityStore<E>> {
    match store.initialize().await {
        Ok(()) => Some(store.clone()),
        Err(e) => {
            warn!(
                collection = %store.collection_name(),
                error = %e,
                "collection could not be initialized"
            );
            None
        }
    }
}
