//! Generic entity store with hybrid (semantic + keyword) search.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_EMBEDDING_DIM;
use crate::embed::{EmbeddingProvider, EmbeddingStatus};
use crate::entity::{Entity, HAS_EMBEDDING_KEY};
use crate::errors::{KnowledgeError, Result};
use crate::hybrid::{PERMISSIVE_SEMANTIC_THRESHOLD, merge_results};
use crate::keyword::{SEARCH_TEXT_KEY, extract_keywords};
use crate::record::{MatchType, SearchOptions, VectorDocument};
use crate::vector_db::VectorDb;

/// Decoded entity plus its ranking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityHit<E> {
    pub data: E,
    pub score: f32,
    pub match_type: MatchType,
}

/// Vector-backed store for one entity type.
///
/// Cloning is cheap; clones share the DB client and embedder.
pub struct EntityStore<E: Entity> {
    db: Arc<dyn VectorDb>,
    embedder: Arc<dyn EmbeddingProvider>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for EntityStore<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            embedder: self.embedder.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> EntityStore<E> {
    pub fn new(db: Arc<dyn VectorDb>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            db,
            embedder,
            _entity: PhantomData,
        }
    }

    pub fn collection_name(&self) -> &str {
        self.db.collection_name()
    }

    pub fn embedding_status(&self) -> EmbeddingStatus {
        self.embedder.status()
    }

    /// Ensures the collection exists with the embedder's dimensionality
    /// (1536 when embeddings are unavailable).
    pub async fn initialize(&self) -> Result<()> {
        let dims = if self.embedder.is_available() {
            self.embedder.dimensions()
        } else {
            DEFAULT_EMBEDDING_DIM
        };
        self.db.initialize_collection(dims).await?;
        info!(kind = E::KIND, collection = %self.collection_name(), dims, "entity store ready");
        Ok(())
    }

    /// Embeds and upserts one entity.
    ///
    /// # Errors
    /// - [`KnowledgeError::EmbeddingUnavailable`] when no provider is available
    /// - [`KnowledgeError::EmbeddingFailed`] when the provider returned nothing
    pub async fn store_data(&self, entity: &E) -> Result<()> {
        if !self.embedder.is_available() {
            return Err(KnowledgeError::EmbeddingUnavailable);
        }

        let id = entity.extract_id().to_string();
        let search_text = entity.to_search_text();
        let vector = self
            .embedder
            .generate_embedding(&search_text)
            .await?
            .ok_or_else(|| {
                KnowledgeError::EmbeddingFailed(format!("no vector returned for {} {id}", E::KIND))
            })?;

        let mut payload = entity.to_payload()?;
        payload.remove("id");
        payload.insert(SEARCH_TEXT_KEY.into(), Value::String(search_text));
        payload.insert(HAS_EMBEDDING_KEY.into(), Value::Bool(true));

        self.db
            .upsert_document(VectorDocument {
                id: id.clone(),
                vector: Some(vector),
                payload,
            })
            .await?;

        debug!(kind = E::KIND, %id, "entity stored");
        Ok(())
    }

    /// Hybrid search: semantic and keyword legs run concurrently, then merge.
    ///
    /// Never falls back to keyword-only: without embeddings this fails before
    /// touching the vector DB.
    pub async fn search_data(&self, query: &str, opts: SearchOptions) -> Result<Vec<EntityHit<E>>> {
        if !self.embedder.is_available() {
            return Err(KnowledgeError::EmbeddingUnavailable);
        }

        let vector = match self.embedder.generate_embedding(query).await {
            Ok(Some(v)) => v,
            Ok(None) => {
                return Err(KnowledgeError::SemanticSearchFailed(
                    "query embedding unavailable".into(),
                ));
            }
            Err(e) => return Err(KnowledgeError::SemanticSearchFailed(e.to_string())),
        };

        let keywords = extract_keywords(query);
        let leg_opts = SearchOptions {
            limit: opts.limit.saturating_mul(2).max(1),
            score_threshold: PERMISSIVE_SEMANTIC_THRESHOLD,
        };
        let keyword_opts = SearchOptions {
            score_threshold: 0.0,
            ..leg_opts
        };

        let (semantic, keyword) = tokio::join!(
            self.db.search_similar(vector, leg_opts),
            self.db.search_by_keywords(&keywords, keyword_opts),
        );
        let semantic = semantic.map_err(|e| KnowledgeError::SemanticSearchFailed(e.to_string()))?;
        let keyword = keyword.unwrap_or_else(|e| {
            warn!(kind = E::KIND, error = %e, "keyword search failed; using semantic results only");
            Vec::new()
        });

        let merged = merge_results(semantic, keyword, opts);
        debug!(kind = E::KIND, hits = merged.len(), "hybrid search completed");

        merged
            .into_iter()
            .map(|hit| {
                Ok(EntityHit {
                    data: E::from_payload(&hit.id, &hit.payload)?,
                    score: hit.score,
                    match_type: hit.match_type,
                })
            })
            .collect()
    }

    pub async fn get_data(&self, id: &str) -> Result<Option<E>> {
        match self.db.get_document(id).await? {
            Some(doc) => Ok(Some(E::from_payload(&doc.id, &doc.payload)?)),
            None => Ok(None),
        }
    }

    /// Every stored entity, up to `limit`. Undecodable payloads are skipped.
    pub async fn get_all_data(&self, limit: Option<usize>) -> Result<Vec<E>> {
        let docs = self.db.get_all_documents(limit).await?;
        Ok(docs
            .into_iter()
            .filter_map(|doc| match E::from_payload(&doc.id, &doc.payload) {
                Ok(e) => Some(e),
                Err(e) => {
                    warn!(kind = E::KIND, id = %doc.id, error = %e, "skipping undecodable document");
                    None
                }
            })
            .collect())
    }

    /// Point count from collection info, or a full enumeration when the
    /// backend cannot report it.
    pub async fn get_data_count(&self) -> Result<usize> {
        match self.db.get_collection_info().await {
            Ok(info) => Ok(info.points_count as usize),
            Err(e) => {
                debug!(kind = E::KIND, error = %e, "collection info unavailable; counting documents");
                Ok(self.get_all_data(None).await?.len())
            }
        }
    }

    pub async fn delete_data(&self, id: &str) -> Result<()> {
        self.db.delete_document(id).await
    }

    pub async fn delete_all_data(&self) -> Result<()> {
        self.db.delete_all_documents().await
    }

    pub async fn health_check(&self) -> bool {
        self.db.health_check().await
    }
}
