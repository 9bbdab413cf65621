//! Qdrant implementation of [`VectorDb`].
//!
//! Concentrates all `qdrant-client` usage behind the trait so the entity
//! stores never see builders or gRPC types.
//!
//! Point ids: arbitrary string ids map to deterministic UUIDv5 point ids; the
//! original id travels in the payload under [`DOC_ID_KEY`] and is restored on
//! read.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use futures::future::BoxFuture;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, GetPointsBuilder, PointId,
    PointStruct, PointsIdsList, RetrievedPoint, ScrollPointsBuilder, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QValue, VectorParamsBuilder, point_id::PointIdOptions,
    vectors_config,
};
use qdrant_client::{Payload as QPayload, Qdrant};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::VectorDbConfig;
use crate::errors::{KnowledgeError, Result};
use crate::keyword::{normalize_keywords, score_payload};
use crate::record::{
    CollectionInfo, MatchType, Payload, SearchOptions, SearchResult, VectorDocument,
};
use crate::vector_db::VectorDb;

/// Reserved payload key carrying the caller-facing document id.
pub const DOC_ID_KEY: &str = "_docId";

const SCROLL_PAGE: usize = 256;

/// Deterministic point id for a caller id.
pub fn point_uuid(id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes()).to_string()
}

/// Qdrant-backed vector DB for a single collection.
pub struct QdrantVectorDb {
    client: Option<Qdrant>,
    cfg: VectorDbConfig,
    /// Last known dimensionality (0 = unknown); used to recreate on bulk delete.
    dims: AtomicU64,
}

impl QdrantVectorDb {
    /// Builds the client. A client that fails to build is logged and kept
    /// absent; every later call then fails with
    /// [`KnowledgeError::NotInitialized`].
    ///
    /// # Errors
    /// [`KnowledgeError::Config`] for an invalid config.
    pub fn new(cfg: VectorDbConfig) -> Result<Self> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.url);
        if let Some(key) = &cfg.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = match builder.build() {
            Ok(c) => Some(c),
            Err(e) => {
                error!(url = %cfg.url, error = %e, "failed to build Qdrant client");
                None
            }
        };

        Ok(Self {
            client,
            cfg,
            dims: AtomicU64::new(0),
        })
    }

    fn client(&self) -> Result<&Qdrant> {
        self.client.as_ref().ok_or(KnowledgeError::NotInitialized)
    }

    fn collection(&self) -> &str {
        &self.cfg.collection
    }

    async fn create(&self, client: &Qdrant, dimensions: u64) -> Result<()> {
        client
            .create_collection(
                CreateCollectionBuilder::new(self.collection())
                    .vectors_config(VectorParamsBuilder::new(dimensions, Distance::Cosine)),
            )
            .await
            .map_err(|e| KnowledgeError::qdrant("create_collection", e))?;
        self.dims.store(dimensions, Ordering::Relaxed);
        info!(collection = %self.collection(), dimensions, "collection created");
        Ok(())
    }

    async fn recreate(&self, client: &Qdrant, dimensions: u64) -> Result<()> {
        client
            .delete_collection(self.collection())
            .await
            .map_err(|e| KnowledgeError::qdrant("delete_collection", e))?;
        self.create(client, dimensions).await
    }

    /// Reads the configured vector size of the collection.
    async fn current_dimensions(&self, client: &Qdrant) -> Result<Option<u64>> {
        let info = client
            .collection_info(self.collection())
            .await
            .map_err(|e| KnowledgeError::qdrant("collection_info", e))?;

        let size = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|c| match c {
                vectors_config::Config::Params(p) => Some(p.size),
                vectors_config::Config::ParamsMap(_) => None,
            });
        Ok(size)
    }

    /// Pages through the collection, stopping after `limit` points.
    async fn scroll_all(&self, limit: Option<usize>) -> Result<Vec<RetrievedPoint>> {
        let client = self.client()?;
        let mut out = Vec::new();
        let mut offset: Option<PointId> = None;

        loop {
            let remaining = limit.map(|l| l.saturating_sub(out.len()));
            if remaining == Some(0) {
                break;
            }
            let page = remaining.map_or(SCROLL_PAGE, |r| r.min(SCROLL_PAGE));

            let mut req = ScrollPointsBuilder::new(self.collection())
                .limit(page as u32)
                .with_payload(true)
                .with_vectors(false);
            if let Some(o) = offset.take() {
                req = req.offset(o);
            }

            let resp = client
                .scroll(req)
                .await
                .map_err(|e| KnowledgeError::qdrant("scroll", e))?;

            out.extend(resp.result);
            match resp.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(out)
    }
}

/// Converts a Qdrant payload into JSON and splits off the reserved id key.
fn split_payload(point_id: Option<PointId>, raw: HashMap<String, QValue>) -> (String, Payload) {
    let mut payload: Payload = raw.into_iter().map(|(k, v)| (k, v.into_json())).collect();
    let id = match payload.remove(DOC_ID_KEY) {
        Some(Value::String(s)) => s,
        _ => point_id_string(point_id),
    };
    (id, payload)
}

fn point_id_string(pid: Option<PointId>) -> String {
    match pid.and_then(|p| p.point_id_options) {
        Some(PointIdOptions::Uuid(s)) => s,
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}

fn to_qdrant_payload(id: &str, mut payload: Payload) -> Result<QPayload> {
    payload.insert(DOC_ID_KEY.to_string(), Value::String(id.to_string()));
    QPayload::try_from(Value::Object(payload))
        .map_err(|e| KnowledgeError::qdrant("payload convert", e))
}

impl VectorDb for QdrantVectorDb {
    fn collection_name(&self) -> &str {
        self.collection()
    }

    fn initialize_collection(&self, dimensions: usize) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let client = self.client()?;
            let dimensions = dimensions as u64;

            let exists = client
                .collection_exists(self.collection())
                .await
                .map_err(|e| KnowledgeError::qdrant("collection_exists", e))?;
            if !exists {
                return self.create(client, dimensions).await;
            }

            match self.current_dimensions(client).await {
                Ok(Some(size)) if size == dimensions => {
                    self.dims.store(size, Ordering::Relaxed);
                    debug!(collection = %self.collection(), size, "collection already matches");
                    Ok(())
                }
                Ok(found) => {
                    warn!(
                        collection = %self.collection(),
                        found = ?found,
                        wanted = dimensions,
                        "dimension mismatch; dropping and recreating collection"
                    );
                    self.recreate(client, dimensions).await
                }
                Err(e) => {
                    warn!(
                        collection = %self.collection(),
                        error = %e,
                        "collection inspection failed; dropping and recreating collection"
                    );
                    self.recreate(client, dimensions).await
                }
            }
        })
    }

    fn upsert_document(&self, doc: VectorDocument) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let client = self.client()?;
            let known = self.dims.load(Ordering::Relaxed) as usize;
            let vector = checked_vector(&doc.id, doc.vector, known)?;

            let payload = to_qdrant_payload(&doc.id, doc.payload)?;
            let point = PointStruct::new(point_uuid(&doc.id), vector, payload);

            client
                .upsert_points(UpsertPointsBuilder::new(self.collection(), vec![point]).wait(true))
                .await
                .map_err(|e| KnowledgeError::qdrant("upsert_points", e))?;

            debug!(collection = %self.collection(), id = %doc.id, "document upserted");
            Ok(())
        })
    }

    fn get_document<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<VectorDocument>>> {
        Box::pin(async move {
            let client = self.client()?;
            let resp = client
                .get_points(
                    GetPointsBuilder::new(self.collection(), vec![PointId::from(point_uuid(id))])
                        .with_payload(true)
                        .with_vectors(false),
                )
                .await
                .map_err(|e| KnowledgeError::qdrant("get_points", e))?;

            Ok(resp.result.into_iter().next().map(|p| {
                let (doc_id, payload) = split_payload(p.id, p.payload);
                VectorDocument {
                    id: doc_id,
                    vector: None,
                    payload,
                }
            }))
        })
    }

    fn delete_document<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let client = self.client()?;
            client
                .delete_points(
                    DeletePointsBuilder::new(self.collection())
                        .points(PointsIdsList {
                            ids: vec![PointId::from(point_uuid(id))],
                        })
                        .wait(true),
                )
                .await
                .map_err(|e| KnowledgeError::qdrant("delete_points", e))?;
            debug!(collection = %self.collection(), %id, "document deleted");
            Ok(())
        })
    }

    fn get_all_documents(
        &self,
        limit: Option<usize>,
    ) -> BoxFuture<'_, Result<Vec<VectorDocument>>> {
        Box::pin(async move {
            let points = self.scroll_all(limit).await?;
            Ok(points
                .into_iter()
                .map(|p| {
                    let (id, payload) = split_payload(p.id, p.payload);
                    VectorDocument {
                        id,
                        vector: None,
                        payload,
                    }
                })
                .collect())
        })
    }

    fn delete_all_documents(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let client = self.client()?;
            let dims = match self.current_dimensions(client).await {
                Ok(Some(d)) => d,
                _ => self.dims.load(Ordering::Relaxed),
            };

            if dims > 0 {
                warn!(collection = %self.collection(), dims, "dropping all documents (recreate)");
                return self.recreate(client, dims).await;
            }

            // Unknown size: delete point by point instead of losing the schema.
            let points = self.scroll_all(None).await?;
            let ids: Vec<PointId> = points.into_iter().filter_map(|p| p.id).collect();
            if ids.is_empty() {
                return Ok(());
            }
            warn!(collection = %self.collection(), count = ids.len(), "deleting all documents");
            client
                .delete_points(
                    DeletePointsBuilder::new(self.collection())
                        .points(PointsIdsList { ids })
                        .wait(true),
                )
                .await
                .map_err(|e| KnowledgeError::qdrant("delete_points", e))?;
            Ok(())
        })
    }

    fn search_similar(
        &self,
        vector: Vec<f32>,
        opts: SearchOptions,
    ) -> BoxFuture<'_, Result<Vec<SearchResult>>> {
        Box::pin(async move {
            let client = self.client()?;
            let started = Instant::now();

            let req = SearchPointsBuilder::new(self.collection(), vector, opts.limit as u64)
                .with_payload(true)
                .score_threshold(opts.score_threshold);
            let resp = client
                .search_points(req)
                .await
                .map_err(|e| KnowledgeError::qdrant("search_points", e))?;

            let hits: Vec<SearchResult> = resp
                .result
                .into_iter()
                .map(|sp| {
                    let (id, payload) = split_payload(sp.id, sp.payload);
                    SearchResult {
                        id,
                        score: sp.score.max(0.0),
                        payload,
                        match_type: MatchType::Semantic,
                    }
                })
                .collect();

            debug!(
                hits = hits.len(),
                latency_ms = started.elapsed().as_millis(),
                "vector search completed"
            );
            Ok(hits)
        })
    }

    fn search_by_keywords<'a>(
        &'a self,
        keywords: &'a [String],
        opts: SearchOptions,
    ) -> BoxFuture<'a, Result<Vec<SearchResult>>> {
        Box::pin(async move {
            self.client()?;
            let keywords = normalize_keywords(keywords.iter().map(String::as_str));
            if keywords.is_empty() {
                return Ok(Vec::new());
            }

            let points = self.scroll_all(Some(self.cfg.keyword_scan_limit)).await?;
            let scanned = points.len();

            let mut hits: Vec<SearchResult> = points
                .into_iter()
                .filter_map(|p| {
                    let (id, payload) = split_payload(p.id, p.payload);
                    let score = score_payload(&payload, &keywords);
                    (score > 0.0 && score >= opts.score_threshold).then_some(SearchResult {
                        id,
                        score,
                        payload,
                        match_type: MatchType::Keyword,
                    })
                })
                .collect();

            hits.sort_by(|a, b| b.score.total_cmp(&a.score));
            hits.truncate(opts.limit);
            debug!(scanned, hits = hits.len(), "keyword search completed");
            Ok(hits)
        })
    }

    fn health_check(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            let Some(client) = self.client.as_ref() else {
                return false;
            };
            match client.health_check().await {
                Ok(_) => true,
                Err(e) => {
                    warn!(url = %self.cfg.url, error = %e, "Qdrant health check failed");
                    false
                }
            }
        })
    }

    fn get_collection_info(&self) -> BoxFuture<'_, Result<CollectionInfo>> {
        Box::pin(async move {
            let client = self.client()?;
            let info = client
                .collection_info(self.collection())
                .await
                .map_err(|e| KnowledgeError::qdrant("collection_info", e))?;
            let result = info.result.ok_or_else(|| {
                KnowledgeError::Qdrant("collection_info: empty result".into())
            })?;

            let dimensions = result
                .config
                .as_ref()
                .and_then(|c| c.params.as_ref())
                .and_then(|p| p.vectors_config.as_ref())
                .and_then(|v| v.config.as_ref())
                .and_then(|c| match c {
                    vectors_config::Config::Params(p) => Some(p.size as usize),
                    vectors_config::Config::ParamsMap(_) => None,
                });

            Ok(CollectionInfo {
                points_count: result.points_count.unwrap_or(0),
                dimensions,
            })
        })
    }
}

/// The collection has a single unnamed vector, so every point needs one of
/// the known size (`known == 0` means not yet inspected).
fn checked_vector(id: &str, vector: Option<Vec<f32>>, known: usize) -> Result<Vec<f32>> {
    let vector = vector.ok_or_else(|| KnowledgeError::MissingVector { id: id.to_string() })?;
    if known != 0 && vector.len() != known {
        return Err(KnowledgeError::VectorSizeMismatch {
            got: vector.len(),
            want: known,
        });
    }
    Ok(vector)
}
