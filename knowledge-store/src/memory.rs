//! In-process [`VectorDb`] and deterministic [`EmbeddingProvider`] for tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::future::BoxFuture;

use crate::embed::{EmbeddingProvider, EmbeddingStatus, non_empty_texts};
use crate::errors::{KnowledgeError, Result};
use crate::keyword::{normalize_keywords, score_payload};
use crate::record::{CollectionInfo, MatchType, SearchOptions, SearchResult, VectorDocument};
use crate::vector_db::VectorDb;

#[derive(Default)]
struct Collection {
    dims: Option<usize>,
    docs: BTreeMap<String, VectorDocument>,
}

/// Cosine-similarity store kept in memory. Counts every call so tests can
/// assert that a code path never reached the backend.
pub struct MemoryVectorDb {
    name: String,
    inner: Mutex<Collection>,
    calls: AtomicUsize,
    recreated: AtomicUsize,
    healthy: AtomicBool,
    info_unavailable: AtomicBool,
}

impl MemoryVectorDb {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(Collection::default()),
            calls: AtomicUsize::new(0),
            recreated: AtomicUsize::new(0),
            healthy: AtomicBool::new(true),
            info_unavailable: AtomicBool::new(false),
        }
    }

    /// Number of trait calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// How many times an existing collection was dropped and recreated.
    pub fn recreations(&self) -> usize {
        self.recreated.load(Ordering::SeqCst)
    }

    pub fn set_healthy(&self, ok: bool) {
        self.healthy.store(ok, Ordering::SeqCst);
    }

    /// Makes `get_collection_info` fail, as a backend without point counts would.
    pub fn set_collection_info_unavailable(&self, unavailable: bool) {
        self.info_unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn with<T>(&self, f: impl FnOnce(&mut Collection) -> T) -> T {
        self.touch();
        let mut guard = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

fn ranked(mut hits: Vec<SearchResult>, limit: usize) -> Vec<SearchResult> {
    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
    hits.truncate(limit);
    hits
}

impl VectorDb for MemoryVectorDb {
    fn collection_name(&self) -> &str {
        &self.name
    }

    fn initialize_collection(&self, dimensions: usize) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.with(|c| {
                match c.dims {
                    Some(d) if d == dimensions => {}
                    Some(_) => {
                        c.docs.clear();
                        c.dims = Some(dimensions);
                        self.recreated.fetch_add(1, Ordering::SeqCst);
                    }
                    None => c.dims = Some(dimensions),
                }
                Ok(())
            })
        })
    }

    fn upsert_document(&self, doc: VectorDocument) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.with(|c| {
                if let (Some(want), Some(v)) = (c.dims, doc.vector.as_ref()) {
                    if v.len() != want {
                        return Err(KnowledgeError::VectorSizeMismatch {
                            got: v.len(),
                            want,
                        });
                    }
                }
                c.docs.insert(doc.id.clone(), doc);
                Ok(())
            })
        })
    }

    fn get_document<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<VectorDocument>>> {
        Box::pin(async move { self.with(|c| Ok(c.docs.get(id).cloned())) })
    }

    fn delete_document<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.with(|c| {
                c.docs.remove(id);
                Ok(())
            })
        })
    }

    fn get_all_documents(
        &self,
        limit: Option<usize>,
    ) -> BoxFuture<'_, Result<Vec<VectorDocument>>> {
        Box::pin(async move {
            self.with(|c| {
                let n = limit.unwrap_or(usize::MAX);
                Ok(c.docs.values().take(n).cloned().collect())
            })
        })
    }

    fn delete_all_documents(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.with(|c| {
                c.docs.clear();
                Ok(())
            })
        })
    }

    fn search_similar(
        &self,
        vector: Vec<f32>,
        opts: SearchOptions,
    ) -> BoxFuture<'_, Result<Vec<SearchResult>>> {
        Box::pin(async move {
            self.with(|c| {
                let hits = c
                    .docs
                    .values()
                    .filter_map(|d| {
                        let score = cosine(&vector, d.vector.as_deref()?).max(0.0);
                        (score >= opts.score_threshold).then(|| SearchResult {
                            id: d.id.clone(),
                            score,
                            payload: d.payload.clone(),
                            match_type: MatchType::Semantic,
                        })
                    })
                    .collect();
                Ok(ranked(hits, opts.limit))
            })
        })
    }

    fn search_by_keywords<'a>(
        &'a self,
        keywords: &'a [String],
        opts: SearchOptions,
    ) -> BoxFuture<'a, Result<Vec<SearchResult>>> {
        Box::pin(async move {
            let keywords = normalize_keywords(keywords.iter().map(String::as_str));
            self.with(|c| {
                if keywords.is_empty() {
                    return Ok(Vec::new());
                }
                let hits = c
                    .docs
                    .values()
                    .filter_map(|d| {
                        let score = score_payload(&d.payload, &keywords);
                        (score > 0.0 && score >= opts.score_threshold).then(|| SearchResult {
                            id: d.id.clone(),
                            score,
                            payload: d.payload.clone(),
                            match_type: MatchType::Keyword,
                        })
                    })
                    .collect();
                Ok(ranked(hits, opts.limit))
            })
        })
    }

    fn health_check(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            self.touch();
            self.healthy.load(Ordering::SeqCst)
        })
    }

    fn get_collection_info(&self) -> BoxFuture<'_, Result<CollectionInfo>> {
        Box::pin(async move {
            if self.info_unavailable.load(Ordering::SeqCst) {
                self.touch();
                return Err(KnowledgeError::Qdrant(format!(
                    "collection_info: {} unavailable",
                    self.name
                )));
            }
            self.with(|c| {
                Ok(CollectionInfo {
                    points_count: c.docs.len() as u64,
                    dimensions: c.dims,
                })
            })
        })
    }
}

/// Deterministic bag-of-words embedder: each lower-cased token is hashed into
/// one of `dims` buckets, and the result is L2-normalized. Texts sharing words
/// get a positive cosine similarity.
pub struct StaticEmbedder {
    dims: usize,
    available: bool,
}

impl StaticEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            dims: dims.max(1),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            dims: 8,
            available: false,
        }
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dims];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            // FNV-1a keeps buckets stable across runs and platforms.
            let mut h: u64 = 0xcbf2_9ce4_8422_2325;
            for b in token.to_lowercase().bytes() {
                h ^= u64::from(b);
                h = h.wrapping_mul(0x0100_0000_01b3);
            }
            v[(h % self.dims as u64) as usize] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

impl EmbeddingProvider for StaticEmbedder {
    fn is_available(&self) -> bool {
        self.available
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn generate_embedding<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Option<Vec<f32>>>> {
        Box::pin(async move {
            if text.trim().is_empty() {
                return Err(KnowledgeError::EmptyText);
            }
            Ok(self.available.then(|| self.embed_sync(text)))
        })
    }

    fn generate_embeddings<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Option<Vec<Vec<f32>>>>> {
        Box::pin(async move {
            if !self.available {
                return Ok(None);
            }
            Ok(Some(
                non_empty_texts(texts)
                    .iter()
                    .map(|t| self.embed_sync(t))
                    .collect(),
            ))
        })
    }

    fn status(&self) -> EmbeddingStatus {
        EmbeddingStatus {
            available: self.available,
            provider: "static".into(),
            model: Some(format!("bag-of-words-{}", self.dims)),
            reason: (!self.available).then(|| "disabled".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn batch_skips_empty_entries_in_order() {
        let e = StaticEmbedder::new(16);
        let texts = vec!["alpha".to_string(), "  ".to_string(), "beta".to_string()];
        let out = e.generate_embeddings(&texts).await.unwrap().unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], e.embed_sync("alpha"));
        assert_eq!(out[1], e.embed_sync("beta"));
    }

    #[tokio::test]
    async fn reinitializing_with_new_dims_recreates() {
        let db = MemoryVectorDb::new("c");
        db.initialize_collection(4).await.unwrap();
        db.initialize_collection(4).await.unwrap();
        assert_eq!(db.recreations(), 0);
        db.initialize_collection(8).await.unwrap();
        assert_eq!(db.recreations(), 1);
    }
}
