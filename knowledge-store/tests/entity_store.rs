use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use knowledge_store::memory::{MemoryVectorDb, StaticEmbedder};
use knowledge_store::{
    EmbeddingProvider, EmbeddingStatus, Entity, EntityStore, KnowledgeError, MatchType, Pattern,
    SearchOptions, VectorDb,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TestItem {
    id: String,
    name: String,
    description: String,
}

impl Entity for TestItem {
    const KIND: &'static str = "test-item";

    fn extract_id(&self) -> &str {
        &self.id
    }

    fn to_search_text(&self) -> String {
        format!("{} {}", self.name, self.description)
    }
}

/// Maps every text to the same unit vector.
struct ConstantEmbedder;

impl EmbeddingProvider for ConstantEmbedder {
    fn is_available(&self) -> bool {
        true
    }
    fn dimensions(&self) -> usize {
        4
    }
    fn generate_embedding<'a>(
        &'a self,
        _text: &'a str,
    ) -> BoxFuture<'a, knowledge_store::Result<Option<Vec<f32>>>> {
        Box::pin(async { Ok(Some(vec![1.0, 0.0, 0.0, 0.0])) })
    }
    fn generate_embeddings<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, knowledge_store::Result<Option<Vec<Vec<f32>>>>> {
        Box::pin(async move { Ok(Some(vec![vec![1.0, 0.0, 0.0, 0.0]; texts.len()])) })
    }
    fn status(&self) -> EmbeddingStatus {
        EmbeddingStatus {
            available: true,
            provider: "constant".into(),
            model: None,
            reason: None,
        }
    }
}

fn item(id: &str, name: &str, description: &str) -> TestItem {
    TestItem {
        id: id.into(),
        name: name.into(),
        description: description.into(),
    }
}

fn store_with(
    embedder: Arc<dyn EmbeddingProvider>,
) -> (Arc<MemoryVectorDb>, EntityStore<TestItem>) {
    let db = Arc::new(MemoryVectorDb::new("items"));
    let store = EntityStore::new(db.clone() as Arc<dyn VectorDb>, embedder);
    (db, store)
}

#[tokio::test]
async fn store_then_get_returns_equal_entity() {
    let (_, store) = store_with(Arc::new(StaticEmbedder::new(32)));
    store.initialize().await.unwrap();

    let t1 = item("t1", "Test Item", "A test description");
    store.store_data(&t1).await.unwrap();

    let back = store.get_data("t1").await.unwrap().unwrap();
    assert_eq!(back, t1);
    assert_eq!(store.get_data_count().await.unwrap(), 1);
    assert!(store.get_data("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn search_without_embeddings_never_touches_backend() {
    let (db, store) = store_with(Arc::new(StaticEmbedder::unavailable()));

    let err = store
        .search_data("anything", SearchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, KnowledgeError::EmbeddingUnavailable));
    assert_eq!(err.to_string(), "embedding service not available");

    let err = store.store_data(&item("x", "X", "Y")).await.unwrap_err();
    assert!(matches!(err, KnowledgeError::EmbeddingUnavailable));
    assert_eq!(db.calls(), 0);
}

#[tokio::test]
async fn semantic_only_hits_are_tagged_semantic() {
    let (_, store) = store_with(Arc::new(ConstantEmbedder));
    store.initialize().await.unwrap();
    store.store_data(&item("a", "Alpha", "first")).await.unwrap();
    store.store_data(&item("b", "Beta", "second")).await.unwrap();

    let hits = store
        .search_data("zzzz", SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.match_type == MatchType::Semantic));
}

#[tokio::test]
async fn overlapping_hit_is_hybrid_and_boosted() {
    let (_, store) = store_with(Arc::new(ConstantEmbedder));
    store.initialize().await.unwrap();
    store
        .store_data(&item("pg", "PostgreSQL", "managed database"))
        .await
        .unwrap();
    store
        .store_data(&item("redis", "Redis", "cache"))
        .await
        .unwrap();

    let hits = store
        .search_data("postgresql database", SearchOptions::default())
        .await
        .unwrap();

    let pg: Vec<_> = hits.iter().filter(|h| h.data.id == "pg").collect();
    assert_eq!(pg.len(), 1);
    assert_eq!(pg[0].match_type, MatchType::Hybrid);
    assert!(pg[0].score > 1.0);
    assert_eq!(hits[0].data.id, "pg");
    assert_eq!(hits[1].match_type, MatchType::Semantic);
}

#[tokio::test]
async fn delete_paths_remove_documents() {
    let (_, store) = store_with(Arc::new(StaticEmbedder::new(16)));
    store.initialize().await.unwrap();
    for i in 0..3 {
        store
            .store_data(&item(&format!("i{i}"), "Item", "thing"))
            .await
            .unwrap();
    }
    store.delete_data("i0").await.unwrap();
    assert_eq!(store.get_all_data(None).await.unwrap().len(), 2);
    store.delete_all_data().await.unwrap();
    assert_eq!(store.get_data_count().await.unwrap(), 0);
}

#[tokio::test]
async fn count_falls_back_to_enumeration_without_collection_info() {
    let (db, store) = store_with(Arc::new(StaticEmbedder::new(16)));
    store.initialize().await.unwrap();
    for i in 0..4 {
        store
            .store_data(&item(&format!("c{i}"), "Item", "counted"))
            .await
            .unwrap();
    }

    db.set_collection_info_unavailable(true);
    assert!(db.get_collection_info().await.is_err());
    assert_eq!(store.get_data_count().await.unwrap(), 4);
}

#[tokio::test]
async fn pattern_search_ranks_trigger_matches() {
    let db = Arc::new(MemoryVectorDb::new("patterns"));
    let store: EntityStore<Pattern> =
        EntityStore::new(db as Arc<dyn VectorDb>, Arc::new(StaticEmbedder::new(64)));
    store.initialize().await.unwrap();

    let azure = Pattern {
        id: "azure-db".into(),
        description: "Azure managed database".into(),
        triggers: vec!["azure".into(), "postgresql".into()],
        suggested_resources: vec!["resourcegroups.azure.upbound.io".into()],
        rationale: "Everything on Azure needs a resource group".into(),
        created_at: Utc::now(),
        created_by: "platform".into(),
    };
    let web = Pattern {
        id: "web".into(),
        description: "Stateless web frontend".into(),
        triggers: vec!["frontend".into()],
        suggested_resources: vec!["ingresses.networking.k8s.io".into()],
        rationale: "Expose over HTTP".into(),
        created_at: Utc::now(),
        created_by: "platform".into(),
    };
    store.store_data(&azure).await.unwrap();
    store.store_data(&web).await.unwrap();

    let hits = store.search_patterns("postgresql on azure", 5).await.unwrap();
    assert_eq!(hits[0].data, azure);
    assert_eq!(hits[0].match_type, MatchType::Hybrid);
}
