use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ai_llm_service::{AiLlmError, LlmResponse, LlmUsage};
use chrono::Utc;
use futures::future::BoxFuture;
use knowledge_store::memory::{MemoryVectorDb, StaticEmbedder};
use knowledge_store::{
    Capability, CapabilityStore, Complexity, EmbeddingProvider, EntityStore, Pattern,
    PatternStore, VectorDb,
};
use recommender::prompt::{QUESTION_SYSTEM, SOLUTION_SYSTEM};
use recommender::{
    ClusterDiscovery, LlmClient, QuestionGroup, QuestionType, RecommendError, RecommenderConfig,
    ResourceInventory, ResourceRecommender,
};

const AZURE_DB: &str = "flexibleservers.dbforpostgresql.azure.upbound.io";
const AZURE_RG: &str = "resourcegroups.azure.upbound.io";

/// Answers by system prompt; records every prompt it sees.
struct ScriptedLlm {
    initialized: bool,
    solution: String,
    questions: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    fn new(solution: &str, questions: Option<&str>) -> Self {
        Self {
            initialized: true,
            solution: solution.to_string(),
            questions: questions.map(str::to_string),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl LlmClient for ScriptedLlm {
    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn send_message<'a>(
        &'a self,
        prompt: &'a str,
        system: Option<&'a str>,
    ) -> BoxFuture<'a, Result<LlmResponse, AiLlmError>> {
        Box::pin(async move {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match system {
                Some(SOLUTION_SYSTEM) => Ok(LlmResponse::new(&self.solution, LlmUsage::new(100, 40))),
                Some(QUESTION_SYSTEM) => match &self.questions {
                    Some(q) => Ok(LlmResponse::new(q, LlmUsage::new(50, 20))),
                    None => Err(AiLlmError::Timeout(std::time::Duration::from_secs(30))),
                },
                _ => Err(AiLlmError::NotInitialized("unexpected system prompt")),
            }
        })
    }
}

#[derive(Default)]
struct FakeCluster {
    failing_schemas: Vec<String>,
    explained: AtomicUsize,
}

impl FakeCluster {
    fn failing(names: &[&str]) -> Self {
        Self {
            failing_schemas: names.iter().map(|s| s.to_string()).collect(),
            explained: AtomicUsize::new(0),
        }
    }
}

impl ClusterDiscovery for FakeCluster {
    fn discover_resources(&self) -> BoxFuture<'_, recommender::Result<ResourceInventory>> {
        Box::pin(async { Err(RecommendError::Cluster("no cluster in tests".into())) })
    }

    fn explain_resource<'a>(
        &'a self,
        resource_name: &'a str,
    ) -> BoxFuture<'a, recommender::Result<String>> {
        Box::pin(async move {
            self.explained.fetch_add(1, Ordering::SeqCst);
            if self.failing_schemas.iter().any(|f| f == resource_name) {
                return Err(RecommendError::Cluster(format!("no schema for {resource_name}")));
            }
            Ok(format!("KIND: {resource_name}\nFIELDS:\n  spec <Object>"))
        })
    }

    fn namespaces(&self) -> BoxFuture<'_, recommender::Result<Vec<String>>> {
        Box::pin(async { Ok(vec!["default".to_string(), "prod".to_string()]) })
    }

    fn storage_classes(&self) -> BoxFuture<'_, recommender::Result<Vec<String>>> {
        Box::pin(async { Err(RecommendError::Cluster("forbidden".into())) })
    }

    fn ingress_classes(&self) -> BoxFuture<'_, recommender::Result<Vec<String>>> {
        Box::pin(async { Ok(vec!["nginx".to_string()]) })
    }

    fn node_labels(&self) -> BoxFuture<'_, recommender::Result<Vec<String>>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

fn embedder() -> Arc<dyn EmbeddingProvider> {
    Arc::new(StaticEmbedder::new(64))
}

async fn capability_store() -> (Arc<MemoryVectorDb>, CapabilityStore) {
    let db = Arc::new(MemoryVectorDb::new("capabilities"));
    let store: CapabilityStore = EntityStore::new(db.clone() as Arc<dyn VectorDb>, embedder());
    store.initialize().await.unwrap();
    store
        .store_data(&Capability {
            id: Capability::id_for(AZURE_DB),
            resource_name: AZURE_DB.into(),
            api_version: Some("dbforpostgresql.azure.upbound.io/v1beta1".into()),
            group: Some("dbforpostgresql.azure.upbound.io".into()),
            capabilities: vec!["postgresql".into(), "database".into()],
            providers: vec!["azure".into()],
            abstractions: vec!["managed service".into()],
            complexity: Complexity::Medium,
            description: "Azure Database for PostgreSQL flexible server".into(),
            use_case: "managed postgresql database".into(),
            confidence: 0.9,
            analyzed_at: Utc::now(),
        })
        .await
        .unwrap();
    (db, store)
}

async fn pattern_store() -> PatternStore {
    let db = Arc::new(MemoryVectorDb::new("patterns"));
    let store: PatternStore = EntityStore::new(db as Arc<dyn VectorDb>, embedder());
    store.initialize().await.unwrap();
    store
        .store_data(&Pattern {
            id: "azure-resource-group".into(),
            description: "Azure resources live in a resource group".into(),
            triggers: vec!["azure".into(), "postgresql".into()],
            suggested_resources: vec![AZURE_RG.into()],
            rationale: "Every Azure resource needs a resource group".into(),
            created_at: Utc::now(),
            created_by: "platform-team".into(),
        })
        .await
        .unwrap();
    store
}

fn solution_json() -> String {
    format!(
        r#"Here is my recommendation:
```json
{{"solutions":[{{"type":"single","resources":[{{"kind":"FlexibleServer","resourceName":"{AZURE_DB}"}}],
  "score":92,"description":"Managed PostgreSQL on Azure","reasons":["fully managed"],
  "analysis":"fits the intent","patternInfluences":[],"usedPatterns":false}}]}}
```"#
    )
}

const QUESTIONS: &str = r#"{"required":[{"id":"name","question":"Server name?","type":"text"},
  {"id":"namespace","question":"Which namespace?","type":"text"}],
 "basic":[{"id":"storage-class","question":"Storage class?","type":"text"}],
 "advanced":[],
 "open":{"question":"Anything else?","placeholder":"..."}}"#;

fn recommender(llm: Arc<ScriptedLlm>, caps: CapabilityStore, cluster: Arc<FakeCluster>) -> ResourceRecommender {
    ResourceRecommender::new(llm, caps, cluster, RecommenderConfig::default())
}

#[tokio::test]
async fn azure_pattern_resource_is_injected() {
    let (_, caps) = capability_store().await;
    let llm = Arc::new(ScriptedLlm::new(&solution_json(), Some(QUESTIONS)));
    let cluster = Arc::new(FakeCluster::default());
    let rec = recommender(llm.clone(), caps, cluster.clone())
        .with_pattern_store(Some(pattern_store().await));

    let outcome = rec
        .find_best_solutions("postgresql database on azure")
        .await
        .unwrap();

    assert_eq!(outcome.solutions.len(), 1);
    let s = &outcome.solutions[0];
    assert_eq!(s.score, 92.0);
    assert!(s.used_patterns);
    assert_eq!(s.resources.len(), 2);
    assert_eq!(s.resources[0].resource_name, AZURE_DB);
    assert_eq!(s.resources[0].group, "dbforpostgresql.azure.upbound.io");

    let rg = &s.resources[1];
    assert_eq!(rg.resource_name, AZURE_RG);
    assert_eq!(rg.kind, "resourcegroups");
    assert_eq!(rg.group, "azure.upbound.io");
    assert_eq!(rg.capabilities.providers, vec!["azure"]);
    assert_eq!(rg.capabilities.pattern_id.as_deref(), Some("azure-resource-group"));

    // both resources had their schema fetched
    assert_eq!(cluster.explained.load(Ordering::SeqCst), 2);

    let q = &s.questions;
    assert_eq!(q.required.len(), 2);
    assert_eq!(q.required[1].options, vec!["default", "prod"]);
    assert_eq!(q.required[1].kind, QuestionType::Select);
    // storage classes failed to list, so the question stays free text
    assert!(q.basic[0].options.is_empty());
    assert_eq!(q.open.question, "Anything else?");

    assert_eq!(outcome.usage, LlmUsage::new(150, 60));
    assert_eq!(llm.calls(), 2);
    assert!(llm.prompts.lock().unwrap()[0].contains("azure-resource-group"));
}

#[tokio::test]
async fn braces_in_leading_prose_do_not_hide_fenced_solutions() {
    let (_, caps) = capability_store().await;
    let raw = format!("I weighed {{FlexibleServer, Server}} first.\n{}", solution_json());
    let llm = Arc::new(ScriptedLlm::new(&raw, Some(QUESTIONS)));
    let rec = recommender(llm, caps, Arc::new(FakeCluster::default()));

    let outcome = rec
        .find_best_solutions("postgresql database on azure")
        .await
        .unwrap();

    assert_eq!(outcome.solutions.len(), 1);
    assert_eq!(outcome.solutions[0].resources[0].resource_name, AZURE_DB);
}

#[tokio::test]
async fn invalid_solution_json_is_reported() {
    let (_, caps) = capability_store().await;
    let raw = "{\n  // best choice\n  \"solutions\": []\n}";
    let llm = Arc::new(ScriptedLlm::new(raw, Some(QUESTIONS)));
    let rec = recommender(llm.clone(), caps, Arc::new(FakeCluster::default()));

    let err = rec
        .find_best_solutions("postgresql database on azure")
        .await
        .unwrap_err();

    let msg = err.to_string();
    assert!(msg.starts_with("Failed to parse AI solution response"), "{msg}");
    assert!(msg.contains("// best choice"));
    assert!(msg.contains(AZURE_DB));
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn question_failure_falls_back_to_open_question() {
    let (_, caps) = capability_store().await;
    let llm = Arc::new(ScriptedLlm::new(&solution_json(), None));
    let rec = recommender(llm, caps, Arc::new(FakeCluster::default()));

    let outcome = rec
        .find_best_solutions("postgresql database on azure")
        .await
        .unwrap();

    let s = &outcome.solutions[0];
    assert!(!s.used_patterns);
    assert_eq!(s.resources.len(), 1);
    assert_eq!(s.questions, QuestionGroup::fallback());
    assert_eq!(
        s.questions.open.question,
        "Is there anything else about your requirements or constraints that would help us provide better recommendations?"
    );
}

#[tokio::test]
async fn unparseable_questions_fall_back_too() {
    let (_, caps) = capability_store().await;
    let llm = Arc::new(ScriptedLlm::new(&solution_json(), Some("Sorry, no questions.")));
    let rec = recommender(llm, caps, Arc::new(FakeCluster::default()));

    let outcome = rec
        .find_best_solutions("postgresql database on azure")
        .await
        .unwrap();
    assert_eq!(outcome.solutions[0].questions, QuestionGroup::fallback());
    assert_eq!(outcome.usage, LlmUsage::new(150, 60));
}

#[tokio::test]
async fn uninitialized_llm_fails_before_any_search() {
    let (db, caps) = capability_store().await;
    let before = db.calls();
    let mut llm = ScriptedLlm::new(&solution_json(), Some(QUESTIONS));
    llm.initialized = false;
    let rec = recommender(Arc::new(llm), caps, Arc::new(FakeCluster::default()));

    let err = rec.find_best_solutions("postgres").await.unwrap_err();
    assert!(matches!(err, RecommendError::Config(_)));
    assert!(err.to_string().contains("AI provider is not initialized"));
    assert_eq!(db.calls(), before);
}

#[tokio::test]
async fn schema_failures_partial_ok_total_fatal() {
    let (_, caps) = capability_store().await;

    let partial = Arc::new(FakeCluster::failing(&[AZURE_RG]));
    let rec = recommender(
        Arc::new(ScriptedLlm::new(&solution_json(), Some(QUESTIONS))),
        caps.clone(),
        partial,
    )
    .with_pattern_store(Some(pattern_store().await));
    assert!(rec.find_best_solutions("postgresql database on azure").await.is_ok());

    let total = Arc::new(FakeCluster::failing(&[AZURE_DB]));
    let rec = recommender(
        Arc::new(ScriptedLlm::new(&solution_json(), Some(QUESTIONS))),
        caps,
        total,
    );
    let err = rec
        .find_best_solutions("postgresql database on azure")
        .await
        .unwrap_err();
    assert!(matches!(err, RecommendError::SchemaFetch { failed: 1, .. }));
}

#[tokio::test]
async fn missing_resource_name_fails_loudly() {
    let (_, caps) = capability_store().await;
    let raw = r#"{"solutions":[{"type":"single","resources":[{"kind":"Mystery"}],"score":50}]}"#;
    let cluster = Arc::new(FakeCluster::default());
    let rec = recommender(
        Arc::new(ScriptedLlm::new(raw, Some(QUESTIONS))),
        caps,
        cluster.clone(),
    );

    let err = rec.find_best_solutions("postgresql database").await.unwrap_err();
    assert!(matches!(err, RecommendError::MissingResourceName { ref kind } if kind == "Mystery"));
    assert_eq!(cluster.explained.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unavailable_embeddings_fail_capability_search() {
    let db = Arc::new(MemoryVectorDb::new("capabilities"));
    let caps: CapabilityStore = EntityStore::new(
        db.clone() as Arc<dyn VectorDb>,
        Arc::new(StaticEmbedder::unavailable()),
    );
    let llm = Arc::new(ScriptedLlm::new(&solution_json(), Some(QUESTIONS)));
    let rec = recommender(llm.clone(), caps, Arc::new(FakeCluster::default()));

    let err = rec.find_best_solutions("postgresql").await.unwrap_err();
    assert!(err.to_string().contains("embedding service not available"));
    assert_eq!(db.calls(), 0);
    assert_eq!(llm.calls(), 0);
}
