use ai_llm_service::HealthStatus;
use knowledge_store::EmbeddingStatus;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionHealth {
    pub name: String,
    pub ok: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `true` when the vector DB answers and a chat model is configured.
    pub healthy: bool,
    pub vector_db: Vec<CollectionHealth>,
    pub embedding: EmbeddingStatus,
    pub llm_initialized: bool,
    pub llm: Vec<HealthStatus>,
}
