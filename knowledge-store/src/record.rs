//! Document and search-result records exchanged with the vector DB.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON object stored next to a vector.
pub type Payload = Map<String, Value>;

/// Opaque document as stored in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorDocument {
    /// Caller-facing id (arbitrary string).
    pub id: String,
    /// Dense vector; length equals the collection dimensionality when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    pub payload: Payload,
}

/// How a search hit was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Semantic,
    Keyword,
    /// Found by both the vector and keyword legs.
    Hybrid,
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    /// Non-negative relevance score.
    pub score: f32,
    pub payload: Payload,
    pub match_type: MatchType,
}

/// Caller options for searches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub limit: usize,
    /// Hits scoring below this are dropped.
    pub score_threshold: f32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            score_threshold: 0.0,
        }
    }
}

impl SearchOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}

/// Summary of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionInfo {
    pub points_count: u64,
    /// Vector size, when the backend reports it.
    pub dimensions: Option<usize>,
}
