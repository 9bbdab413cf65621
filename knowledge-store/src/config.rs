//! Vector DB and collection configuration.

use crate::errors::{KnowledgeError, Result};

pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;
pub const DEFAULT_KEYWORD_SCAN_LIMIT: usize = 1000;

pub const DEFAULT_CAPABILITIES_COLLECTION: &str = "capabilities";
pub const DEFAULT_PATTERNS_COLLECTION: &str = "patterns";
pub const DEFAULT_POLICIES_COLLECTION: &str = "policies";

/// Connection + collection settings for one [`crate::QdrantVectorDb`].
#[derive(Clone, Debug)]
pub struct VectorDbConfig {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub url: String,
    /// Optional API key for Qdrant Cloud.
    pub api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Max payloads scanned by keyword search.
    pub keyword_scan_limit: usize,
}

impl VectorDbConfig {
    pub fn new(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            collection: collection.into(),
            keyword_scan_limit: DEFAULT_KEYWORD_SCAN_LIMIT,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(KnowledgeError::Config("qdrant url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(KnowledgeError::Config("collection is empty".into()));
        }
        if self.keyword_scan_limit == 0 {
            return Err(KnowledgeError::Config(
                "keyword_scan_limit must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Settings shared by the capability, pattern and policy stores.
#[derive(Clone, Debug)]
pub struct KnowledgeConfig {
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub capabilities_collection: String,
    pub patterns_collection: String,
    pub policies_collection: String,
    pub keyword_scan_limit: usize,
    /// Expected embedding dimensionality; validated against provider output.
    pub embedding_dim: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            qdrant_url: DEFAULT_QDRANT_URL.into(),
            qdrant_api_key: None,
            capabilities_collection: DEFAULT_CAPABILITIES_COLLECTION.into(),
            patterns_collection: DEFAULT_PATTERNS_COLLECTION.into(),
            policies_collection: DEFAULT_POLICIES_COLLECTION.into(),
            keyword_scan_limit: DEFAULT_KEYWORD_SCAN_LIMIT,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
        }
    }
}

impl KnowledgeConfig {
    /// Reads `QDRANT_*` and `EMBEDDING_DIM`, falling back to defaults.
    ///
    /// # Errors
    /// [`KnowledgeError::Config`] when a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            qdrant_url: env_or("QDRANT_URL", d.qdrant_url),
            qdrant_api_key: env_opt("QDRANT_API_KEY"),
            capabilities_collection: env_or(
                "QDRANT_CAPABILITIES_COLLECTION",
                d.capabilities_collection,
            ),
            patterns_collection: env_or("QDRANT_PATTERNS_COLLECTION", d.patterns_collection),
            policies_collection: env_or("QDRANT_POLICIES_COLLECTION", d.policies_collection),
            keyword_scan_limit: env_usize("QDRANT_KEYWORD_SCAN_LIMIT", d.keyword_scan_limit)?,
            embedding_dim: env_usize("EMBEDDING_DIM", d.embedding_dim)?,
        })
    }

    /// Per-collection config for the given collection name.
    pub fn vector_db(&self, collection: &str) -> VectorDbConfig {
        VectorDbConfig {
            url: self.qdrant_url.clone(),
            api_key: self.qdrant_api_key.clone(),
            collection: collection.to_string(),
            keyword_scan_limit: self.keyword_scan_limit,
        }
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(name: &str, default: String) -> String {
    env_opt(name).unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> Result<usize> {
    match env_opt(name) {
        Some(v) => v
            .trim()
            .parse::<usize>()
            .map_err(|_| KnowledgeError::Config(format!("{name} must be a positive integer"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_db_config_inherits_shared_settings() {
        let cfg = KnowledgeConfig {
            qdrant_api_key: Some("k".into()),
            keyword_scan_limit: 50,
            ..KnowledgeConfig::default()
        };
        let v = cfg.vector_db(&cfg.patterns_collection);
        assert_eq!(v.collection, "patterns");
        assert_eq!(v.keyword_scan_limit, 50);
        assert_eq!(v.api_key.as_deref(), Some("k"));
        assert!(v.validate().is_ok());
    }

    #[test]
    fn empty_collection_is_rejected() {
        let v = VectorDbConfig::new(DEFAULT_QDRANT_URL, " ");
        assert!(v.validate().is_err());
    }
}
