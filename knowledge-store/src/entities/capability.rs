//! Analyzed capabilities of cluster resource types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::errors::Result;
use crate::record::SearchOptions;
use crate::store::{EntityHit, EntityStore};

/// Rough operator effort to adopt a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        }
    }
}

/// What a resource type (e.g. `sqls.devopstoolkit.live`) can do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    pub id: String,
    /// Plural, group-qualified name (`deployments.apps`, `services`).
    pub resource_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default)]
    pub abstractions: Vec<String>,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub use_case: String,
    /// Analyzer confidence in `[0, 1]`.
    #[serde(default)]
    pub confidence: f64,
    pub analyzed_at: DateTime<Utc>,
}

impl Capability {
    /// Stable id derived from the resource name, so re-analysis overwrites.
    pub fn id_for(resource_name: &str) -> String {
        format!("capability-{}", resource_name.trim().to_lowercase())
    }
}

impl Entity for Capability {
    const KIND: &'static str = "capability";

    fn extract_id(&self) -> &str {
        &self.id
    }

    fn to_search_text(&self) -> String {
        [
            self.resource_name.clone(),
            self.capabilities.join(" "),
            self.providers.join(" "),
            self.abstractions.join(" "),
            self.complexity.as_str().to_string(),
            self.description.clone(),
            self.use_case.clone(),
        ]
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

pub type CapabilityStore = EntityStore<Capability>;

impl EntityStore<Capability> {
    /// Hybrid search over capabilities for a user intent.
    pub async fn search_capabilities(
        &self,
        intent: &str,
        limit: usize,
    ) -> Result<Vec<EntityHit<Capability>>> {
        self.search_data(intent, SearchOptions::with_limit(limit))
            .await
    }

    /// Case-insensitive lookup by `resourceName` (full enumeration).
    pub async fn find_by_resource_name(&self, resource_name: &str) -> Result<Option<Capability>> {
        let wanted = resource_name.trim();
        Ok(self
            .get_all_data(None)
            .await?
            .into_iter()
            .find(|c| c.resource_name.eq_ignore_ascii_case(wanted)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_text_skips_empty_fields() {
        let c = Capability {
            id: Capability::id_for("Services"),
            resource_name: "services".into(),
            api_version: Some("v1".into()),
            group: None,
            capabilities: vec!["networking".into(), "load balancing".into()],
            providers: vec!["kubernetes".into()],
            abstractions: vec![],
            complexity: Complexity::Low,
            description: "Expose pods".into(),
            use_case: String::new(),
            confidence: 0.9,
            analyzed_at: Utc::now(),
        };
        assert_eq!(c.id, "capability-services");
        assert_eq!(
            c.to_search_text(),
            "services networking load balancing kubernetes low Expose pods"
        );
    }

    #[test]
    fn payload_round_trip_uses_document_id() {
        let c = Capability {
            id: "cap-1".into(),
            resource_name: "sqls.devopstoolkit.live".into(),
            api_version: None,
            group: Some("devopstoolkit.live".into()),
            capabilities: vec!["postgresql".into()],
            providers: vec!["aws".into()],
            abstractions: vec!["database".into()],
            complexity: Complexity::High,
            description: "Managed SQL".into(),
            use_case: "databases".into(),
            confidence: 0.8,
            analyzed_at: Utc::now(),
        };
        let mut payload = c.to_payload().unwrap();
        payload.remove("id");
        let back = Capability::from_payload("cap-1", &payload).unwrap();
        assert_eq!(back, c);
    }
}
