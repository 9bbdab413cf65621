//! Organizational deployment patterns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::errors::Result;
use crate::record::SearchOptions;
use crate::store::{EntityHit, EntityStore};

/// A reusable recommendation: when an intent matches `triggers`, the listed
/// resources should be part of the solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub triggers: Vec<String>,
    /// Resource names (`kind.group` or core plural) to include.
    #[serde(default)]
    pub suggested_resources: Vec<String>,
    #[serde(default)]
    pub rationale: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
}

impl Entity for Pattern {
    const KIND: &'static str = "pattern";

    fn extract_id(&self) -> &str {
        &self.id
    }

    fn to_search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.description,
            self.triggers.join(" "),
            self.suggested_resources.join(" "),
            self.rationale
        )
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

pub type PatternStore = EntityStore<Pattern>;

impl EntityStore<Pattern> {
    pub async fn search_patterns(
        &self,
        intent: &str,
        limit: usize,
    ) -> Result<Vec<EntityHit<Pattern>>> {
        self.search_data(intent, SearchOptions::with_limit(limit))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_text_includes_triggers_and_resources() {
        let p = Pattern {
            id: "p1".into(),
            description: "Azure stateful apps".into(),
            triggers: vec!["azure database".into()],
            suggested_resources: vec!["resourcegroups.azure.upbound.io".into()],
            rationale: "Group resources".into(),
            created_at: Utc::now(),
            created_by: "platform-team".into(),
        };
        let text = p.to_search_text();
        assert!(text.contains("azure database"));
        assert!(text.contains("resourcegroups.azure.upbound.io"));
        assert!(!text.contains("  "));
    }
}
