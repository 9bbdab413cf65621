//! Policy intents: organizational rules that shape generated questions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::errors::Result;
use crate::record::SearchOptions;
use crate::store::{EntityHit, EntityStore};

/// A cluster policy generated from this intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedPolicyReference {
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyIntent {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub rationale: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub deployed_policies: Vec<DeployedPolicyReference>,
}

impl Entity for PolicyIntent {
    const KIND: &'static str = "policy";

    fn extract_id(&self) -> &str {
        &self.id
    }

    fn to_search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.description,
            self.triggers.join(" "),
            self.rationale
        )
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

pub type PolicyStore = EntityStore<PolicyIntent>;

impl EntityStore<PolicyIntent> {
    pub async fn search_policy_intents(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<EntityHit<PolicyIntent>>> {
        self.search_data(query, SearchOptions::with_limit(limit))
            .await
    }
}
