//! Solution and question shapes returned to callers (camelCase on the wire).

use ai_llm_service::LlmUsage;
use knowledge_store::Complexity;
use serde::{Deserialize, Serialize};

/// Capability metadata attached to a candidate resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityMeta {
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default)]
    pub abstractions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Search score of the capability hit that produced this candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f32>,
    /// Set when the resource was added by a pattern rather than the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<String>,
}

/// A resource type considered for a solution.
///
/// Standard resources and CRDs share this shape. `resource_name` is the
/// plural, group-qualified name and the schema lookup key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCandidate {
    #[serde(default)]
    pub kind: String,
    /// Empty for the core API group.
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub resource_name: String,
    #[serde(default = "default_namespaced")]
    pub namespaced: bool,
    #[serde(default)]
    pub capabilities: CapabilityMeta,
}

fn default_namespaced() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolutionType {
    #[default]
    Single,
    Combination,
}

/// How a stored pattern shaped a solution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternInfluence {
    #[serde(default)]
    pub pattern_id: String,
    #[serde(default)]
    pub description: String,
    /// `high`, `medium` or `low` as judged by the model; `injected` when added
    /// deterministically.
    #[serde(default)]
    pub influence: String,
    #[serde(default)]
    pub matched_triggers: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Text,
    Select,
    Multiselect,
    Boolean,
    Number,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionValidation {
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub question: String,
    #[serde(default, rename = "type")]
    pub kind: QuestionType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<QuestionValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_answer: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenQuestion {
    pub question: String,
    #[serde(default)]
    pub placeholder: String,
}

pub const FALLBACK_OPEN_QUESTION: &str = "Is there anything else about your requirements or constraints that would help us provide better recommendations?";
pub const FALLBACK_OPEN_PLACEHOLDER: &str =
    "e.g., specific security requirements, performance needs, existing infrastructure constraints...";

impl Default for OpenQuestion {
    fn default() -> Self {
        Self {
            question: FALLBACK_OPEN_QUESTION.to_string(),
            placeholder: FALLBACK_OPEN_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionGroup {
    #[serde(default)]
    pub required: Vec<Question>,
    #[serde(default)]
    pub basic: Vec<Question>,
    #[serde(default)]
    pub advanced: Vec<Question>,
    #[serde(default)]
    pub open: OpenQuestion,
}

impl QuestionGroup {
    /// The set used when question generation fails: only the open question.
    pub fn fallback() -> Self {
        Self::default()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Question> {
        self.required
            .iter_mut()
            .chain(self.basic.iter_mut())
            .chain(self.advanced.iter_mut())
    }

    pub fn len(&self) -> usize {
        self.required.len() + self.basic.len() + self.advanced.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One ranked recommendation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSolution {
    #[serde(rename = "type")]
    pub solution_type: SolutionType,
    pub resources: Vec<ResourceCandidate>,
    /// 0..=100
    pub score: f64,
    pub description: String,
    pub reasons: Vec<String>,
    pub analysis: String,
    pub pattern_influences: Vec<PatternInfluence>,
    pub used_patterns: bool,
    pub questions: QuestionGroup,
}

impl ResourceSolution {
    pub fn has_resource(&self, resource_name: &str) -> bool {
        self.resources
            .iter()
            .any(|r| r.resource_name.eq_ignore_ascii_case(resource_name))
    }
}

/// Result of one recommendation call.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationOutcome {
    pub solutions: Vec<ResourceSolution>,
    /// Summed over every model call made for this intent.
    pub usage: LlmUsage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_has_only_open_question() {
        let q = QuestionGroup::fallback();
        assert!(q.is_empty());
        assert_eq!(q.open.question, FALLBACK_OPEN_QUESTION);
    }

    #[test]
    fn question_group_parses_with_defaults() {
        let q: QuestionGroup = serde_json::from_str(
            r#"{"required":[{"id":"name","question":"Name?","type":"text"}],
                "basic":[{"id":"replicas","question":"Replicas?","type":"number",
                          "validation":{"required":true,"min":1}}]}"#,
        )
        .unwrap();
        assert_eq!(q.len(), 2);
        assert_eq!(q.basic[0].kind, QuestionType::Number);
        assert_eq!(q.open, OpenQuestion::default());
    }

    #[test]
    fn solution_serializes_camel_case() {
        let s = ResourceSolution {
            solution_type: SolutionType::Combination,
            used_patterns: true,
            ..Default::default()
        };
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["type"], "combination");
        assert_eq!(v["usedPatterns"], true);
        assert!(v.get("patternInfluences").is_some());
    }
}
