//! The recommendation pipeline.
//!
//! 1. capability search (required) and pattern search (best-effort), concurrently
//! 2. cluster inventory enrichment of the candidates (best-effort)
//! 3. solution assembly by the model (required)
//! 4. pattern resource injection
//! 5. per solution: schema lookup (required), then question generation
//!    (best-effort, falls back to a single open question)

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use ai_llm_service::LlmUsage;
use futures::future::join_all;
use knowledge_store::{CapabilityStore, Pattern, PatternStore, PolicyIntent, PolicyStore};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::candidates::{
    enrich_with_inventory, from_capability_hits, inject_pattern_resources, reconcile_resource,
};
use crate::cluster::{ClusterDiscovery, ClusterOptions, ResourceInventory, discover_options};
use crate::config::RecommenderConfig;
use crate::error::{RecommendError, Result, excerpt};
use crate::json_extract::parse_json_object;
use crate::llm::LlmClient;
use crate::prompt::{QUESTION_SYSTEM, SOLUTION_SYSTEM, question_prompt, solution_prompt};
use crate::prompt_dump::PromptDump;
use crate::questions::{inject_cluster_options, parse_question_group};
use crate::schema::fetch_schemas;
use crate::stage::Stage;
use crate::types::{
    PatternInfluence, QuestionGroup, RecommendationOutcome, ResourceCandidate, ResourceSolution,
    SolutionType,
};

/// Raw-response chars kept in a parse error.
const ERROR_EXCERPT_CHARS: usize = 500;

#[derive(Deserialize)]
struct SolutionEnvelope {
    #[serde(default)]
    solutions: Vec<RawSolution>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSolution {
    #[serde(default, rename = "type")]
    solution_type: SolutionType,
    #[serde(default)]
    resources: Vec<ResourceCandidate>,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    description: String,
    #[serde(default)]
    reasons: Vec<String>,
    #[serde(default)]
    analysis: String,
    #[serde(default)]
    pattern_influences: Vec<PatternInfluence>,
    #[serde(default)]
    used_patterns: bool,
}

fn solution_parse_error(reason: String, raw: &str, candidates: &[ResourceCandidate]) -> RecommendError {
    RecommendError::SolutionParse {
        reason,
        excerpt: excerpt(raw, ERROR_EXCERPT_CHARS),
        candidates: candidates.iter().map(|c| c.resource_name.clone()).collect(),
    }
}

/// Parses the model's solution list, completing resources from `candidates`.
///
/// Order is kept as returned; scores are clamped to `0..=100`.
///
/// # Errors
/// [`RecommendError::SolutionParse`] when no JSON object is found, it does not
/// parse, or it lists no solutions.
pub fn parse_solutions(raw: &str, candidates: &[ResourceCandidate]) -> Result<Vec<ResourceSolution>> {
    let envelope: SolutionEnvelope =
        parse_json_object(raw).map_err(|reason| solution_parse_error(reason, raw, candidates))?;
    if envelope.solutions.is_empty() {
        return Err(solution_parse_error(
            "response contained no solutions".to_string(),
            raw,
            candidates,
        ));
    }

    Ok(envelope
        .solutions
        .into_iter()
        .map(|s| ResourceSolution {
            solution_type: s.solution_type,
            resources: s
                .resources
                .into_iter()
                .map(|r| reconcile_resource(r, candidates))
                .collect(),
            score: s.score.clamp(0.0, 100.0),
            description: s.description,
            reasons: s.reasons,
            analysis: s.analysis,
            pattern_influences: s.pattern_influences,
            used_patterns: s.used_patterns,
            questions: QuestionGroup::fallback(),
        })
        .collect())
}

/// Turns an intent into ranked resource solutions with question sets.
///
/// Holds no per-call state; one instance serves concurrent requests.
pub struct ResourceRecommender {
    llm: Arc<dyn LlmClient>,
    capabilities: CapabilityStore,
    patterns: Option<PatternStore>,
    policies: Option<PolicyStore>,
    discovery: Arc<dyn ClusterDiscovery>,
    dump: PromptDump,
    cfg: RecommenderConfig,
}

impl ResourceRecommender {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        capabilities: CapabilityStore,
        discovery: Arc<dyn ClusterDiscovery>,
        cfg: RecommenderConfig,
    ) -> Self {
        let dump = PromptDump::new(cfg.debug, cfg.debug_dir.clone());
        if dump.is_enabled() {
            info!(dir = %cfg.debug_dir.display(), "recommender debug dumps enabled");
        }
        Self {
            llm,
            capabilities,
            patterns: None,
            policies: None,
            discovery,
            dump,
            cfg,
        }
    }

    /// `None` means the pattern store could not be reached at startup; pattern
    /// search then contributes nothing.
    pub fn with_pattern_store(mut self, store: Option<PatternStore>) -> Self {
        if store.is_none() {
            warn!("pattern store unavailable; recommendations will not use organizational patterns");
        }
        self.patterns = store;
        self
    }

    /// `None` means questions are generated without policy context.
    pub fn with_policy_store(mut self, store: Option<PolicyStore>) -> Self {
        if store.is_none() {
            warn!("policy store unavailable; questions will not use organizational policies");
        }
        self.policies = store;
        self
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.cfg
    }

    /// Runs the full pipeline for `intent`.
    ///
    /// # Errors
    /// - [`RecommendError::EmptyIntent`] / [`RecommendError::Config`] before any I/O
    /// - capability search, solution assembly or schema lookup failures
    #[instrument(skip_all, fields(intent_len = intent.len()))]
    pub async fn find_best_solutions(&self, intent: &str) -> Result<RecommendationOutcome> {
        let intent = intent.trim();
        if intent.is_empty() {
            return Err(RecommendError::EmptyIntent);
        }
        if !self.llm.is_initialized() {
            return Err(RecommendError::Config(
                "AI provider is not initialized; set LLM_KIND and its API key".to_string(),
            ));
        }
        let started = Instant::now();
        let mut usage = LlmUsage::default();

        let (capability_hits, patterns) = tokio::join!(
            self.capabilities
                .search_capabilities(intent, self.cfg.capability_limit),
            self.search_patterns(intent),
        );
        let capability_hits = Stage::CapabilitySearch.resolve(capability_hits, Vec::new)?;
        let mut candidates = from_capability_hits(&capability_hits);
        if candidates.is_empty() {
            return Err(RecommendError::NoCapabilities(intent.to_string()));
        }

        let inventory = Stage::ClusterInventory.resolve(
            self.discovery.discover_resources().await,
            ResourceInventory::default,
        )?;
        let verified = enrich_with_inventory(&mut candidates, &inventory);
        debug!(
            candidates = candidates.len(),
            verified,
            patterns = patterns.len(),
            "knowledge gathered"
        );

        let mut solutions = Stage::SolutionAssembly.resolve(
            self.assemble_solutions(intent, &candidates, &patterns, &mut usage)
                .await,
            Vec::new,
        )?;
        for s in &mut solutions {
            let added = inject_pattern_resources(s, &patterns);
            if added > 0 {
                debug!(added, "pattern resources injected");
            }
        }

        let (policies, options) = tokio::join!(
            self.search_policies(intent),
            discover_options(self.discovery.as_ref()),
        );

        let completed = join_all(
            solutions
                .into_iter()
                .enumerate()
                .map(|(i, s)| self.complete_solution(i, intent, s, &policies, &options)),
        )
        .await;

        let mut out = Vec::with_capacity(completed.len());
        for result in completed {
            let (solution, u) = result?;
            usage += u;
            out.push(solution);
        }

        info!(
            solutions = out.len(),
            candidates = candidates.len(),
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            latency_ms = started.elapsed().as_millis(),
            "recommendation complete"
        );
        Ok(RecommendationOutcome {
            solutions: out,
            usage,
        })
    }

    async fn search_patterns(&self, intent: &str) -> Vec<Pattern> {
        let Some(store) = &self.patterns else {
            return Vec::new();
        };
        let hits = store.search_patterns(intent, self.cfg.pattern_limit).await;
        Stage::PatternSearch
            .resolve(hits, Vec::new)
            .unwrap_or_default()
            .into_iter()
            .map(|h| h.data)
            .collect()
    }

    async fn search_policies(&self, intent: &str) -> Vec<PolicyIntent> {
        let Some(store) = &self.policies else {
            return Vec::new();
        };
        let hits = store
            .search_policy_intents(intent, self.cfg.policy_limit)
            .await;
        Stage::PolicySearch
            .resolve(hits, Vec::new)
            .unwrap_or_default()
            .into_iter()
            .map(|h| h.data)
            .collect()
    }

    async fn assemble_solutions(
        &self,
        intent: &str,
        candidates: &[ResourceCandidate],
        patterns: &[Pattern],
        usage: &mut LlmUsage,
    ) -> Result<Vec<ResourceSolution>> {
        let prompt = solution_prompt(intent, candidates, patterns);
        self.dump.prompt("solution", SOLUTION_SYSTEM, &prompt);

        let started = Instant::now();
        let resp = self.llm.send_message(&prompt, Some(SOLUTION_SYSTEM)).await?;
        *usage += resp.usage;
        self.dump.response("solution", &resp.content);
        debug!(
            latency_ms = started.elapsed().as_millis(),
            input_tokens = resp.usage.input_tokens,
            output_tokens = resp.usage.output_tokens,
            "solution response received"
        );

        parse_solutions(&resp.content, candidates)
    }

    async fn complete_solution(
        &self,
        index: usize,
        intent: &str,
        mut solution: ResourceSolution,
        policies: &[PolicyIntent],
        options: &ClusterOptions,
    ) -> Result<(ResourceSolution, LlmUsage)> {
        let schemas = Stage::SchemaEnrichment.resolve(
            fetch_schemas(self.discovery.as_ref(), &solution.resources).await,
            BTreeMap::new,
        )?;

        let mut usage = LlmUsage::default();
        let questions = self
            .generate_questions(index, intent, &solution, &schemas, options, policies, &mut usage)
            .await;
        solution.questions = Stage::QuestionGeneration.resolve(questions, QuestionGroup::fallback)?;
        Ok((solution, usage))
    }

    #[allow(clippy::too_many_arguments)]
    async fn generate_questions(
        &self,
        index: usize,
        intent: &str,
        solution: &ResourceSolution,
        schemas: &BTreeMap<String, String>,
        options: &ClusterOptions,
        policies: &[PolicyIntent],
        usage: &mut LlmUsage,
    ) -> Result<QuestionGroup> {
        let stage = format!("questions-{index}");
        let prompt = question_prompt(intent, solution, schemas, options, policies);
        self.dump.prompt(&stage, QUESTION_SYSTEM, &prompt);

        let resp = self.llm.send_message(&prompt, Some(QUESTION_SYSTEM)).await?;
        *usage += resp.usage;
        self.dump.response(&stage, &resp.content);

        let mut group = parse_question_group(&resp.content)?;
        let injected = inject_cluster_options(&mut group, options);
        debug!(
            solution = index,
            questions = group.len(),
            injected,
            "questions generated"
        );
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_clamps_scores_and_keeps_order() {
        let raw = r#"```json
{"solutions":[
  {"type":"single","resources":[{"resourceName":"sqls.devopstoolkit.live"}],"score":140,"description":"A"},
  {"type":"combination","resources":[{"resourceName":"deployments.apps"},{"resourceName":"services"}],"score":-3,"description":"B"}
]}
```
These are my picks."#;
        let s = parse_solutions(raw, &[]).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].description, "A");
        assert_eq!(s[0].score, 100.0);
        assert_eq!(s[1].score, 0.0);
        assert_eq!(s[1].resources[1].api_version, "v1");
        assert_eq!(s[0].questions, QuestionGroup::fallback());
    }

    #[test]
    fn empty_solution_list_is_a_parse_error() {
        let err = parse_solutions("{\"solutions\": []}", &[]).unwrap_err();
        assert!(err.to_string().contains("response contained no solutions"));
    }
}
