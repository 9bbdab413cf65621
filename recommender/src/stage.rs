//! Per-stage degradation policy.
//!
//! Every pipeline stage is either `Required` (its error ends the call) or
//! `BestEffort` (its error is logged and a fallback value is used). The
//! pipeline consults [`Stage::resolve`] instead of deciding ad hoc.

use tracing::warn;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePolicy {
    Required,
    BestEffort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CapabilitySearch,
    PatternSearch,
    ClusterInventory,
    SolutionAssembly,
    SchemaEnrichment,
    PolicySearch,
    ClusterOptions,
    QuestionGeneration,
}

impl Stage {
    pub const fn policy(self) -> StagePolicy {
        match self {
            Stage::CapabilitySearch | Stage::SolutionAssembly | Stage::SchemaEnrichment => {
                StagePolicy::Required
            }
            Stage::PatternSearch
            | Stage::ClusterInventory
            | Stage::PolicySearch
            | Stage::ClusterOptions
            | Stage::QuestionGeneration => StagePolicy::BestEffort,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Stage::CapabilitySearch => "capability_search",
            Stage::PatternSearch => "pattern_search",
            Stage::ClusterInventory => "cluster_inventory",
            Stage::SolutionAssembly => "solution_assembly",
            Stage::SchemaEnrichment => "schema_enrichment",
            Stage::PolicySearch => "policy_search",
            Stage::ClusterOptions => "cluster_options",
            Stage::QuestionGeneration => "question_generation",
        }
    }

    /// Applies this stage's policy to `result`.
    ///
    /// `Required` propagates the error; `BestEffort` logs it and returns
    /// `fallback()`.
    pub fn resolve<T, E>(self, result: std::result::Result<T, E>, fallback: impl FnOnce() -> T) -> Result<T>
    where
        E: Into<crate::error::RecommendError>,
    {
        match (result, self.policy()) {
            (Ok(v), _) => Ok(v),
            (Err(e), StagePolicy::Required) => Err(e.into()),
            (Err(e), StagePolicy::BestEffort) => {
                let e = e.into();
                warn!(stage = self.name(), error = %e, "best-effort stage failed; continuing without it");
                Ok(fallback())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecommendError;

    #[test]
    fn best_effort_uses_fallback() {
        let r: std::result::Result<Vec<u8>, RecommendError> =
            Err(RecommendError::Cluster("kubectl missing".into()));
        assert_eq!(Stage::PolicySearch.resolve(r, Vec::new).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn required_propagates() {
        let r: std::result::Result<u8, RecommendError> = Err(RecommendError::EmptyIntent);
        let err = Stage::CapabilitySearch.resolve(r, || 0).unwrap_err();
        assert!(matches!(err, RecommendError::EmptyIntent));
    }

    #[test]
    fn question_generation_is_best_effort() {
        assert_eq!(Stage::QuestionGeneration.policy(), StagePolicy::BestEffort);
        assert_eq!(Stage::SchemaEnrichment.policy(), StagePolicy::Required);
    }

    #[test]
    fn solution_assembly_error_is_not_swallowed() {
        let r: std::result::Result<Vec<u8>, RecommendError> = Err(RecommendError::SolutionParse {
            reason: "no JSON object found".into(),
            excerpt: "sorry".into(),
            candidates: vec!["deployments.apps".into()],
        });
        let err = Stage::SolutionAssembly.resolve(r, Vec::new).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse AI solution response"));
    }
}
